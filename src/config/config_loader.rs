/// Configuration loader for rs_observe
use std::path::Path;

use tracing::{debug, info};

use crate::config::{ConfigError, ServerConfig};

/// Loads configuration from an optional `config.toml` plus the environment.
///
/// Environment variables always win over the file: `PORT` for the listen
/// port and `TERMINAL_PASSWORD` for the terminal-access secret. An absent
/// or empty `TERMINAL_PASSWORD` disables terminal authentication.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self
    }

    /// Load configuration, merging the file (if present) with the environment
    pub fn load(&self, config_path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
        // Pick up a .env file if one exists; ignore when absent
        dotenvy::dotenv().ok();

        let mut config = match config_path {
            Some(path) => self.load_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => self.load_file(&path)?,
                _ => {
                    debug!("No configuration file found, using defaults");
                    ServerConfig::default()
                }
            },
        };

        self.apply_env(&mut config)?;
        Ok(config)
    }

    fn load_file(&self, path: &Path) -> Result<ServerConfig, ConfigError> {
        info!("Loading configuration from file: {:?}", path);
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str::<ServerConfig>(&contents)?;
        Ok(config)
    }

    fn apply_env(&self, config: &mut ServerConfig) -> Result<(), ConfigError> {
        if let Ok(port) = std::env::var("PORT") {
            config.http_port = port.parse().map_err(|_| ConfigError::InvalidEnvValue {
                var: "PORT",
                value: port.clone(),
            })?;
        }

        // An empty password is the same as no password at all
        config.terminal_password = std::env::var("TERMINAL_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Default configuration path: `config.toml` in the current directory
pub fn default_config_path() -> Option<std::path::PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config_file() {
        let toml = r#"
            http_port = 5123

            [shell]
            command = ["/bin/zsh", "-l"]
            working_directory = "/tmp"

            [shell.size]
            columns = 80
            rows = 24

            [events]
            capacity = 200
            replay_limit = 10
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.http_port, 5123);
        assert_eq!(
            config.shell.command.as_deref(),
            Some(&["/bin/zsh".to_string(), "-l".to_string()][..])
        );
        assert_eq!(config.shell.size.columns, 80);
        assert_eq!(config.events.capacity, 200);
        assert_eq!(config.events.replay_limit, 10);
    }

    #[test]
    fn defaults_apply_when_sections_missing() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.http_port, 4000);
        assert_eq!(config.shell.size.columns, 120);
        assert_eq!(config.shell.size.rows, 30);
        assert_eq!(config.events.replay_limit, 50);
        assert!(!config.password_required());
    }
}
