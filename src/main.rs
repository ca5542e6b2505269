use rs_observe::app_state::AppState;
use rs_observe::config::{ConfigLoader, init_logging};
use rs_observe::server::{build_router, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; the guard keeps the file appender alive
    let _log_guard = init_logging();

    // Load configuration (optional config.toml, env overrides)
    let config = ConfigLoader::new().load(None)?;
    let http_port = config.http_port;

    // Create application state with configuration
    let app_state = AppState::new(config);

    // Build router and run server until Ctrl+C / SIGTERM
    let app = build_router(app_state);
    run_server(app, http_port).await?;

    Ok(())
}
