/// Logging initialization for the dashboard backend
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` controls the filter (default `info`). When `LOG_DIR` is set,
/// output goes to a daily-rolling file in that directory instead of stderr;
/// the returned guard must stay alive for the lifetime of the process.
/// `LOG_FORMAT=json` switches to JSON-formatted events.
pub fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json");

    if let Ok(dir) = std::env::var("LOG_DIR") {
        let appender = tracing_appender::rolling::daily(dir, "rs_observe.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false);
        if json {
            builder.json().init();
        } else {
            builder.init();
        }
        Some(guard)
    } else {
        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        if json {
            builder.json().init();
        } else {
            builder.init();
        }
        None
    }
}
