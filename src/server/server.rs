/// Router and server loop for the dashboard backend
use std::net::SocketAddr;

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::{app_state::AppState, handlers};

/// Build the application router with routes
pub fn build_router(state: AppState) -> Router {
    // Permissive CORS: the dashboard frontend is served from anywhere
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Observability Dashboard Server" }))
        .route("/health", get(handlers::rest::health_check))
        // Event ingestion and queries
        .route("/events", post(handlers::rest::ingest_events))
        .route("/events/recent", get(handlers::rest::recent_events))
        // WebSocket endpoints: fan-out stream and terminal bridge
        .route("/stream", get(handlers::websocket::stream_handler))
        .route("/terminal", get(handlers::websocket::terminal_handler))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until Ctrl+C or SIGTERM
pub async fn run_server(router: Router, port: u16) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server running on http://{}", addr);
    info!("Event stream available at ws://{}/stream", addr);
    info!("Terminal available at ws://{}/terminal", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C signal, initiating graceful shutdown...");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received SIGTERM signal, initiating graceful shutdown...");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
