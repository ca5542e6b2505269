use axum::response::IntoResponse;
/// REST handlers for event ingestion and queries
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::api::dto::IngestResponse;
use crate::app_state::AppState;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct RecentEventsQuery {
    limit: Option<usize>,
}

const DEFAULT_RECENT_LIMIT: usize = 100;

/// Return the most recent stored events, most-recent-last
pub async fn recent_events(
    State(state): State<AppState>,
    Query(query): Query<RecentEventsQuery>,
) -> Json<Vec<Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Json(state.events.recent(limit).await)
}

/// Ingest a batch of events and broadcast them to all stream viewers.
///
/// The body is either a single event object or an array of events; payloads
/// are opaque and stored as-is.
pub async fn ingest_events(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<IngestResponse>) {
    let events = match body {
        Value::Array(events) => events,
        event => vec![event],
    };
    debug!("Ingesting {} event(s)", events.len());

    state.ingest(&events).await;

    (
        StatusCode::ACCEPTED,
        Json(IngestResponse {
            success: true,
            count: events.len(),
        }),
    )
}
