//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use dispatch::Dispatcher;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Event publications whose handlers are still running.
    pub in_flight_events: usize,
}

/// GET /health — returns system health status.
pub async fn check(State(dispatcher): State<Dispatcher>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        in_flight_events: dispatcher.in_flight_publications(),
    })
}
