//! Liveness endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    /// Records in the current client snapshot.
    pub clients: usize,
    /// Entries in the current link snapshot.
    pub links: usize,
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "operational",
        version: env!("CARGO_PKG_VERSION"),
        clients: state.clients.len(),
        links: state.links.len(),
    })
}
