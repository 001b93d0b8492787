//! Session log handlers (dashboards)

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::monitor::{SessionQuery, SessionRecord, SessionSummary};
use crate::state::AppState;

/// GET /api/sessions?kind=&search=&sort= - filtered session list
pub async fn sessions_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Json<Vec<SessionRecord>> {
    Json(state.sessions.list(&query))
}

/// GET /api/sessions/summary - dashboard header aggregates
pub async fn sessions_summary(State(state): State<Arc<AppState>>) -> Json<SessionSummary> {
    Json(state.sessions.summary())
}
