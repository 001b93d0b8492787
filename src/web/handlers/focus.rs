//! Productivity handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::focus::FocusSnapshot;
use crate::state::AppState;

/// GET /api/pomodoro - timer and focus score snapshot
pub async fn focus_snapshot(State(state): State<Arc<AppState>>) -> Json<FocusSnapshot> {
    Json(state.focus.snapshot())
}
