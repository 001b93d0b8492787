//! Monitor control handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::monitor::{MonitorStatus, SessionKind, SessionRecord};
use crate::state::AppState;

/// Start request body
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub kind: SessionKind,
}

/// Stop response body
#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub success: bool,
    /// Record of the completed run, absent when nothing was running
    pub record: Option<SessionRecord>,
}

/// GET /api/monitor - live status snapshot
pub async fn monitor_status(State(state): State<Arc<AppState>>) -> Json<MonitorStatus> {
    Json(state.monitor.status())
}

/// POST /api/monitor/start - begin a monitoring session
pub async fn monitor_start(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> Result<Json<MonitorStatus>> {
    let status = state.monitor.start(req.kind).await?;
    Ok(Json(status))
}

/// POST /api/monitor/stop - end the active session
pub async fn monitor_stop(State(state): State<Arc<AppState>>) -> Result<Json<StopResponse>> {
    let record = state.monitor.stop().await?;
    Ok(Json(StopResponse {
        success: true,
        record,
    }))
}
