//! Configuration handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::state::AppState;

/// Update response
#[derive(Debug, Serialize)]
pub struct ConfigUpdated {
    pub success: bool,
}

/// GET /api/config - current configuration
pub async fn config_get(State(state): State<Arc<AppState>>) -> Json<AppConfig> {
    Json((*state.config.get()).clone())
}

/// PUT /api/config - replace and persist the configuration
///
/// Takes effect on the next monitoring start; the active session keeps
/// the configuration it was built with.
pub async fn config_set(
    State(state): State<Arc<AppState>>,
    Json(config): Json<AppConfig>,
) -> Result<Json<ConfigUpdated>> {
    state.config.set(config).await?;
    Ok(Json(ConfigUpdated { success: true }))
}
