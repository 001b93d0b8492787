//! HTTP API handlers

mod config;
mod focus;
mod monitor;
mod sessions;
mod tasks;

pub use config::{config_get, config_set};
pub use focus::focus_snapshot;
pub use monitor::{monitor_start, monitor_status, monitor_stop};
pub use sessions::{sessions_list, sessions_summary};
pub use tasks::{task_add, task_toggle, tasks_list};

use axum::Json;
use serde_json::json;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
