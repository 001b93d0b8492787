//! Task list handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::focus::TaskItem;
use crate::state::AppState;

/// Add-task request body
#[derive(Debug, Deserialize)]
pub struct AddTaskRequest {
    pub text: String,
}

/// GET /api/tasks - all tasks
pub async fn tasks_list(State(state): State<Arc<AppState>>) -> Json<Vec<TaskItem>> {
    Json(state.tasks.list())
}

/// POST /api/tasks - add a task
pub async fn task_add(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddTaskRequest>,
) -> Result<Json<TaskItem>> {
    let task = state.tasks.add(&req.text)?;
    Ok(Json(task))
}

/// POST /api/tasks/:id/toggle - toggle completion
pub async fn task_toggle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<TaskItem>> {
    let task = state.tasks.toggle(id)?;
    Ok(Json(task))
}
