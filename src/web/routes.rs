use axum::{
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::ws::ws_handler;
use crate::state::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        // WebSocket endpoint for real-time events
        .route("/ws", any(ws_handler))
        // Monitor control
        .route("/monitor", get(handlers::monitor_status))
        .route("/monitor/start", post(handlers::monitor_start))
        .route("/monitor/stop", post(handlers::monitor_stop))
        // Session log (dashboards)
        .route("/sessions", get(handlers::sessions_list))
        .route("/sessions/summary", get(handlers::sessions_summary))
        // Productivity
        .route("/tasks", get(handlers::tasks_list).post(handlers::task_add))
        .route("/tasks/:id/toggle", post(handlers::task_toggle))
        .route("/pomodoro", get(handlers::focus_snapshot))
        // Configuration
        .route("/config", get(handlers::config_get).put(handlers::config_set));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
