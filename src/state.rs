use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::ConfigStore;
use crate::events::EventBus;
use crate::focus::{FocusState, TaskList};
use crate::monitor::{MonitorService, SessionLog};

/// Application-wide state shared across handlers
///
/// All monitor control goes through `monitor`; the stores back the
/// dashboard and productivity endpoints, and `events` feeds the
/// WebSocket event stream.
pub struct AppState {
    /// Configuration store
    pub config: ConfigStore,
    /// Monitoring lifecycle service
    pub monitor: Arc<MonitorService>,
    /// Completed-session log (dashboards)
    pub sessions: Arc<SessionLog>,
    /// Task list
    pub tasks: Arc<TaskList>,
    /// Productivity timers
    pub focus: Arc<FocusState>,
    /// Event bus for real-time notifications
    pub events: Arc<EventBus>,
    /// Shutdown signal sender
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    /// Create new application state
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ConfigStore,
        monitor: Arc<MonitorService>,
        sessions: Arc<SessionLog>,
        tasks: Arc<TaskList>,
        focus: Arc<FocusState>,
        events: Arc<EventBus>,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            monitor,
            sessions,
            tasks,
            focus,
            events,
            shutdown_tx,
        })
    }

    /// Subscribe to shutdown signal
    pub fn shutdown_signal(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }
}
