//! Monitoring service
//!
//! [`MonitorService`] enforces the one-active-session invariant and owns
//! the lifecycle: `start` assembles a fresh [`session::MonitorSession`],
//! `stop` tears it down and appends the completed run to the session log.

pub mod session;
pub mod stats;

pub use stats::{
    DemoSessionSource, KindFilter, MonitorStatus, SessionKind, SessionLog, SessionQuery,
    SessionRecord, SessionSort, SessionSource, SessionSummary,
};

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ConfigStore;
use crate::error::{AppError, Result};
use crate::events::{EventBus, MonitorEvent};
use crate::focus::FocusState;
use crate::gaze::{AlertLevel, AlertNotifier};
use session::{MonitorSession, SessionOutcome};

/// Handle to the running session
struct ActiveSession {
    kind: SessionKind,
    shutdown_tx: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<SessionOutcome>,
}

/// Monitoring lifecycle service
pub struct MonitorService {
    config: ConfigStore,
    events: Arc<EventBus>,
    notifier: Arc<dyn AlertNotifier>,
    sessions: Arc<SessionLog>,
    focus: Arc<FocusState>,
    status: Arc<RwLock<MonitorStatus>>,
    active: Mutex<Option<ActiveSession>>,
}

impl MonitorService {
    /// Create the service
    pub fn new(
        config: ConfigStore,
        events: Arc<EventBus>,
        notifier: Arc<dyn AlertNotifier>,
        sessions: Arc<SessionLog>,
        focus: Arc<FocusState>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            events,
            notifier,
            sessions,
            focus,
            status: Arc::new(RwLock::new(MonitorStatus::default())),
            active: Mutex::new(None),
        })
    }

    /// Start monitoring
    ///
    /// A no-op returning the current status if a session is already
    /// running. Camera failures are raised to the user through the
    /// notifier; they and connection failures leave nothing running.
    pub async fn start(&self, kind: SessionKind) -> Result<MonitorStatus> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            info!("Monitoring already active, ignoring start");
            return Ok(self.status());
        }

        let config = self.config.get();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let session = match MonitorSession::assemble(
            kind,
            &config,
            self.events.clone(),
            self.notifier.clone(),
            self.focus.clone(),
            self.status.clone(),
            shutdown_rx,
        )
        .await
        {
            Ok(session) => session,
            Err(e) => {
                if matches!(
                    e,
                    AppError::CameraAccess { .. } | AppError::Capture(_) | AppError::CameraLost { .. }
                ) {
                    self.notifier.notify(
                        &format!("Monitoring could not start: {}", e),
                        AlertLevel::Warning,
                    );
                }
                return Err(e);
            }
        };

        let handle = tokio::spawn(session.run());
        *active = Some(ActiveSession {
            kind,
            shutdown_tx,
            handle,
        });

        self.events.publish(MonitorEvent::MonitorStarted { kind });
        info!("Monitoring started ({})", kind);

        Ok(self.status())
    }

    /// Stop monitoring
    ///
    /// Idempotent: returns `None` if nothing was running. Otherwise the
    /// session is torn down and the completed run is recorded.
    pub async fn stop(&self) -> Result<Option<SessionRecord>> {
        let Some(active) = self.active.lock().await.take() else {
            return Ok(None);
        };

        let _ = active.shutdown_tx.send(true);
        let outcome = match active.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Session task failed: {}", e);
                return Err(AppError::Monitor(format!("Session task failed: {}", e)));
            }
        };

        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            kind: outcome.kind,
            date: Utc::now(),
            duration_secs: outcome.elapsed_secs,
            average_score: outcome.average_score,
            alerts: outcome.alerts,
        };

        self.sessions.record(record.clone());
        self.events.publish(MonitorEvent::SessionRecorded {
            record: record.clone(),
        });
        self.events.publish(MonitorEvent::MonitorStopped {
            kind: outcome.kind,
            elapsed_secs: outcome.elapsed_secs,
        });

        self.focus.reset();
        info!("Monitoring stopped ({})", active.kind);

        Ok(Some(record))
    }

    /// Live status snapshot
    pub fn status(&self) -> MonitorStatus {
        self.status.read().clone()
    }

    /// Whether a session is currently running
    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::focus::RandomWalkSource;
    use std::sync::Mutex as StdMutex;

    struct StubNotifier {
        messages: StdMutex<Vec<String>>,
    }

    impl AlertNotifier for StubNotifier {
        fn play_alert(&self) {}
        fn notify(&self, message: &str, _level: AlertLevel) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    async fn service(notifier: Arc<StubNotifier>) -> (Arc<MonitorService>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigStore::new(&dir.path().join("vigil.db")).await.unwrap();

        let mut app_config = AppConfig::default();
        app_config.camera.device = Some("/dev/video-vigil-test-missing".to_string());
        let pomodoro = app_config.pomodoro.clone();
        config.set(app_config).await.unwrap();
        let focus = Arc::new(FocusState::new(
            &pomodoro,
            Box::new(RandomWalkSource::new(1)),
        ));

        let service = MonitorService::new(
            config,
            Arc::new(EventBus::new()),
            notifier,
            Arc::new(SessionLog::new()),
            focus,
        );
        (service, dir)
    }

    #[tokio::test]
    async fn test_stop_without_session_is_noop() {
        let notifier = Arc::new(StubNotifier {
            messages: StdMutex::new(Vec::new()),
        });
        let (service, _dir) = service(notifier).await;

        assert!(service.stop().await.unwrap().is_none());
        assert!(!service.status().active);
    }

    #[tokio::test]
    async fn test_start_with_unavailable_camera_notifies_user() {
        let notifier = Arc::new(StubNotifier {
            messages: StdMutex::new(Vec::new()),
        });
        let (service, _dir) = service(notifier.clone()).await;

        // Default camera device does not exist in the test environment
        let result = service.start(SessionKind::Driving).await;
        assert!(result.is_err());
        assert!(!service.is_active().await);

        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("could not start"));
    }
}
