//! Gaze event debouncing
//!
//! Converts the per-frame telemetry stream into discrete confirmed alerts.
//! A condition (eyes closed, looking down) only counts once it has
//! persisted continuously for its dwell time; any interruption - a forward
//! glance, a lost face, the other condition - restarts the window. A
//! confirmation resets its own window, so a condition sustained across
//! several thresholds fires once per full window, not periodically.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::{alertness_score, AlertKind, AlertLevel, GazeDirection, GazeSample};
use crate::config::GazeConfig;

/// Capability for user-facing alerting
///
/// Injected so the session controller decides how alerts reach the user
/// and tests can substitute a recording stub.
pub trait AlertNotifier: Send + Sync {
    /// Play an audible alert
    fn play_alert(&self);
    /// Raise a user-facing notification
    fn notify(&self, message: &str, level: AlertLevel);
}

/// Notifier that reports through the log
pub struct TracingNotifier;

impl AlertNotifier for TracingNotifier {
    fn play_alert(&self) {
        warn!("ALERT");
    }

    fn notify(&self, message: &str, level: AlertLevel) {
        match level {
            AlertLevel::Warning => warn!("{}", message),
            AlertLevel::Normal => info!("{}", message),
        }
    }
}

/// A confirmed alert produced by the debouncer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GazeAlert {
    pub kind: AlertKind,
    /// Confirmations of this kind so far in the session
    pub count: u32,
}

/// Debouncing state machine over gaze samples
///
/// Pure apart from the injected notifier: time is passed in explicitly,
/// so tests drive the clock.
pub struct GazeDebouncer {
    config: GazeConfig,
    notifier: Arc<dyn AlertNotifier>,
    current_direction: GazeDirection,
    /// Start of the running eyes-closed dwell window
    closed_since: Option<Instant>,
    /// Start of the running looking-down dwell window
    down_since: Option<Instant>,
    eyes_closed_count: u32,
    phone_check_count: u32,
    alert_level: AlertLevel,
}

impl GazeDebouncer {
    /// Create a new debouncer
    pub fn new(config: GazeConfig, notifier: Arc<dyn AlertNotifier>) -> Self {
        Self {
            config,
            notifier,
            current_direction: GazeDirection::Unknown,
            closed_since: None,
            down_since: None,
            eyes_closed_count: 0,
            phone_check_count: 0,
            alert_level: AlertLevel::Normal,
        }
    }

    /// Feed one telemetry sample, observed at `now`
    ///
    /// Returns the alert if this sample completed a dwell window.
    pub fn observe(&mut self, sample: GazeSample, now: Instant) -> Option<GazeAlert> {
        if !sample.detected {
            self.closed_since = None;
            self.down_since = None;
            self.current_direction = GazeDirection::Unknown;
            return None;
        }

        self.current_direction = sample.direction;

        match sample.direction {
            GazeDirection::Forward => {
                self.closed_since = None;
                self.down_since = None;
                self.alert_level = AlertLevel::Normal;
                None
            }

            GazeDirection::Closed => {
                // Switching conditions breaks the other window's continuity
                self.down_since = None;
                let dwell = Duration::from_millis(self.config.eyes_closed_dwell_ms);

                match self.closed_since {
                    None => {
                        self.closed_since = Some(now);
                        None
                    }
                    Some(start) if now.duration_since(start) >= dwell => {
                        self.closed_since = None;
                        self.eyes_closed_count += 1;
                        Some(self.confirm(AlertKind::EyesClosed, self.eyes_closed_count))
                    }
                    Some(_) => None,
                }
            }

            GazeDirection::Down => {
                self.closed_since = None;
                let dwell = Duration::from_millis(self.config.looking_down_dwell_ms);

                match self.down_since {
                    None => {
                        self.down_since = Some(now);
                        None
                    }
                    Some(start) if now.duration_since(start) >= dwell => {
                        self.down_since = None;
                        self.phone_check_count += 1;
                        Some(self.confirm(AlertKind::PhoneCheck, self.phone_check_count))
                    }
                    Some(_) => None,
                }
            }

            GazeDirection::Left | GazeDirection::Right | GazeDirection::Unknown => {
                self.closed_since = None;
                self.down_since = None;
                None
            }
        }
    }

    /// Raise the alert level and fire the notifier for a confirmed event
    fn confirm(&mut self, kind: AlertKind, count: u32) -> GazeAlert {
        self.alert_level = AlertLevel::Warning;

        let message = match kind {
            AlertKind::EyesClosed => format!("Eyes closed detected ({} times)", count),
            AlertKind::PhoneCheck => format!("Phone check detected ({} times)", count),
        };

        self.notifier.play_alert();
        self.notifier.notify(&message, AlertLevel::Warning);

        GazeAlert { kind, count }
    }

    /// Clear all state (called when monitoring stops)
    pub fn reset(&mut self) {
        self.current_direction = GazeDirection::Unknown;
        self.closed_since = None;
        self.down_since = None;
        self.eyes_closed_count = 0;
        self.phone_check_count = 0;
        self.alert_level = AlertLevel::Normal;
    }

    /// Direction of the most recent sample
    pub fn current_direction(&self) -> GazeDirection {
        self.current_direction
    }

    /// Confirmed eyes-closed events this session
    pub fn eyes_closed_count(&self) -> u32 {
        self.eyes_closed_count
    }

    /// Confirmed phone-check events this session
    pub fn phone_check_count(&self) -> u32 {
        self.phone_check_count
    }

    /// Current alert level
    pub fn alert_level(&self) -> AlertLevel {
        self.alert_level
    }

    /// Alertness score derived from the counters
    pub fn score(&self) -> u32 {
        alertness_score(self.eyes_closed_count, self.phone_check_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Notifier stub recording every call
    #[derive(Default)]
    struct StubNotifier {
        alerts_played: AtomicU32,
        messages: Mutex<Vec<String>>,
    }

    impl AlertNotifier for StubNotifier {
        fn play_alert(&self) {
            self.alerts_played.fetch_add(1, Ordering::SeqCst);
        }

        fn notify(&self, message: &str, _level: AlertLevel) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn debouncer() -> (GazeDebouncer, Arc<StubNotifier>) {
        let notifier = Arc::new(StubNotifier::default());
        let debouncer = GazeDebouncer::new(GazeConfig::default(), notifier.clone());
        (debouncer, notifier)
    }

    fn sample(direction: GazeDirection) -> GazeSample {
        GazeSample {
            direction,
            detected: true,
        }
    }

    const NOT_DETECTED: GazeSample = GazeSample {
        direction: GazeDirection::Unknown,
        detected: false,
    };

    #[test]
    fn test_closed_fires_at_exact_threshold() {
        let (mut d, notifier) = debouncer();
        let t0 = Instant::now();

        assert!(d.observe(sample(GazeDirection::Closed), t0).is_none());
        assert!(d
            .observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(2999))
            .is_none());
        assert_eq!(d.eyes_closed_count(), 0);

        let alert = d
            .observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(3000))
            .unwrap();
        assert_eq!(alert.kind, AlertKind::EyesClosed);
        assert_eq!(d.eyes_closed_count(), 1);
        assert_eq!(d.alert_level(), AlertLevel::Warning);
        assert_eq!(notifier.alerts_played.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_down_fires_at_exact_threshold() {
        let (mut d, _) = debouncer();
        let t0 = Instant::now();

        assert!(d.observe(sample(GazeDirection::Down), t0).is_none());
        assert!(d
            .observe(sample(GazeDirection::Down), t0 + Duration::from_millis(1999))
            .is_none());

        let alert = d
            .observe(sample(GazeDirection::Down), t0 + Duration::from_millis(2000))
            .unwrap();
        assert_eq!(alert.kind, AlertKind::PhoneCheck);
        assert_eq!(d.phone_check_count(), 1);
    }

    #[test]
    fn test_detection_loss_clears_window() {
        let (mut d, _) = debouncer();
        let t0 = Instant::now();

        d.observe(sample(GazeDirection::Closed), t0);
        d.observe(NOT_DETECTED, t0 + Duration::from_millis(1500));
        assert_eq!(d.current_direction(), GazeDirection::Unknown);

        // Window restarted: another full dwell is required
        d.observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(1600));
        assert!(d
            .observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(4500))
            .is_none());
        assert_eq!(d.eyes_closed_count(), 0);
    }

    #[test]
    fn test_confirmation_resets_window() {
        let (mut d, notifier) = debouncer();
        let t0 = Instant::now();

        d.observe(sample(GazeDirection::Closed), t0);
        assert!(d
            .observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(3000))
            .is_some());

        // The very next tick opens a fresh window instead of firing again
        assert!(d
            .observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(3100))
            .is_none());
        assert!(d
            .observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(6000))
            .is_none());
        let alert = d
            .observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(6100))
            .unwrap();
        assert_eq!(alert.count, 2);
        assert_eq!(notifier.alerts_played.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_forward_resets_alert_level_and_windows() {
        let (mut d, _) = debouncer();
        let t0 = Instant::now();

        d.observe(sample(GazeDirection::Closed), t0);
        d.observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(3000));
        assert_eq!(d.alert_level(), AlertLevel::Warning);

        d.observe(sample(GazeDirection::Forward), t0 + Duration::from_millis(3100));
        assert_eq!(d.alert_level(), AlertLevel::Normal);
        assert_eq!(d.current_direction(), GazeDirection::Forward);
    }

    #[test]
    fn test_down_interrupted_before_threshold() {
        let (mut d, notifier) = debouncer();
        let t0 = Instant::now();

        d.observe(sample(GazeDirection::Forward), t0);
        d.observe(sample(GazeDirection::Down), t0 + Duration::from_millis(100));
        d.observe(sample(GazeDirection::Down), t0 + Duration::from_millis(2000)); // 1900ms held
        d.observe(sample(GazeDirection::Forward), t0 + Duration::from_millis(2100));

        assert_eq!(d.phone_check_count(), 0);
        assert_eq!(notifier.alerts_played.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_switching_conditions_restarts_both_windows() {
        let (mut d, _) = debouncer();
        let t0 = Instant::now();

        d.observe(sample(GazeDirection::Closed), t0);
        d.observe(sample(GazeDirection::Down), t0 + Duration::from_millis(2500));
        // Closed continuity was broken by the down sample
        assert!(d
            .observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(2600))
            .is_none());
        assert!(d
            .observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(5500))
            .is_none());
        assert_eq!(d.eyes_closed_count(), 0);
        assert_eq!(d.phone_check_count(), 0);
    }

    #[test]
    fn test_left_right_only_track_direction() {
        let (mut d, notifier) = debouncer();
        let t0 = Instant::now();

        for i in 0..100 {
            d.observe(sample(GazeDirection::Left), t0 + Duration::from_millis(i * 100));
        }
        assert_eq!(d.current_direction(), GazeDirection::Left);
        assert_eq!(d.eyes_closed_count(), 0);
        assert_eq!(d.phone_check_count(), 0);
        assert_eq!(notifier.alerts_played.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sustained_closed_three_and_a_half_seconds() {
        let (mut d, notifier) = debouncer();
        let t0 = Instant::now();

        // 100ms telemetry cadence for 3.5s
        for i in 0..=35 {
            d.observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(i * 100));
        }

        assert_eq!(d.eyes_closed_count(), 1);
        assert_eq!(d.alert_level(), AlertLevel::Warning);
        assert_eq!(notifier.alerts_played.load(Ordering::SeqCst), 1);
        assert_eq!(d.score(), 95);
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut d, _) = debouncer();
        let t0 = Instant::now();

        d.observe(sample(GazeDirection::Closed), t0);
        d.observe(sample(GazeDirection::Closed), t0 + Duration::from_millis(3000));
        d.reset();

        assert_eq!(d.eyes_closed_count(), 0);
        assert_eq!(d.alert_level(), AlertLevel::Normal);
        assert_eq!(d.current_direction(), GazeDirection::Unknown);
        assert_eq!(d.score(), 100);
    }
}
