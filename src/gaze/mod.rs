//! Gaze telemetry types and debouncing
//!
//! The analysis backend emits one gaze sample per processed video frame.
//! Raw per-frame output is noisy; [`debouncer::GazeDebouncer`] requires a
//! direction to persist continuously for a configured dwell time before
//! counting it as a confirmed event.

pub mod debouncer;

pub use debouncer::{AlertNotifier, GazeAlert, GazeDebouncer, TracingNotifier};

use serde::{Deserialize, Serialize};

/// Gaze direction as reported by the analysis backend
///
/// The backend reports `unknown` (with `detected: false`) when no face is
/// found in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GazeDirection {
    Forward,
    Closed,
    Down,
    Left,
    Right,
    Unknown,
}

impl std::fmt::Display for GazeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GazeDirection::Forward => write!(f, "Looking Forward"),
            GazeDirection::Closed => write!(f, "Eyes Closed"),
            GazeDirection::Down => write!(f, "Looking Down"),
            GazeDirection::Left => write!(f, "Looking Left"),
            GazeDirection::Right => write!(f, "Looking Right"),
            GazeDirection::Unknown => write!(f, "Not Detected"),
        }
    }
}

/// One gaze telemetry sample `(direction, detected)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazeSample {
    pub direction: GazeDirection,
    pub detected: bool,
}

/// Kind of confirmed alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Eyes closed beyond the dwell threshold
    EyesClosed,
    /// Looking down beyond the dwell threshold (phone check)
    PhoneCheck,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::EyesClosed => write!(f, "eyes closed"),
            AlertKind::PhoneCheck => write!(f, "phone check"),
        }
    }
}

/// User-facing alert level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Normal,
    Warning,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertLevel::Normal => write!(f, "Normal"),
            AlertLevel::Warning => write!(f, "Warning"),
        }
    }
}

/// Alertness score derived from confirmed alert counters
///
/// `max(0, 100 - 5 * eyes_closed - 10 * phone_checks)`
pub fn alertness_score(eyes_closed: u32, phone_checks: u32) -> u32 {
    100u32
        .saturating_sub(eyes_closed.saturating_mul(5))
        .saturating_sub(phone_checks.saturating_mul(10))
}
