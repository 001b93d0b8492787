//! Monitor event types
//!
//! Defines all event types that can be broadcast through the event bus.

use serde::{Deserialize, Serialize};

use crate::focus::PomodoroPhase;
use crate::gaze::{AlertKind, AlertLevel, GazeDirection};
use crate::monitor::stats::{SessionKind, SessionRecord};
use crate::signaling::ChannelState;
use crate::webrtc::PeerState;

/// Monitor event enumeration
///
/// All events are tagged with their event name for serialization.
/// The `serde(tag = "event", content = "data")` attribute creates a
/// JSON structure like:
/// ```json
/// {
///   "event": "gaze.updated",
///   "data": { "direction": "closed", "detected": true }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum MonitorEvent {
    // ============================================================================
    // Monitoring Lifecycle Events
    // ============================================================================
    /// A monitoring session started
    #[serde(rename = "monitor.started")]
    MonitorStarted {
        /// Session kind: driving or productivity
        kind: SessionKind,
    },

    /// The active monitoring session stopped
    #[serde(rename = "monitor.stopped")]
    MonitorStopped {
        kind: SessionKind,
        /// Total elapsed time of the session
        elapsed_secs: u64,
    },

    /// One-second heartbeat while monitoring is active
    #[serde(rename = "monitor.tick")]
    MonitorTick {
        elapsed_secs: u64,
        /// Current alertness score (0-100)
        score: u32,
    },

    // ============================================================================
    // Gaze / Alert Events
    // ============================================================================
    /// Latest gaze telemetry after debouncing
    #[serde(rename = "gaze.updated")]
    GazeUpdated {
        direction: GazeDirection,
        detected: bool,
    },

    /// A dwell window completed and an alert was confirmed
    #[serde(rename = "alert.raised")]
    AlertRaised {
        kind: AlertKind,
        /// Total confirmations of this kind in the current session
        count: u32,
        /// Alertness score after this alert
        score: u32,
    },

    /// The alert level changed (normal <-> warning)
    #[serde(rename = "alert.level_changed")]
    AlertLevelChanged { level: AlertLevel },

    // ============================================================================
    // Transport Events
    // ============================================================================
    /// Signaling channel state changed
    #[serde(rename = "signaling.state_changed")]
    SignalingStateChanged { state: ChannelState },

    /// WebRTC peer session state changed
    #[serde(rename = "peer.state_changed")]
    PeerStateChanged { state: PeerState },

    // ============================================================================
    // Session Log / Productivity Events
    // ============================================================================
    /// A completed session was appended to the session log
    #[serde(rename = "session.recorded")]
    SessionRecorded { record: SessionRecord },

    /// Pomodoro timer flipped between work and break
    #[serde(rename = "pomodoro.phase_changed")]
    PomodoroPhaseChanged {
        phase: PomodoroPhase,
        remaining_secs: u64,
    },

    /// Focus score changed
    #[serde(rename = "focus.updated")]
    FocusUpdated { score: u32 },

    // ============================================================================
    // System Events
    // ============================================================================
    /// Generic error notification
    #[serde(rename = "system.error")]
    Error { module: String, message: String },
}

impl MonitorEvent {
    /// Event name used for topic-based subscription filtering
    pub fn topic(&self) -> &'static str {
        match self {
            MonitorEvent::MonitorStarted { .. } => "monitor.started",
            MonitorEvent::MonitorStopped { .. } => "monitor.stopped",
            MonitorEvent::MonitorTick { .. } => "monitor.tick",
            MonitorEvent::GazeUpdated { .. } => "gaze.updated",
            MonitorEvent::AlertRaised { .. } => "alert.raised",
            MonitorEvent::AlertLevelChanged { .. } => "alert.level_changed",
            MonitorEvent::SignalingStateChanged { .. } => "signaling.state_changed",
            MonitorEvent::PeerStateChanged { .. } => "peer.state_changed",
            MonitorEvent::SessionRecorded { .. } => "session.recorded",
            MonitorEvent::PomodoroPhaseChanged { .. } => "pomodoro.phase_changed",
            MonitorEvent::FocusUpdated { .. } => "focus.updated",
            MonitorEvent::Error { .. } => "system.error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_shape() {
        let event = MonitorEvent::GazeUpdated {
            direction: GazeDirection::Closed,
            detected: true,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "gaze.updated");
        assert_eq!(json["data"]["direction"], "closed");
        assert_eq!(json["data"]["detected"], true);
    }

    #[test]
    fn test_topic_matches_serialized_name() {
        let event = MonitorEvent::FocusUpdated { score: 80 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.topic());
    }
}
