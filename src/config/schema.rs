use serde::{Deserialize, Serialize};

// Re-export WebRtcConfig from the webrtc module
pub use crate::webrtc::WebRtcConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Web server settings
    pub web: WebConfig,
    /// Signaling channel settings
    pub signaling: SignalingConfig,
    /// WebRTC settings
    pub webrtc: WebRtcConfig,
    /// Camera capture settings
    pub camera: CameraConfig,
    /// Gaze debouncing settings
    pub gaze: GazeConfig,
    /// Pomodoro timer settings
    pub pomodoro: PomodoroConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            web: WebConfig::default(),
            signaling: SignalingConfig::default(),
            webrtc: WebRtcConfig::default(),
            camera: CameraConfig::default(),
            gaze: GazeConfig::default(),
            pomodoro: PomodoroConfig::default(),
        }
    }
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address
    pub bind_address: String,
    /// HTTP port
    pub http_port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            http_port: 8800,
        }
    }
}

/// Signaling channel configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalingConfig {
    /// WebSocket URL of the analysis backend (e.g., ws://host:8000/api/ws)
    pub url: String,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000/api/ws".to_string(),
        }
    }
}

/// Camera capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Video device path (e.g., /dev/video0)
    pub device: Option<String>,
    /// Resolution width
    pub width: u32,
    /// Resolution height
    pub height: u32,
    /// Frame rate
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: None,
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

/// Gaze debouncing configuration
///
/// A condition must persist continuously for its dwell time before it is
/// counted as a confirmed event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GazeConfig {
    /// Continuous eyes-closed duration before an alert fires (ms)
    pub eyes_closed_dwell_ms: u64,
    /// Continuous looking-down duration before a phone-check fires (ms)
    pub looking_down_dwell_ms: u64,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            eyes_closed_dwell_ms: 3000,
            looking_down_dwell_ms: 2000,
        }
    }
}

/// Pomodoro timer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PomodoroConfig {
    /// Work phase duration (seconds)
    pub work_secs: u64,
    /// Break phase duration (seconds)
    pub break_secs: u64,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_secs: 25 * 60,
            break_secs: 5 * 60,
        }
    }
}
