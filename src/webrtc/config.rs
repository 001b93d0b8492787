//! WebRTC configuration

use serde::{Deserialize, Serialize};

/// WebRTC configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WebRtcConfig {
    /// STUN server URLs used for ICE gathering (no TURN fallback)
    pub stun_servers: Vec<String>,
    /// ICE candidate gathering timeout (ms)
    pub gathering_timeout_ms: u64,
}

impl Default for WebRtcConfig {
    fn default() -> Self {
        Self {
            stun_servers: vec!["stun:stun.l.google.com:19302".to_string()],
            gathering_timeout_ms: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_single_public_stun() {
        let config = WebRtcConfig::default();
        assert_eq!(config.stun_servers.len(), 1);
        assert!(config.stun_servers[0].starts_with("stun:"));
    }
}
