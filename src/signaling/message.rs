//! Signaling wire types and messages

use serde::{Deserialize, Serialize};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

use crate::error::{AppError, Result};
use crate::gaze::GazeSample;

/// Signaling message exchanged with the backend
///
/// One JSON object per WebSocket frame, discriminated by `type`:
/// `{"type": "offer", "offer": {"sdp": ..., "type": "offer"}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalMessage {
    /// SDP offer (client to server)
    Offer { offer: SessionDescription },
    /// SDP answer (server to client)
    Answer { answer: SessionDescription },
    /// ICE candidate, either direction
    Candidate { candidate: IceCandidate },
}

/// SDP session description payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// SDP content
    pub sdp: String,
    /// Description kind: "offer" or "answer"
    #[serde(rename = "type")]
    pub kind: String,
}

impl SessionDescription {
    /// Convert into the WebRTC engine's description type
    pub fn to_rtc(&self) -> Result<RTCSessionDescription> {
        match self.kind.as_str() {
            "offer" => RTCSessionDescription::offer(self.sdp.clone()),
            "answer" => RTCSessionDescription::answer(self.sdp.clone()),
            "pranswer" => RTCSessionDescription::pranswer(self.sdp.clone()),
            other => {
                return Err(AppError::Signaling(format!(
                    "Unsupported SDP type: {}",
                    other
                )))
            }
        }
        .map_err(|e| AppError::Signaling(format!("Invalid SDP: {}", e)))
    }

    /// Build from the WebRTC engine's description type
    pub fn from_rtc(desc: &RTCSessionDescription) -> Self {
        Self {
            sdp: desc.sdp.clone(),
            kind: desc.sdp_type.to_string(),
        }
    }
}

/// ICE candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    /// Candidate string
    pub candidate: String,
    /// SDP mid (media ID)
    #[serde(rename = "sdpMid")]
    pub sdp_mid: Option<String>,
    /// SDP mline index
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    /// Username fragment
    #[serde(rename = "usernameFragment")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    /// Build from a locally gathered candidate
    pub fn from_rtc(candidate: &RTCIceCandidate) -> Result<Self> {
        let init = candidate
            .to_json()
            .map_err(|e| AppError::WebRtc(format!("Failed to serialize candidate: {}", e)))?;

        Ok(Self {
            candidate: init.candidate,
            sdp_mid: init.sdp_mid,
            sdp_mline_index: init.sdp_mline_index,
            username_fragment: init.username_fragment,
        })
    }

    /// Convert into the WebRTC engine's candidate init type
    pub fn to_rtc(&self) -> RTCIceCandidateInit {
        RTCIceCandidateInit {
            candidate: self.candidate.clone(),
            sdp_mid: self.sdp_mid.clone(),
            sdp_mline_index: self.sdp_mline_index,
            username_fragment: self.username_fragment.clone(),
        }
    }
}

/// Any message the backend can deliver over the signaling channel
///
/// Control messages carry a `type` tag; telemetry frames are bare
/// `{direction, detected}` objects, so the two are told apart structurally.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InboundMessage {
    /// Session negotiation message
    Signal(SignalMessage),
    /// Gaze telemetry sample
    Telemetry(GazeSample),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaze::GazeDirection;

    #[test]
    fn test_offer_wire_shape() {
        let msg = SignalMessage::Offer {
            offer: SessionDescription {
                sdp: "v=0\r\n".to_string(),
                kind: "offer".to_string(),
            },
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "offer");
        assert_eq!(json["offer"]["type"], "offer");
        assert_eq!(json["offer"]["sdp"], "v=0\r\n");
    }

    #[test]
    fn test_answer_roundtrip() {
        let raw = r#"{"type":"answer","answer":{"sdp":"v=0\r\n","type":"answer"}}"#;
        let msg: SignalMessage = serde_json::from_str(raw).unwrap();
        match msg {
            SignalMessage::Answer { answer } => {
                assert_eq!(answer.kind, "answer");
                assert_eq!(answer.sdp, "v=0\r\n");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_candidate_field_renames() {
        let msg = SignalMessage::Candidate {
            candidate: IceCandidate {
                candidate: "candidate:0 1 UDP 2122252543 192.0.2.1 54321 typ host".to_string(),
                sdp_mid: Some("0".to_string()),
                sdp_mline_index: Some(0),
                username_fragment: None,
            },
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["candidate"]["sdpMid"], "0");
        assert_eq!(json["candidate"]["sdpMLineIndex"], 0);
    }

    #[test]
    fn test_inbound_demux_signal() {
        let raw = r#"{"type":"answer","answer":{"sdp":"v=0\r\n","type":"answer"}}"#;
        let msg: InboundMessage = serde_json::from_str(raw).unwrap();
        assert!(matches!(msg, InboundMessage::Signal(SignalMessage::Answer { .. })));
    }

    #[test]
    fn test_inbound_demux_telemetry() {
        let raw = r#"{"direction":"down","detected":true}"#;
        let msg: InboundMessage = serde_json::from_str(raw).unwrap();
        match msg {
            InboundMessage::Telemetry(sample) => {
                assert_eq!(sample.direction, GazeDirection::Down);
                assert!(sample.detected);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_inbound_no_face_frame() {
        // What the backend actually sends when no face is found
        let raw = r#"{"direction":"unknown","detected":false}"#;
        let msg: InboundMessage = serde_json::from_str(raw).unwrap();
        match msg {
            InboundMessage::Telemetry(sample) => {
                assert_eq!(sample.direction, GazeDirection::Unknown);
                assert!(!sample.detected);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_sdp_kind_rejected() {
        let desc = SessionDescription {
            sdp: "v=0\r\n".to_string(),
            kind: "rollback".to_string(),
        };
        assert!(desc.to_rtc().is_err());
    }
}
