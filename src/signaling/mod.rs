//! Signaling channel to the analysis backend
//!
//! One WebSocket connection carries both session negotiation (SDP offers
//! and answers, trickled ICE candidates) and the gaze telemetry stream
//! coming back from the backend.

pub mod channel;
pub mod message;

pub use channel::{ChannelState, SignalingChannel};
pub use message::{IceCandidate, InboundMessage, SessionDescription, SignalMessage};
