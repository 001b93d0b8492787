//! WebRTC peer session
//!
//! One peer connection per monitoring session, created fresh on every
//! start. The local camera track is attached before the offer is created;
//! negotiation messages travel over the signaling channel:
//!
//! ```text
//! CameraCapture (H.264)
//!        |
//!        v
//! VideoTrack (sample writer)
//!        |
//!        v
//! PeerSession ---- offer/answer/ICE ----> SignalingChannel ----> backend
//!        ^
//!        +---- remote track (if any) ----> VideoSink
//! ```

pub mod config;
pub mod peer;
pub mod track;

pub use config::WebRtcConfig;
pub use peer::{DiscardSink, PeerSession, PeerState, VideoSink};
pub use track::{VideoTrack, VideoTrackConfig};
