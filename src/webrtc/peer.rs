//! WebRTC peer session management

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

use serde::{Deserialize, Serialize};

use super::config::WebRtcConfig;
use super::track::VideoTrack;
use crate::error::{AppError, Result};
use crate::signaling::{IceCandidate, SessionDescription, SignalMessage};

/// Peer session state
///
/// `Connected` reflects completed signaling (remote answer applied);
/// transport-level connectivity continues to settle asynchronously and is
/// only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerState {
    Idle,
    Negotiating,
    Connected,
    Closed,
}

impl std::fmt::Display for PeerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerState::Idle => write!(f, "idle"),
            PeerState::Negotiating => write!(f, "negotiating"),
            PeerState::Connected => write!(f, "connected"),
            PeerState::Closed => write!(f, "closed"),
        }
    }
}

/// Destination for a remote video track, if the backend sends one back
///
/// The typical flow is one-directional (camera out, telemetry back), but
/// the session binds any remote track it receives.
pub trait VideoSink: Send + Sync {
    fn on_remote_track(&self, track: Arc<TrackRemote>);
}

/// Sink that drains a remote track and discards the packets
pub struct DiscardSink;

impl VideoSink for DiscardSink {
    fn on_remote_track(&self, track: Arc<TrackRemote>) {
        info!("Remote track arrived: {}, discarding", track.id());
        tokio::spawn(async move {
            while track.read_rtp().await.is_ok() {}
            debug!("Remote track ended");
        });
    }
}

/// Peer session wrapping one WebRTC peer connection
///
/// State machine: `idle -> negotiating -> connected -> closed`. A session
/// is built fresh for every monitoring run and never reused.
pub struct PeerSession {
    pc: Arc<RTCPeerConnection>,
    video_track: VideoTrack,
    state: Arc<watch::Sender<PeerState>>,
    state_rx: watch::Receiver<PeerState>,
}

impl PeerSession {
    /// Create a new peer session
    ///
    /// Locally gathered ICE candidates are forwarded on `candidate_tx` as
    /// they are produced (trickle ICE); any remote track is handed to
    /// `sink`.
    pub async fn new(
        config: &WebRtcConfig,
        video_track: VideoTrack,
        candidate_tx: mpsc::UnboundedSender<IceCandidate>,
        sink: Arc<dyn VideoSink>,
    ) -> Result<Self> {
        // Create media engine
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| AppError::WebRtc(format!("Failed to register codecs: {}", e)))?;

        // Create interceptor registry
        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine)
            .map_err(|e| AppError::WebRtc(format!("Failed to register interceptors: {}", e)))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        // Build ICE servers (STUN only, no TURN)
        let ice_servers = config
            .stun_servers
            .iter()
            .map(|url| RTCIceServer {
                urls: vec![url.clone()],
                ..Default::default()
            })
            .collect();

        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let pc = api
            .new_peer_connection(rtc_config)
            .await
            .map_err(|e| AppError::WebRtc(format!("Failed to create peer connection: {}", e)))?;
        let pc = Arc::new(pc);

        let (state_tx, state_rx) = watch::channel(PeerState::Idle);

        let session = Self {
            pc,
            video_track,
            state: Arc::new(state_tx),
            state_rx,
        };

        session.setup_event_handlers(candidate_tx, sink);

        Ok(session)
    }

    /// Set up peer connection event handlers
    fn setup_event_handlers(
        &self,
        candidate_tx: mpsc::UnboundedSender<IceCandidate>,
        sink: Arc<dyn VideoSink>,
    ) {
        // Transport state is informational; session state follows signaling
        self.pc
            .on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
                match s {
                    RTCPeerConnectionState::Failed => {
                        warn!("Peer transport failed");
                    }
                    _ => {
                        info!("Peer transport state: {}", s);
                    }
                }
                Box::pin(async {})
            }));

        // Forward locally gathered candidates for trickling
        self.pc
            .on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
                let candidate_tx = candidate_tx.clone();

                Box::pin(async move {
                    match candidate {
                        Some(c) => match IceCandidate::from_rtc(&c) {
                            Ok(candidate) => {
                                debug!("Local ICE candidate: {}", candidate.candidate);
                                // Receiver gone means the session is torn down
                                let _ = candidate_tx.send(candidate);
                            }
                            Err(e) => warn!("{}", e),
                        },
                        None => {
                            debug!("ICE candidate gathering completed");
                        }
                    }
                })
            }));

        // Bind any remote track to the sink
        self.pc.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                sink.on_remote_track(track);
                Box::pin(async {})
            },
        ));
    }

    /// Attach the camera track, create the local offer and return it as a
    /// signaling message
    ///
    /// The offer carries a single video section and no audio. Transitions
    /// `idle -> negotiating`; calling it twice on one session is an error.
    pub async fn start_negotiation(&self) -> Result<SignalMessage> {
        if self.state() != PeerState::Idle {
            return Err(AppError::WebRtc(format!(
                "Negotiation already started (state: {})",
                self.state()
            )));
        }

        let track: Arc<dyn TrackLocal + Send + Sync> = self.video_track.sample_track();
        self.pc
            .add_track(track)
            .await
            .map_err(|e| AppError::WebRtc(format!("Failed to add video track: {}", e)))?;

        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| AppError::WebRtc(format!("Failed to create offer: {}", e)))?;

        self.pc
            .set_local_description(offer.clone())
            .await
            .map_err(|e| AppError::WebRtc(format!("Failed to set local description: {}", e)))?;

        let _ = self.state.send(PeerState::Negotiating);
        info!("Local offer created, negotiating");

        Ok(SignalMessage::Offer {
            offer: SessionDescription::from_rtc(&offer),
        })
    }

    /// Apply the remote answer
    ///
    /// Transitions `negotiating -> connected`. A duplicate answer is
    /// ignored with a warning.
    pub async fn apply_answer(&self, answer: SessionDescription) -> Result<()> {
        match self.state() {
            PeerState::Negotiating => {}
            PeerState::Connected => {
                warn!("Duplicate answer ignored");
                return Ok(());
            }
            state => {
                return Err(AppError::WebRtc(format!(
                    "Answer received in state {}",
                    state
                )))
            }
        }

        self.pc
            .set_remote_description(answer.to_rtc()?)
            .await
            .map_err(|e| AppError::WebRtc(format!("Failed to set remote description: {}", e)))?;

        let _ = self.state.send(PeerState::Connected);
        info!("Remote answer applied, session connected");

        Ok(())
    }

    /// Apply a remote ICE candidate (arrival order, no reordering)
    pub async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        debug!("Remote ICE candidate: {}", candidate.candidate);

        self.pc
            .add_ice_candidate(candidate.to_rtc())
            .await
            .map_err(|e| AppError::WebRtc(format!("Failed to add ICE candidate: {}", e)))
    }

    /// Current session state
    pub fn state(&self) -> PeerState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state changes
    pub fn state_watch(&self) -> watch::Receiver<PeerState> {
        self.state_rx.clone()
    }

    /// The local video track
    pub fn video_track(&self) -> &VideoTrack {
        &self.video_track
    }

    /// Close the session (idempotent): stop the local track sender and
    /// release the peer connection
    pub async fn close(&self) {
        if self.state() == PeerState::Closed {
            return;
        }

        self.video_track.stop();

        if let Err(e) = self.pc.close().await {
            warn!("Failed to close peer connection: {}", e);
        }

        let _ = self.state.send(PeerState::Closed);
        info!("Peer session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webrtc::track::VideoTrackConfig;

    fn offline_config() -> WebRtcConfig {
        // No STUN: host candidates only, everything stays in-process
        WebRtcConfig {
            stun_servers: vec![],
            ..Default::default()
        }
    }

    async fn new_session() -> (PeerSession, mpsc::UnboundedReceiver<IceCandidate>) {
        let (candidate_tx, candidate_rx) = mpsc::unbounded_channel();
        let session = PeerSession::new(
            &offline_config(),
            VideoTrack::new(VideoTrackConfig::default()),
            candidate_tx,
            Arc::new(DiscardSink),
        )
        .await
        .unwrap();
        (session, candidate_rx)
    }

    #[tokio::test]
    async fn test_offer_is_video_only() {
        let (session, _rx) = new_session().await;
        assert_eq!(session.state(), PeerState::Idle);

        let msg = session.start_negotiation().await.unwrap();
        assert_eq!(session.state(), PeerState::Negotiating);

        match msg {
            SignalMessage::Offer { offer } => {
                assert_eq!(offer.kind, "offer");
                assert!(offer.sdp.contains("m=video"));
                assert!(!offer.sdp.contains("m=audio"));
            }
            other => panic!("unexpected message: {:?}", other),
        }

        session.close().await;
    }

    #[tokio::test]
    async fn test_double_negotiation_rejected() {
        let (session, _rx) = new_session().await;

        session.start_negotiation().await.unwrap();
        assert!(session.start_negotiation().await.is_err());

        session.close().await;
    }

    #[tokio::test]
    async fn test_answer_before_offer_rejected() {
        let (session, _rx) = new_session().await;

        let answer = SessionDescription {
            sdp: "v=0\r\n".to_string(),
            kind: "answer".to_string(),
        };
        assert!(session.apply_answer(answer).await.is_err());

        session.close().await;
    }

    #[tokio::test]
    async fn test_full_negotiation_against_local_answerer() {
        let (session, _rx) = new_session().await;

        let offer = match session.start_negotiation().await.unwrap() {
            SignalMessage::Offer { offer } => offer,
            other => panic!("unexpected message: {:?}", other),
        };

        // Stand-in for the backend: a bare peer connection answering us
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs().unwrap();
        let api = APIBuilder::new().with_media_engine(media_engine).build();
        let answerer = api
            .new_peer_connection(RTCConfiguration::default())
            .await
            .unwrap();
        answerer
            .set_remote_description(offer.to_rtc().unwrap())
            .await
            .unwrap();
        let answer = answerer.create_answer(None).await.unwrap();
        answerer.set_local_description(answer.clone()).await.unwrap();

        session
            .apply_answer(SessionDescription::from_rtc(&answer))
            .await
            .unwrap();
        assert_eq!(session.state(), PeerState::Connected);

        session.close().await;
        assert_eq!(session.state(), PeerState::Closed);
        let _ = answerer.close().await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (session, _rx) = new_session().await;
        session.close().await;
        session.close().await;
        assert_eq!(session.state(), PeerState::Closed);
    }
}
