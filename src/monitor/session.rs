//! Per-run monitoring session
//!
//! One `MonitorSession` owns everything a run needs - signaling channel,
//! peer session, camera capture, debouncer, dwell timers, ticker - and is
//! built fresh on every start. All mutation happens on the session's own
//! event loop; when the loop exits, teardown releases the camera and both
//! connections, and anything still in flight lands in closed channels.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::stats::{MonitorStatus, SessionKind};
use crate::config::AppConfig;
use crate::error::Result;
use crate::events::{EventBus, MonitorEvent};
use crate::focus::FocusState;
use crate::gaze::{AlertNotifier, GazeDebouncer, GazeSample};
use crate::media::{CameraCapture, CaptureConfig};
use crate::signaling::{
    ChannelState, IceCandidate, InboundMessage, SignalMessage, SignalingChannel,
};
use crate::webrtc::{DiscardSink, PeerSession, PeerState, VideoTrack, VideoTrackConfig};

/// What a finished session reports back for the log
#[derive(Debug, Clone)]
pub(crate) struct SessionOutcome {
    pub kind: SessionKind,
    pub elapsed_secs: u64,
    pub average_score: u32,
    pub alerts: u32,
}

/// State owned by one monitoring run
pub(crate) struct MonitorSession {
    kind: SessionKind,
    channel: SignalingChannel,
    inbound: mpsc::Receiver<InboundMessage>,
    peer: PeerSession,
    candidate_rx: mpsc::UnboundedReceiver<IceCandidate>,
    capture: CameraCapture,
    debouncer: GazeDebouncer,
    events: Arc<EventBus>,
    focus: Arc<FocusState>,
    status: Arc<RwLock<MonitorStatus>>,
    shutdown_rx: watch::Receiver<bool>,
    elapsed_secs: u64,
    score_sum: u64,
    score_samples: u64,
}

impl MonitorSession {
    /// Acquire the camera, connect the channel, negotiate the peer and
    /// send the offer
    ///
    /// Order matters: the camera comes first so an access denial fails the
    /// start before anything touches the network. Partial failures roll
    /// back whatever was already acquired.
    pub(crate) async fn assemble(
        kind: SessionKind,
        config: &AppConfig,
        events: Arc<EventBus>,
        notifier: Arc<dyn AlertNotifier>,
        focus: Arc<FocusState>,
        status: Arc<RwLock<MonitorStatus>>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self> {
        let capture = CameraCapture::new(CaptureConfig::from(&config.camera));
        capture.start().await?;

        let (channel, inbound) = match SignalingChannel::connect(&config.signaling.url).await {
            Ok(pair) => pair,
            Err(e) => {
                capture.stop().await;
                return Err(e);
            }
        };
        events.publish(MonitorEvent::SignalingStateChanged {
            state: ChannelState::Open,
        });

        let (candidate_tx, candidate_rx) = mpsc::unbounded_channel();
        let track = VideoTrack::new(VideoTrackConfig {
            fps: config.camera.fps,
            ..Default::default()
        });

        let peer = match PeerSession::new(
            &config.webrtc,
            track,
            candidate_tx,
            Arc::new(DiscardSink),
        )
        .await
        {
            Ok(peer) => peer,
            Err(e) => {
                channel.close().await;
                capture.stop().await;
                return Err(e);
            }
        };

        let offer = match peer.start_negotiation().await {
            Ok(offer) => offer,
            Err(e) => {
                peer.close().await;
                channel.close().await;
                capture.stop().await;
                return Err(e);
            }
        };
        channel.send(&offer).await?;
        events.publish(MonitorEvent::PeerStateChanged {
            state: PeerState::Negotiating,
        });

        let debouncer = GazeDebouncer::new(config.gaze.clone(), notifier);

        *status.write() = MonitorStatus {
            active: true,
            kind: Some(kind),
            ..Default::default()
        };

        info!("Monitoring session assembled ({})", kind);

        Ok(Self {
            kind,
            channel,
            inbound,
            peer,
            candidate_rx,
            capture,
            debouncer,
            events,
            focus,
            status,
            shutdown_rx,
            elapsed_secs: 0,
            score_sum: 0,
            score_samples: 0,
        })
    }

    /// Session event loop
    ///
    /// Selects over inbound signaling, locally gathered candidates, the
    /// 1-second ticker and the shutdown signal until stopped.
    pub(crate) async fn run(mut self) -> SessionOutcome {
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + Duration::from_secs(1),
            Duration::from_secs(1),
        );
        let mut inbound_open = true;
        let mut candidates_open = true;

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    debug!("Session shutdown requested");
                    break;
                }

                maybe = self.inbound.recv(), if inbound_open => match maybe {
                    Some(msg) => self.handle_inbound(msg).await,
                    None => {
                        // No reconnect: the session keeps ticking without
                        // telemetry until the operator stops it
                        inbound_open = false;
                        warn!("Signaling channel closed, telemetry stopped");
                        self.events.publish(MonitorEvent::SignalingStateChanged {
                            state: ChannelState::Closed,
                        });
                    }
                },

                maybe = self.candidate_rx.recv(), if candidates_open => match maybe {
                    Some(candidate) => {
                        let _ = self
                            .channel
                            .send(&SignalMessage::Candidate { candidate })
                            .await;
                    }
                    None => candidates_open = false,
                },

                _ = ticker.tick() => self.on_tick(),
            }
        }

        self.teardown().await
    }

    /// Route one inbound signaling message
    async fn handle_inbound(&mut self, msg: InboundMessage) {
        match msg {
            InboundMessage::Signal(SignalMessage::Answer { answer }) => {
                match self.peer.apply_answer(answer).await {
                    Ok(()) => {
                        // Negotiation done: start streaming the camera
                        self.peer
                            .video_track()
                            .start_sending(self.capture.subscribe());
                        self.events.publish(MonitorEvent::PeerStateChanged {
                            state: PeerState::Connected,
                        });
                    }
                    Err(e) => warn!("{}", e),
                }
            }

            InboundMessage::Signal(SignalMessage::Candidate { candidate }) => {
                if let Err(e) = self.peer.add_remote_candidate(candidate).await {
                    warn!("{}", e);
                }
            }

            InboundMessage::Signal(SignalMessage::Offer { .. }) => {
                warn!("Unexpected offer from backend, ignoring");
            }

            InboundMessage::Telemetry(sample) => self.on_telemetry(sample),
        }
    }

    /// Feed one telemetry sample through the debouncer
    fn on_telemetry(&mut self, sample: GazeSample) {
        let level_before = self.debouncer.alert_level();
        let alert = self.debouncer.observe(sample, Instant::now());

        self.events.publish(MonitorEvent::GazeUpdated {
            direction: sample.direction,
            detected: sample.detected,
        });

        if let Some(alert) = alert {
            self.events.publish(MonitorEvent::AlertRaised {
                kind: alert.kind,
                count: alert.count,
                score: self.debouncer.score(),
            });
        }

        let level = self.debouncer.alert_level();
        if level != level_before {
            self.events.publish(MonitorEvent::AlertLevelChanged { level });
        }

        self.update_status();
    }

    /// One-second tick: elapsed time, score sampling, productivity timers
    fn on_tick(&mut self) {
        self.elapsed_secs += 1;

        let score = self.debouncer.score();
        self.score_sum += score as u64;
        self.score_samples += 1;

        self.events.publish(MonitorEvent::MonitorTick {
            elapsed_secs: self.elapsed_secs,
            score,
        });

        if self.kind == SessionKind::Productivity {
            self.focus.tick(&self.events);
        }

        self.update_status();
    }

    /// Refresh the shared status snapshot
    fn update_status(&self) {
        let direction = self.debouncer.current_direction();
        *self.status.write() = MonitorStatus {
            active: true,
            kind: Some(self.kind),
            elapsed_secs: self.elapsed_secs,
            direction,
            direction_label: direction.to_string(),
            eyes_closed_count: self.debouncer.eyes_closed_count(),
            phone_check_count: self.debouncer.phone_check_count(),
            alert_level: self.debouncer.alert_level(),
            score: self.debouncer.score(),
        };
    }

    /// Release everything and report the outcome
    async fn teardown(mut self) -> SessionOutcome {
        self.channel.close().await;
        self.peer.close().await;
        self.capture.stop().await;

        let alerts = self.debouncer.eyes_closed_count() + self.debouncer.phone_check_count();
        let average_score = if self.score_samples == 0 {
            self.debouncer.score()
        } else {
            (self.score_sum / self.score_samples) as u32
        };

        let outcome = SessionOutcome {
            kind: self.kind,
            elapsed_secs: self.elapsed_secs,
            average_score,
            alerts,
        };

        self.debouncer.reset();
        *self.status.write() = MonitorStatus::default();
        self.events.publish(MonitorEvent::PeerStateChanged {
            state: PeerState::Closed,
        });

        info!(
            "Monitoring session ended after {}s ({} alerts)",
            outcome.elapsed_secs, outcome.alerts
        );

        outcome
    }
}
