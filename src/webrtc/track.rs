//! Local video track fed from the camera capture

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};
use webrtc::api::media_engine::MIME_TYPE_H264;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::media::VideoFrame;

/// Video track configuration
#[derive(Debug, Clone)]
pub struct VideoTrackConfig {
    /// Track ID
    pub track_id: String,
    /// Stream ID
    pub stream_id: String,
    /// Nominal frame rate, used for the first sample duration
    pub fps: u32,
}

impl Default for VideoTrackConfig {
    fn default() -> Self {
        Self {
            track_id: "camera0".to_string(),
            stream_id: "vigil-stream".to_string(),
            fps: 30,
        }
    }
}

/// H.264 codec capability for the camera track
fn h264_capability() -> RTCRtpCodecCapability {
    RTCRtpCodecCapability {
        mime_type: MIME_TYPE_H264.to_string(),
        clock_rate: 90000,
        channels: 0,
        sdp_fmtp_line: "level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42e01f"
            .to_string(),
        rtcp_feedback: vec![],
    }
}

/// Video track for streaming the camera to the backend
pub struct VideoTrack {
    config: VideoTrackConfig,
    /// Sample track (handles packetization)
    track: Arc<TrackLocalStaticSample>,
    /// Running flag
    running: Arc<watch::Sender<bool>>,
}

impl VideoTrack {
    /// Create a new video track
    pub fn new(config: VideoTrackConfig) -> Self {
        let track = Arc::new(TrackLocalStaticSample::new(
            h264_capability(),
            config.track_id.clone(),
            config.stream_id.clone(),
        ));

        let (running_tx, _) = watch::channel(false);

        Self {
            config,
            track,
            running: Arc::new(running_tx),
        }
    }

    /// Get the underlying sample track
    pub fn sample_track(&self) -> Arc<TrackLocalStaticSample> {
        self.track.clone()
    }

    /// Start forwarding frames from a broadcast receiver
    pub fn start_sending(&self, mut frame_rx: broadcast::Receiver<VideoFrame>) {
        let _ = self.running.send(true);
        let track = self.track.clone();
        let fps = self.config.fps.max(1);
        let mut running_rx = self.running.subscribe();

        info!("Starting video track sender");

        tokio::spawn(async move {
            let mut last_frame_time: Option<Instant> = None;
            loop {
                tokio::select! {
                    result = frame_rx.recv() => {
                        match result {
                            Ok(frame) => {
                                // Sample duration drives the RTP timestamps;
                                // derive it from actual frame spacing
                                let now = Instant::now();
                                let duration = match last_frame_time {
                                    Some(last) => now
                                        .duration_since(last)
                                        .min(Duration::from_millis(100)),
                                    None => Duration::from_secs(1) / fps,
                                };
                                last_frame_time = Some(now);

                                let sample = Sample {
                                    data: frame.data_bytes(),
                                    duration,
                                    ..Default::default()
                                };

                                if let Err(e) = track.write_sample(&sample).await {
                                    debug!("Failed to write sample: {}", e);
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                debug!("Video track lagged by {} frames", n);
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                debug!("Frame channel closed");
                                break;
                            }
                        }
                    }
                    _ = running_rx.changed() => {
                        if !*running_rx.borrow() {
                            debug!("Video track stopped");
                            break;
                        }
                    }
                }
            }

            info!("Video track sender stopped");
        });
    }

    /// Stop sending
    pub fn stop(&self) {
        let _ = self.running.send(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_ids() {
        let track = VideoTrack::new(VideoTrackConfig::default());
        use webrtc::track::track_local::TrackLocal;
        assert_eq!(track.sample_track().id(), "camera0");
        assert_eq!(track.sample_track().stream_id(), "vigil-stream");
    }
}
