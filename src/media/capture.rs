//! V4L2 camera capture
//!
//! Captures H.264 directly from a UVC camera. The device is opened on the
//! capture thread; the open result is reported back before [`CameraCapture::start`]
//! returns so that a denied or missing camera fails the session start
//! instead of dying silently in the background.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot, watch, Mutex};
use tracing::{debug, error, info, warn};

use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::capture::parameters::Parameters;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

use super::frame::VideoFrame;
use crate::config::CameraConfig;
use crate::error::{AppError, Result};
use crate::utils::LogThrottler;
use crate::error_throttled;

/// Default number of capture buffers
const DEFAULT_BUFFER_COUNT: u32 = 4;
/// Frame broadcast ring size
const FRAME_CHANNEL_CAPACITY: usize = 16;
/// Minimum valid frame size (bytes)
const MIN_FRAME_SIZE: usize = 128;

/// Camera capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Device path
    pub device_path: PathBuf,
    /// Desired width
    pub width: u32,
    /// Desired height
    pub height: u32,
    /// Desired frame rate
    pub fps: u32,
    /// Number of capture buffers
    pub buffer_count: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from("/dev/video0"),
            width: 1280,
            height: 720,
            fps: 30,
            buffer_count: DEFAULT_BUFFER_COUNT,
        }
    }
}

impl CaptureConfig {
    /// Create config for a specific device
    pub fn for_device(path: impl AsRef<Path>) -> Self {
        Self {
            device_path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }
}

impl From<&CameraConfig> for CaptureConfig {
    fn from(config: &CameraConfig) -> Self {
        Self {
            device_path: PathBuf::from(
                config.device.as_deref().unwrap_or("/dev/video0"),
            ),
            width: config.width,
            height: config.height,
            fps: config.fps,
            buffer_count: DEFAULT_BUFFER_COUNT,
        }
    }
}

/// Camera capture state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Not started
    Stopped,
    /// Starting (initializing device)
    Starting,
    /// Running and capturing
    Running,
    /// Error occurred
    Error,
    /// Device was lost (disconnected)
    DeviceLost,
}

/// Async camera capturer
///
/// Runs a blocking capture loop on the tokio blocking pool and fans frames
/// out on a broadcast channel. The loop owns the device handle exclusively,
/// so dropping out of the loop releases the camera.
pub struct CameraCapture {
    config: CaptureConfig,
    state: Arc<watch::Sender<CaptureState>>,
    state_rx: watch::Receiver<CaptureState>,
    stop_flag: Arc<AtomicBool>,
    frame_tx: broadcast::Sender<VideoFrame>,
    capture_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl CameraCapture {
    /// Create a new camera capturer
    pub fn new(config: CaptureConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(CaptureState::Stopped);
        let (frame_tx, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);

        Self {
            config,
            state: Arc::new(state_tx),
            state_rx,
            stop_flag: Arc::new(AtomicBool::new(false)),
            frame_tx,
            capture_handle: Mutex::new(None),
        }
    }

    /// Get current capture state
    pub fn state(&self) -> CaptureState {
        *self.state_rx.borrow()
    }

    /// Subscribe to captured frames
    pub fn subscribe(&self) -> broadcast::Receiver<VideoFrame> {
        self.frame_tx.subscribe()
    }

    /// Get config
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Start capturing in background
    ///
    /// Blocks until the device has been opened and configured; open
    /// failures (most importantly a permission denial on the device node)
    /// are returned to the caller and capture does not start.
    pub async fn start(&self) -> Result<()> {
        let current_state = self.state();
        if current_state == CaptureState::Running || current_state == CaptureState::Starting {
            return Ok(());
        }

        info!(
            "Starting capture on {:?} at {}x{}@{}",
            self.config.device_path, self.config.width, self.config.height, self.config.fps
        );

        let _ = self.state.send(CaptureState::Starting);
        self.stop_flag.store(false, Ordering::SeqCst);

        let config = self.config.clone();
        let state = self.state.clone();
        let stop_flag = self.stop_flag.clone();
        let frame_tx = self.frame_tx.clone();
        let (open_tx, open_rx) = oneshot::channel();

        let handle = tokio::task::spawn_blocking(move || {
            capture_loop(config, state, stop_flag, frame_tx, open_tx);
        });

        *self.capture_handle.lock().await = Some(handle);

        match open_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                let _ = self.state.send(CaptureState::Error);
                Err(e)
            }
            Err(_) => {
                let _ = self.state.send(CaptureState::Error);
                Err(AppError::Capture("Capture thread died during open".to_string()))
            }
        }
    }

    /// Stop capturing and release the device
    pub async fn stop(&self) {
        info!("Stopping capture");
        self.stop_flag.store(true, Ordering::SeqCst);

        if let Some(handle) = self.capture_handle.lock().await.take() {
            let _ = handle.await;
        }

        let _ = self.state.send(CaptureState::Stopped);
    }

    /// Check if capturing
    pub fn is_running(&self) -> bool {
        self.state() == CaptureState::Running
    }
}

/// Map a device-open failure to the error taxonomy
fn map_open_error(device: &Path, e: &io::Error) -> AppError {
    let device = device.display().to_string();
    match e.kind() {
        io::ErrorKind::PermissionDenied => AppError::CameraAccess {
            device,
            reason: e.to_string(),
        },
        io::ErrorKind::NotFound => {
            AppError::Capture(format!("Camera {} not found: {}", device, e))
        }
        _ => AppError::Capture(format!("Failed to open {}: {}", device, e)),
    }
}

/// Main capture loop (runs in blocking thread)
fn capture_loop(
    config: CaptureConfig,
    state: Arc<watch::Sender<CaptureState>>,
    stop_flag: Arc<AtomicBool>,
    frame_tx: broadcast::Sender<VideoFrame>,
    open_tx: oneshot::Sender<Result<()>>,
) {
    // Open and configure the device before reporting readiness
    let dev = match open_device(&config) {
        Ok(dev) => dev,
        Err(e) => {
            error!("Capture open failed: {}", e);
            let _ = open_tx.send(Err(e));
            return;
        }
    };

    match run_capture(&config, &dev, &state, &stop_flag, &frame_tx, open_tx) {
        Ok(()) => {
            let _ = state.send(CaptureState::Stopped);
        }
        Err(AppError::CameraLost { device, reason }) => {
            error!("Camera lost: {} - {}", device, reason);
            let _ = state.send(CaptureState::DeviceLost);
        }
        Err(e) => {
            error!("Capture error: {}", e);
            let _ = state.send(CaptureState::Error);
        }
    }
    // Device handle drops here, releasing the camera
}

/// Open the device and negotiate an H.264 stream
fn open_device(config: &CaptureConfig) -> Result<Device> {
    let dev = Device::with_path(&config.device_path)
        .map_err(|e| map_open_error(&config.device_path, &e))?;

    let wanted = Format::new(config.width, config.height, FourCC::new(b"H264"));
    let actual = Capture::set_format(&dev, &wanted)
        .map_err(|e| AppError::Capture(format!("Failed to set format: {}", e)))?;

    if actual.fourcc != FourCC::new(b"H264") {
        return Err(AppError::Capture(format!(
            "Camera {:?} does not provide H.264 (got {})",
            config.device_path, actual.fourcc
        )));
    }

    if let Err(e) = Capture::set_params(&dev, &Parameters::with_fps(config.fps)) {
        // Non-fatal: some drivers reject frame interval control
        warn!("Failed to set frame rate: {}", e);
    }

    info!(
        "Capture format: {}x{} {} ",
        actual.width, actual.height, actual.fourcc
    );

    Ok(dev)
}

/// Inner capture loop after the device is successfully opened
fn run_capture(
    config: &CaptureConfig,
    dev: &Device,
    state: &watch::Sender<CaptureState>,
    stop_flag: &AtomicBool,
    frame_tx: &broadcast::Sender<VideoFrame>,
    open_tx: oneshot::Sender<Result<()>>,
) -> Result<()> {
    let mut stream = match MmapStream::with_buffers(dev, Type::VideoCapture, config.buffer_count) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = open_tx.send(Err(AppError::Capture(format!(
                "Failed to start stream: {}",
                e
            ))));
            return Err(AppError::Capture(format!("Failed to start stream: {}", e)));
        }
    };

    let _ = open_tx.send(Ok(()));
    let _ = state.send(CaptureState::Running);
    info!("Capture started");

    let error_throttler = LogThrottler::with_secs(5);
    let mut sequence = 0u64;

    while !stop_flag.load(Ordering::Relaxed) {
        let (buf, meta) = match stream.next() {
            Ok(next) => next,
            Err(e) => {
                let is_device_lost = matches!(
                    e.raw_os_error(),
                    Some(6) | Some(19) | Some(5) | Some(32) // ENXIO, ENODEV, EIO, EPIPE
                );
                if is_device_lost {
                    return Err(AppError::CameraLost {
                        device: config.device_path.display().to_string(),
                        reason: e.to_string(),
                    });
                }

                error_throttled!(error_throttler, "capture_dqbuf", "Capture error: {}", e);
                continue;
            }
        };

        let used = meta.bytesused as usize;
        if used < MIN_FRAME_SIZE {
            debug!("Dropping small frame: {} bytes", used);
            continue;
        }

        let key_frame = meta.flags.contains(v4l::buffer::Flags::KEYFRAME);
        let frame = VideoFrame::from_vec(
            buf[..used].to_vec(),
            config.width,
            config.height,
            key_frame,
            sequence,
        );
        sequence += 1;

        // No subscribers is normal before the peer connects
        let _ = frame_tx.send(frame);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_camera_config() {
        let camera = CameraConfig {
            device: Some("/dev/video2".to_string()),
            width: 640,
            height: 480,
            fps: 15,
        };
        let config = CaptureConfig::from(&camera);
        assert_eq!(config.device_path, PathBuf::from("/dev/video2"));
        assert_eq!(config.width, 640);
        assert_eq!(config.fps, 15);
    }

    #[test]
    fn test_config_default_device() {
        let camera = CameraConfig::default();
        let config = CaptureConfig::from(&camera);
        assert_eq!(config.device_path, PathBuf::from("/dev/video0"));
    }

    #[tokio::test]
    async fn test_missing_device_fails_start() {
        let capture = CameraCapture::new(CaptureConfig::for_device(
            "/dev/video-does-not-exist",
        ));

        let err = capture.start().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Capture(_) | AppError::CameraAccess { .. }
        ));
        assert_eq!(capture.state(), CaptureState::Error);
    }
}
