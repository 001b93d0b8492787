//! Local media acquisition
//!
//! Owns the camera device while monitoring is active. The capture loop
//! produces encoded [`frame::VideoFrame`]s on a broadcast channel that the
//! WebRTC video track subscribes to; the device is released when capture
//! stops or the owning session is torn down.

pub mod capture;
pub mod frame;

pub use capture::{CameraCapture, CaptureConfig, CaptureState};
pub use frame::VideoFrame;
