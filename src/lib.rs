//! vigil - Lightweight alertness monitoring agent
//!
//! This crate provides the core functionality for vigil, an agent that
//! streams the local camera to an external gaze-analysis backend over
//! WebRTC and turns the returned gaze telemetry into alertness alerts.

pub mod config;
pub mod error;
pub mod events;
pub mod focus;
pub mod gaze;
pub mod media;
pub mod monitor;
pub mod signaling;
pub mod state;
pub mod utils;
pub mod web;
pub mod webrtc;

pub use error::{AppError, Result};
