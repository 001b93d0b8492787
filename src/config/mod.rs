//! Application configuration
//!
//! Configuration is described by [`schema::AppConfig`] and persisted by
//! [`store::ConfigStore`].

pub mod schema;
pub mod store;

pub use schema::{AppConfig, CameraConfig, GazeConfig, PomodoroConfig, SignalingConfig, WebConfig};
pub use store::{ConfigChange, ConfigStore};
