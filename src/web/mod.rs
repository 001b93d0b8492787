//! Web/API layer
//!
//! Serves the UI-facing JSON API and the `/api/ws` event stream.

pub mod handlers;
pub mod routes;
pub mod ws;

pub use routes::create_router;
