//! HTTP API standing in for the recorder page
//!
//! This module exposes the page's controls as REST endpoints:
//! - GET /recorder/status - State, Download availability, toggle label
//! - POST /recorder/start, /recorder/stop, /recorder/toggle - Start/Stop control
//! - GET /recorder/download - The assembled recording as an attachment
//! - POST /recorder/export - Save the recording into the output directory
//! - POST /recorder/reset - Discard the accumulated recording
//! - GET|PUT /recorder/mode - Recording mode selector
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, RecordingMode};
