//! Screen recording session management
//!
//! This module provides the `RecorderController` abstraction that manages:
//! - Capture stream acquisition and release
//! - The encoder lifecycle and its fragment channel
//! - Accumulation of fragments for export
//! - Session state and change notifications

mod chunks;
mod config;
mod controller;
mod state;

pub use chunks::{ChunkSequence, Fragment};
pub use config::RecorderConfig;
pub use controller::RecorderController;
pub use state::{
    RecorderSnapshot, SessionState, SessionSummary, StartOutcome, StopOutcome, ToggleOutcome,
};
