//! Recorder state machine types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of the capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No capture in progress
    #[default]
    Idle,
    /// Waiting on the platform to grant a capture stream
    Requesting,
    /// Encoder running, fragments being accumulated
    Recording,
    /// Finalizing the encoder and releasing the stream
    Stopped,
}

impl SessionState {
    /// Whether a start request has been accepted and not yet fully stopped
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }
}

/// Observable view of the recorder, published on every change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecorderSnapshot {
    pub state: SessionState,

    /// Current or most recent session
    pub session_id: Option<String>,

    /// When the current or most recent session began recording
    pub started_at: Option<DateTime<Utc>>,

    /// Fragments currently held for export
    pub fragment_count: usize,

    /// Sum of held fragment sizes
    pub total_bytes: usize,

    /// Last user-facing notification, if any
    pub notice: Option<String>,
}

impl RecorderSnapshot {
    /// Whether there is anything to download
    pub fn can_export(&self) -> bool {
        self.fragment_count > 0
    }
}

/// Result of a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session is recording
    Started { session_id: String },
    /// A session was already requesting or recording; nothing changed
    AlreadyActive(SessionState),
    /// Stop arrived while the stream was being requested; the session was
    /// stopped as soon as it began
    Cancelled(SessionSummary),
}

/// Result of a stop request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The session was finalized
    Stopped(SessionSummary),
    /// A start request is pending; it will be stopped once acquisition resolves
    CancelPending,
    /// Nothing was recording
    NotRecording,
}

/// Result of the combined Start/Stop command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Start(StartOutcome),
    Stop(StopOutcome),
}

/// Statistics about a finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    /// Fragments accepted during this session
    pub fragments: usize,
    /// Bytes accepted during this session
    pub bytes: usize,
}

impl SessionSummary {
    pub fn duration_secs(&self) -> f64 {
        self.stopped_at
            .signed_duration_since(self.started_at)
            .num_milliseconds() as f64
            / 1000.0
    }
}
