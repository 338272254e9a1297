use crate::export::DirectorySink;
use crate::recorder::RecorderController;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Recording mode selector shown next to the controls
///
/// Presentational only: the selection is remembered for the UI but does not
/// constrain what the platform captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    #[default]
    Unselected,
    Fullscreen,
    Window,
    Custom,
}

impl RecordingMode {
    pub const ALL: [RecordingMode; 4] = [
        RecordingMode::Unselected,
        RecordingMode::Fullscreen,
        RecordingMode::Window,
        RecordingMode::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RecordingMode::Unselected => "Select recording mode",
            RecordingMode::Fullscreen => "Full Screen",
            RecordingMode::Window => "Specific Window",
            RecordingMode::Custom => "Custom Area",
        }
    }
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The recorder behind the Start/Stop and Download controls
    pub recorder: RecorderController,

    /// Current selector value
    pub mode: Arc<RwLock<RecordingMode>>,

    /// Where server-side exports are saved
    pub sink: Arc<DirectorySink>,
}

impl AppState {
    pub fn new(recorder: RecorderController, sink: DirectorySink) -> Self {
        Self {
            recorder,
            mode: Arc::new(RwLock::new(RecordingMode::default())),
            sink: Arc::new(sink),
        }
    }
}
