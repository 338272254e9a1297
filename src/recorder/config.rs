use serde::{Deserialize, Serialize};

use crate::export::{DEFAULT_FILE_NAME, DEFAULT_MIME_TYPE};

/// Configuration for the recorder controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Keep fragments from earlier sessions and append new ones after them.
    /// When false, the sequence is cleared each time a session starts recording.
    pub append_sessions: bool,

    /// Container type declared on exported artifacts
    pub mime_type: String,

    /// Suggested file name for exported artifacts
    pub file_name: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            append_sessions: false,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}
