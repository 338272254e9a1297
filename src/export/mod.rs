//! Export of accumulated recordings
//!
//! The assembler concatenates the current chunk sequence into a single
//! artifact; an `ExportSink` hands that artifact to whatever saves it.

mod sink;

pub use sink::{DirectorySink, ExportSink};

use bytes::{Bytes, BytesMut};

use crate::recorder::Fragment;

pub const DEFAULT_MIME_TYPE: &str = "video/webm";
pub const DEFAULT_FILE_NAME: &str = "screen-recording.webm";

/// A complete recording ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub data: Bytes,
    pub mime_type: String,
    pub file_name: String,
}

impl ExportArtifact {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Concatenates fragments into artifacts
#[derive(Debug, Clone)]
pub struct ExportAssembler {
    mime_type: String,
    file_name: String,
}

impl ExportAssembler {
    pub fn new(mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Build an artifact from the fragments in order
    ///
    /// Returns `None` when there is nothing to export.
    pub fn assemble(&self, fragments: &[Fragment]) -> Option<ExportArtifact> {
        if fragments.is_empty() {
            return None;
        }

        let total: usize = fragments.iter().map(Fragment::len).sum();
        let mut data = BytesMut::with_capacity(total);
        for fragment in fragments {
            data.extend_from_slice(fragment.as_bytes());
        }

        Some(ExportArtifact {
            data: data.freeze(),
            mime_type: self.mime_type.clone(),
            file_name: self.file_name.clone(),
        })
    }
}

impl Default for ExportAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MIME_TYPE, DEFAULT_FILE_NAME)
    }
}
