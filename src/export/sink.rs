use std::path::{Path, PathBuf};
use tracing::info;

use super::ExportArtifact;
use crate::error::{RecorderError, RecorderResult};

/// Persistence boundary: hands a finished artifact to the platform
#[async_trait::async_trait]
pub trait ExportSink: Send + Sync {
    async fn save(&self, artifact: &ExportArtifact) -> RecorderResult<()>;
}

/// Saves artifacts into a directory under their suggested file name
///
/// An existing file with the same name is replaced.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    output_dir: PathBuf,
}

impl DirectorySink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Where an artifact with this file name ends up
    pub fn path_for(&self, file_name: &str) -> RecorderResult<PathBuf> {
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| RecorderError::Export(format!("invalid file name: {:?}", file_name)))?;
        Ok(self.output_dir.join(name))
    }
}

#[async_trait::async_trait]
impl ExportSink for DirectorySink {
    async fn save(&self, artifact: &ExportArtifact) -> RecorderResult<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let path = self.path_for(&artifact.file_name)?;
        tokio::fs::write(&path, &artifact.data).await?;

        info!(
            "Saved {} ({} bytes, {})",
            path.display(),
            artifact.len(),
            artifact.mime_type
        );

        Ok(())
    }
}
