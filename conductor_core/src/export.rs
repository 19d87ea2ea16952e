use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while persisting an exported test case.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export I/O error: {0}")]
    Io(String),
    #[error("export metadata serialization error: {0}")]
    Metadata(String),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Metadata(err.to_string())
    }
}

/// Sidecar metadata written next to each exported payload.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ArtifactMetadata {
    /// MD5 hex digest of the payload, also its file stem.
    pub hash: String,
    pub size: usize,
    /// Operator commentary on why this test case was kept.
    pub comment: Option<String>,
}

/// Persists exported test cases: the raw payload under an md5-derived name
/// with the configured extension, plus a JSON sidecar carrying the
/// operator's comment.
pub struct ArtifactSink {
    dir: PathBuf,
    extension: String,
}

impl ArtifactSink {
    /// Creates the sink, making sure the output directory exists.
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Result<Self, ExportError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            extension: extension.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes one artifact and its sidecar; returns the payload path.
    /// Re-exporting identical bytes overwrites the same files, so duplicate
    /// findings collapse naturally.
    pub fn export(&self, data: &[u8], comment: Option<&str>) -> Result<PathBuf, ExportError> {
        let hash = format!("{:x}", md5::compute(data));

        let payload_path = self.dir.join(format!("{}{}", hash, self.extension));
        fs::write(&payload_path, data)?;

        let metadata = ArtifactMetadata {
            hash: hash.clone(),
            size: data.len(),
            comment: comment.map(str::to_string),
        };
        let sidecar_path = self.dir.join(format!("{hash}.json"));
        fs::write(&sidecar_path, serde_json::to_string_pretty(&metadata)?)?;

        info!(path = ?payload_path, comment = comment.unwrap_or(""), "exported test case");
        Ok(payload_path)
    }
}
