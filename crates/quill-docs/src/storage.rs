//! On-disk storage for uploaded documents.

use std::path::{Path, PathBuf};

use tracing::debug;

use quill_core::error::QuillError;

/// Directory uploaded files are written to, verbatim, under their file name.
#[derive(Debug, Clone)]
pub struct DocumentStorage {
    dir: PathBuf,
}

impl DocumentStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reduce an uploaded name to its final path component.
    ///
    /// `../../etc/passwd` becomes `passwd`; names with no usable component
    /// (empty, `.`, `..`, a bare `/`) are rejected.
    pub fn file_name(filename: &str) -> Result<String, QuillError> {
        let normalized = filename.replace('\\', "/");
        Path::new(&normalized)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                QuillError::UnsupportedFormat(format!("invalid file name '{}'", filename))
            })
    }

    /// Write `bytes` to `<dir>/<file name>`, replacing any existing file.
    ///
    /// The directory is created on first use.
    pub async fn persist(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, QuillError> {
        let name = Self::file_name(filename)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(&name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Document persisted");
        Ok(path)
    }

    /// Read a previously persisted file.
    pub async fn read(&self, path: &Path) -> Result<Vec<u8>, QuillError> {
        Ok(tokio::fs::read(path).await?)
    }
}
