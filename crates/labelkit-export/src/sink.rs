//! Destinations for finished documents.

use labelkit_core::ExportError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Receives the finished PDF exactly once per successful export.
pub trait DocumentSink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), ExportError>;
}

/// Writes documents into a directory, creating it on first save.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl DocumentSink for FileSink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), ExportError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;
        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        self.written.push(path);
        Ok(())
    }
}

/// Keeps documents in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub documents: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentSink for MemorySink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), ExportError> {
        self.documents.push((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}
