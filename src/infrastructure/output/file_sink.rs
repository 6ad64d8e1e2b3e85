//! File-backed output sink
//!
//! Each append opens the file, writes, flushes and closes it again, so a crash
//! mid-recording leaves every frame written so far on disk.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::ports::{OutputSink, SinkError};

/// Append-only MP3 file
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    opened: bool,
    bytes_written: u64,
}

impl FileSink {
    /// Target `path`; nothing touches the filesystem until the first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            opened: false,
            bytes_written: 0,
        }
    }

    fn open_failed(&self, e: std::io::Error) -> SinkError {
        SinkError::OpenFailed {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }

    fn write_failed(&self, e: std::io::Error) -> SinkError {
        SinkError::WriteFailed {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}

impl OutputSink for FileSink {
    fn append(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        if bytes.is_empty() {
            return Ok(());
        }

        let mut options = OpenOptions::new();
        if self.opened {
            options.append(true);
        } else {
            options.write(true).create(true).truncate(true);
        }

        let mut file = options.open(&self.path).map_err(|e| self.open_failed(e))?;
        if !self.opened {
            debug!(path = %self.path.display(), "Output file created");
            self.opened = true;
        }

        file.write_all(bytes).map_err(|e| self.write_failed(e))?;
        file.flush().map_err(|e| self.write_failed(e))?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
