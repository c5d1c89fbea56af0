//! File-based data source.
//!
//! Polls a JSON file holding a `/api/status` document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use super::{DataSource, Delivery, SequenceCounter, StatusSnapshot};

/// A data source that reads status snapshots from a JSON file.
///
/// Useful for replaying a saved `/api/status` response or for pointing the
/// dashboard at a file some other process keeps rewriting.
///
/// The source tracks the file's modification time and only returns
/// new data when the file has been updated. A refresh request forces the
/// next poll to re-read the file.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
    sequence: SequenceCounter,
    force_reload: bool,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
            sequence: SequenceCounter::new(),
            force_reload: false,
        }
    }

    /// Returns the path being monitored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get_modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn read_file(&mut self) -> Option<StatusSnapshot> {
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(snapshot) => {
                    self.last_error = None;
                    Some(snapshot)
                }
                Err(e) => {
                    self.last_error = Some(format!("Parse error: {}", e));
                    None
                }
            },
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                None
            }
        }
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<Delivery> {
        let current_modified = self.get_modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,        // First poll, always read
            (Some(_), None) => false, // File disappeared, keep what we have
            (Some(last), Some(current)) => current > last,
        };

        let forced = std::mem::take(&mut self.force_reload);
        if !file_changed && !forced {
            return None;
        }

        let snapshot = self.read_file()?;
        self.last_modified = current_modified;
        let seq = self.sequence.next();
        debug!(seq, path = %self.path.display(), servers = snapshot.len(), "read status file");
        Some(Delivery { seq, snapshot })
    }

    fn request_refresh(&mut self) {
        self.force_reload = true;
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
