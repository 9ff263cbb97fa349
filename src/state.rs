//! Sync state file holding the last project identifier used.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::project::ProjectId;

/// Single-line record of the last identifier, stored next to the mirror.
#[derive(Debug, Clone)]
pub struct SyncState {
    path: PathBuf,
}

impl SyncState {
    /// State file `file_name` inside `dir`.
    pub fn new(dir: &Path, file_name: &str) -> Self {
        Self {
            path: dir.join(file_name),
        }
    }

    /// Path of the state file.
    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved identifier.
    ///
    /// A missing or unreadable file, an empty first line, or a first line
    /// that is not a valid identifier all mean "no saved identifier".
    pub fn load(&self) -> Option<ProjectId> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::debug!("cannot read {}: {}", self.path.display(), e);
                return None;
            }
        };

        let line = contents.lines().next().unwrap_or("").trim();
        if line.is_empty() {
            return None;
        }

        match line.parse() {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!(
                    "Ignoring malformed id in {} ({}): {}",
                    self.path.display(),
                    line,
                    e
                );
                None
            }
        }
    }

    /// Overwrite the state file with `id`.
    ///
    /// Failure is only a warning; returns whether the write succeeded.
    pub fn save(&self, id: &ProjectId) -> bool {
        match fs::write(&self.path, format!("{}\n", id)) {
            Ok(()) => true,
            Err(e) => {
                log::warn!(
                    "Problem creating {} file: {}",
                    self.path.display(),
                    e
                );
                false
            }
        }
    }
}
