//! Local staging directory shared by every archive of a run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::UnzipError;

/// Attempts at finding an unused directory name before giving up
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Reusable directory holding one archive's extracted files at a time.
///
/// Emptied between archives with [`clear`](Self::clear) and deleted when the
/// run ends, either through [`remove`](Self::remove) or on drop.
#[derive(Debug)]
pub struct StagingArea {
    path: PathBuf,
    removed: bool,
}

impl StagingArea {
    /// Create `<root>/s3unzip-<unix millis>`, creating `root` if needed
    pub fn create(root: &Path) -> Result<Self, UnzipError> {
        fs::create_dir_all(root).map_err(|e| {
            UnzipError::Configuration(format!(
                "cannot create staging root {}: {e}",
                root.display()
            ))
        })?;

        let stamp = chrono::Utc::now().timestamp_millis();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("s3unzip-{stamp}")
            } else {
                format!("s3unzip-{stamp}-{attempt}")
            };
            let path = root.join(name);

            match fs::create_dir(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "created staging area");
                    return Ok(StagingArea {
                        path,
                        removed: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(UnzipError::Configuration(format!(
                        "cannot create staging directory {}: {e}",
                        path.display()
                    )));
                }
            }
        }

        Err(UnzipError::Configuration(format!(
            "no free staging directory name under {}",
            root.display()
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory currently holds no entries
    pub fn is_empty(&self) -> Result<bool, UnzipError> {
        let mut entries = fs::read_dir(&self.path).map_err(|e| self.error(e))?;
        Ok(entries.next().is_none())
    }

    /// Delete every file and subdirectory, keeping the directory itself.
    /// Clearing an empty area does nothing.
    pub fn clear(&self) -> Result<(), UnzipError> {
        for entry in fs::read_dir(&self.path).map_err(|e| self.error(e))? {
            let entry = entry.map_err(|e| self.error(e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| self.error(e))?;

            let result = if file_type.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            result.map_err(|source| UnzipError::Staging { path, source })?;
        }
        Ok(())
    }

    /// Delete the directory and everything in it
    pub fn remove(mut self) -> Result<(), UnzipError> {
        self.removed = true;
        match fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.error(e)),
        }
    }

    fn error(&self, source: io::Error) -> UnzipError {
        UnzipError::Staging {
            path: self.path.clone(),
            source,
        }
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "failed to remove staging area");
                }
            }
        }
    }
}
