use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use walkdir::WalkDir;

use crate::archive::destination_key;
use crate::error::UnzipError;
use crate::s3::{ObjectStore, TransferMetrics};

/// Uploads the files sitting in the staging area
pub struct Republisher {
    store: Arc<dyn ObjectStore>,
    metrics: Arc<TransferMetrics>,
}

impl Republisher {
    pub fn new(store: Arc<dyn ObjectStore>, metrics: Arc<TransferMetrics>) -> Self {
        Republisher { store, metrics }
    }

    /// Upload every regular file under `staging` to
    /// `destination_bucket/destination_prefix + file name`.
    ///
    /// Stops at the first failed upload. Files already uploaded stay in the
    /// destination bucket; the staging area is left untouched.
    pub async fn publish(
        &self,
        destination_prefix: &str,
        staging: &Path,
        destination_bucket: &str,
    ) -> Result<usize, UnzipError> {
        let mut uploaded = 0;

        for path in staged_files(staging)? {
            let Some(key) = destination_key(destination_prefix, &path) else {
                continue;
            };

            let started = Instant::now();
            let bytes = self
                .store
                .put_object(destination_bucket, &key, &path)
                .await
                .map_err(|source| UnzipError::Upload {
                    bucket: destination_bucket.to_string(),
                    key: key.clone(),
                    source,
                })?;
            self.metrics.record_upload(&key, bytes, started.elapsed());

            debug!(key = %key, bytes, "uploaded file");
            uploaded += 1;
        }

        Ok(uploaded)
    }
}

/// Regular files anywhere under `root`, in walk order
fn staged_files(root: &Path) -> Result<Vec<PathBuf>, UnzipError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(|e| UnzipError::Staging {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source: e.into(),
        })?;

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
