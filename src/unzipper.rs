use std::sync::Arc;
use tracing::{info, warn};

use crate::config::UnzipConfig;
use crate::error::{Result, UnzipError};
use crate::pipeline::{Pipeline, RunReport};
use crate::s3::ObjectStore;
use crate::staging::StagingArea;

/// Runs the pipeline for a source bucket: staging setup, bucket lookup,
/// destination creation and cleanup
pub struct Unzipper {
    store: Arc<dyn ObjectStore>,
    config: UnzipConfig,
}

impl Unzipper {
    pub fn new(store: Arc<dyn ObjectStore>, config: UnzipConfig) -> Self {
        Unzipper { store, config }
    }

    /// Mirror every archive of `source_bucket` into `<source_bucket><destination_suffix>`
    pub async fn run(&self, source_bucket: &str) -> Result<RunReport> {
        let staging = StagingArea::create(&self.config.staging_root)?;

        let region = self
            .store
            .bucket_location(source_bucket)
            .await
            .map_err(|source| UnzipError::ContainerLookup {
                bucket: source_bucket.to_string(),
                source,
            })?;

        let store = self
            .store
            .with_region(&region)
            .unwrap_or_else(|| Arc::clone(&self.store));

        let destination = self.config.destination_bucket(source_bucket);
        store
            .create_bucket(&destination, &region)
            .await
            .map_err(|source| UnzipError::DestinationBucket {
                bucket: destination.clone(),
                source,
            })?;
        info!(
            source = source_bucket,
            destination = %destination,
            region = %region,
            "retrieving the zip files"
        );

        let mut pipeline = Pipeline::new(store, staging, self.config.pipeline.clone());
        let result = pipeline.run(source_bucket, &destination).await;

        if let Err(e) = pipeline.finish() {
            warn!(error = %e, "failed to remove staging area");
        }

        result
    }
}
