//! Per-archive unzip-and-republish loop.
//!
//! Archives are handled strictly one at a time: the staging area is filled by
//! the extractor, drained by the republisher, then cleared before the next
//! archive starts, whatever the outcome of the previous steps.

use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveObject, Lister, ZipExtractor};
use crate::config::{FailurePolicy, PipelineOptions};
use crate::error::{Result, UnzipError};
use crate::publish::Republisher;
use crate::s3::{ObjectStore, TransferMetrics};
use crate::staging::StagingArea;

/// Where the orchestrator is in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Listing,
    Extracting(String),
    Publishing(String),
    ClearingStaging(String),
    Done,
}

/// An archive that was skipped after failing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFailure {
    pub key: String,
    pub error: String,
}

/// Outcome of a run over one source bucket
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub source_bucket: String,
    pub destination_bucket: String,
    /// Archive keys returned by the listing
    pub archives_found: usize,
    /// Archives extracted and fully uploaded
    pub archives_processed: usize,
    pub failures: Vec<ArchiveFailure>,
    /// Files written to the staging area, including archives that later failed to upload
    pub files_extracted: usize,
    /// Objects written to the destination bucket
    pub objects_uploaded: usize,
    pub bytes_uploaded: u64,
    pub elapsed: Duration,
}

impl RunReport {
    fn new(source_bucket: &str, destination_bucket: &str) -> Self {
        RunReport {
            source_bucket: source_bucket.to_string(),
            destination_bucket: destination_bucket.to_string(),
            ..RunReport::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Orchestrates listing, extraction, publishing and staging cleanup
pub struct Pipeline {
    store: Arc<dyn ObjectStore>,
    extractor: ZipExtractor,
    publisher: Republisher,
    staging: StagingArea,
    options: PipelineOptions,
    metrics: Arc<TransferMetrics>,
    state: PipelineState,
}

impl Pipeline {
    /// Build a pipeline that owns `staging` for its whole lifetime
    pub fn new(
        store: Arc<dyn ObjectStore>,
        staging: StagingArea,
        options: PipelineOptions,
    ) -> Self {
        let metrics = TransferMetrics::new();
        Pipeline {
            publisher: Republisher::new(Arc::clone(&store), Arc::clone(&metrics)),
            store,
            extractor: ZipExtractor::new(),
            staging,
            options,
            metrics,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    pub fn metrics(&self) -> &Arc<TransferMetrics> {
        &self.metrics
    }

    /// Mirror every archive of `source_bucket` into `destination_bucket`.
    ///
    /// Listing and staging failures end the run. Download, extraction and
    /// upload failures end it too under [`FailurePolicy::Abort`]; under
    /// [`FailurePolicy::Continue`] they are recorded in the report and the
    /// next archive is processed.
    pub async fn run(
        &mut self,
        source_bucket: &str,
        destination_bucket: &str,
    ) -> Result<RunReport> {
        self.metrics.start_run();
        let mut report = RunReport::new(source_bucket, destination_bucket);

        self.staging.clear()?;
        self.transition(PipelineState::Listing);

        let suffix = self.options.archive_suffix.clone();
        let lister = Lister::new(Arc::clone(&self.store), suffix);
        let mut keys = lister.archive_keys(source_bucket, None);

        while let Some(key) = keys
            .try_next()
            .await
            .map_err(|source| UnzipError::Listing {
                bucket: source_bucket.to_string(),
                source,
            })?
        {
            report.archives_found += 1;
            let archive = ArchiveObject::new(source_bucket, key);

            let outcome = self
                .process_archive(&archive, destination_bucket, &mut report)
                .await;

            let outcome = match self.clear_after(&archive, outcome) {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.transition(PipelineState::Done);
                    return Err(err);
                }
            };

            let skippable = self.options.failure_policy == FailurePolicy::Continue;
            match outcome {
                Ok(()) => report.archives_processed += 1,
                Err(err) if skippable && err.is_archive_scoped() => {
                    warn!(archive = %archive.uri(), error = %err, "skipping archive");
                    report.failures.push(ArchiveFailure {
                        key: archive.key.clone(),
                        error: err.to_string(),
                    });
                }
                Err(err) => {
                    self.transition(PipelineState::Done);
                    return Err(err);
                }
            }
        }

        self.transition(PipelineState::Done);

        report.objects_uploaded = self.metrics.upload_count();
        report.bytes_uploaded = self.metrics.total_bytes();
        report.elapsed = self.metrics.run_elapsed().unwrap_or_default();
        Ok(report)
    }

    async fn process_archive(
        &mut self,
        archive: &ArchiveObject,
        destination_bucket: &str,
        report: &mut RunReport,
    ) -> Result<()> {
        self.transition(PipelineState::Extracting(archive.key.clone()));
        info!(archive = %archive.uri(), "unzipping");

        let body = archive
            .open(self.store.as_ref())
            .await
            .map_err(|source| UnzipError::Download {
                bucket: archive.bucket.clone(),
                key: archive.key.clone(),
                source,
            })?;

        let files = self
            .extractor
            .extract_body(body, self.staging.path())
            .await
            .map_err(|source| UnzipError::Extraction {
                bucket: archive.bucket.clone(),
                key: archive.key.clone(),
                source,
            })?;
        report.files_extracted += files;
        info!(archive = %archive.file_name(), files, "unzipped");

        self.transition(PipelineState::Publishing(archive.key.clone()));
        let prefix = archive.source_prefix();
        let uploaded = self
            .publisher
            .publish(prefix, self.staging.path(), destination_bucket)
            .await?;
        info!(
            uploaded,
            destination = %format!("s3://{destination_bucket}/{prefix}"),
            "uploaded files"
        );

        Ok(())
    }

    /// Empty the staging area once an archive is done with it.
    ///
    /// The archive's own outcome is handed back when clearing succeeds.
    /// A clearing failure ends the run; if the archive had failed as well,
    /// both errors are kept.
    fn clear_after(
        &mut self,
        archive: &ArchiveObject,
        outcome: Result<()>,
    ) -> Result<Result<()>> {
        self.transition(PipelineState::ClearingStaging(archive.key.clone()));

        match (self.staging.clear(), outcome) {
            (Ok(()), outcome) => Ok(outcome),
            (Err(cleanup), Ok(())) => Err(cleanup),
            (Err(cleanup), Err(failure)) => {
                warn!(
                    archive = %archive.uri(),
                    error = %failure,
                    "archive failed and the staging area could not be cleared"
                );
                Err(UnzipError::CleanupAfterFailure {
                    key: archive.key.clone(),
                    failure: Box::new(failure),
                    cleanup: Box::new(cleanup),
                })
            }
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "pipeline state");
        self.state = next;
    }

    /// Delete the staging area
    pub fn finish(self) -> Result<()> {
        self.staging.remove()
    }
}
