//! Error types for the unzip pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::s3::StoreError;

/// Result type alias using `UnzipError`.
pub type Result<T> = std::result::Result<T, UnzipError>;

/// Errors raised while reading a zip stream into the staging area.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Reading the archive stream failed.
    #[error("failed to read archive stream: {0}")]
    Read(#[source] std::io::Error),

    /// The stream ended in the middle of a header or entry.
    #[error("archive is truncated: {0}")]
    Truncated(&'static str),

    /// A record started with an unknown signature.
    #[error("invalid zip record signature {signature:#010x}")]
    InvalidSignature {
        /// The four bytes found where a header was expected.
        signature: u32,
    },

    /// The entry uses a feature this reader does not handle.
    #[error("unsupported zip entry {name}: {reason}")]
    Unsupported {
        /// Entry name inside the archive.
        name: String,
        /// What is unsupported.
        reason: String,
    },

    /// The entry name would land outside the staging area.
    #[error("entry path escapes the staging area: {name}")]
    UnsafePath {
        /// Entry name inside the archive.
        name: String,
    },

    /// Inflating an entry failed.
    #[error("failed to decompress {name}: {source}")]
    Decompress {
        /// Entry name inside the archive.
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Creating a directory or writing an extracted file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Local path being written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking extraction task did not complete.
    #[error("extraction task aborted: {0}")]
    Aborted(String),
}

/// Errors surfaced by the pipeline and its bootstrap.
#[derive(Error, Debug)]
pub enum UnzipError {
    /// Invalid arguments or an unusable staging root.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The source bucket does not exist or cannot be accessed.
    #[error("cannot locate bucket {bucket}: {source}")]
    ContainerLookup {
        bucket: String,
        #[source]
        source: StoreError,
    },

    /// The destination bucket could not be created.
    #[error("cannot create destination bucket {bucket}: {source}")]
    DestinationBucket {
        bucket: String,
        #[source]
        source: StoreError,
    },

    /// Listing the source bucket failed.
    #[error("failed to list bucket {bucket}: {source}")]
    Listing {
        bucket: String,
        #[source]
        source: StoreError,
    },

    /// The archive body could not be opened.
    #[error("failed to download s3://{bucket}/{key}: {source}")]
    Download {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// The archive could not be expanded into the staging area.
    #[error("failed to extract s3://{bucket}/{key}: {source}")]
    Extraction {
        bucket: String,
        key: String,
        #[source]
        source: ExtractionError,
    },

    /// An extracted file could not be uploaded.
    #[error("failed to upload s3://{bucket}/{key}: {source}")]
    Upload {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// The staging directory could not be walked, cleared or removed.
    #[error("staging area error at {}: {source}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An archive failed and the staging area could not be cleared afterwards.
    #[error("{cleanup} (after {key} failed: {failure})")]
    CleanupAfterFailure {
        key: String,
        failure: Box<UnzipError>,
        #[source]
        cleanup: Box<UnzipError>,
    },
}

impl UnzipError {
    /// Whether this failure is scoped to a single archive.
    ///
    /// Archive-scoped failures may be skipped under
    /// [`FailurePolicy::Continue`](crate::config::FailurePolicy::Continue);
    /// everything else ends the run.
    pub fn is_archive_scoped(&self) -> bool {
        matches!(
            self,
            Self::Download { .. } | Self::Extraction { .. } | Self::Upload { .. }
        )
    }
}
