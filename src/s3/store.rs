use async_trait::async_trait;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Readable body of a downloaded object; dropping it releases the connection
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

/// Errors raised by an [`ObjectStore`]
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("bucket not found: {0}")]
    NoSuchBucket(String),

    #[error("object not found: s3://{bucket}/{key}")]
    NoSuchKey { bucket: String, key: String },

    #[error("{operation} failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One page of a bucket listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub keys: Vec<String>,
    /// Token for the next page; `None` when the listing is complete
    pub next_continuation_token: Option<String>,
}

/// The slice of an object-storage API the pipeline needs
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Region the bucket lives in
    async fn bucket_location(&self, bucket: &str) -> Result<String, StoreError>;

    /// Create a bucket in the given region; a bucket we already own counts as created
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StoreError>;

    /// Fetch one page of keys, starting after `continuation_token`
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, StoreError>;

    /// Open a streaming read of an object
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError>;

    /// Upload a local file as one object, returning the number of bytes sent
    async fn put_object(&self, bucket: &str, key: &str, path: &Path) -> Result<u64, StoreError>;

    /// A store bound to another region, when the backend is region-aware
    fn with_region(&self, _region: &str) -> Option<Arc<dyn ObjectStore>> {
        None
    }
}
