//! In-process object store.
//!
//! Buckets are ordered maps of key to bytes, so listings come back in key
//! order like S3. The page size is configurable to exercise pagination, and
//! uploads can be made to fail by key to exercise error paths.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::store::{ObjectBody, ObjectPage, ObjectStore, StoreError};

#[derive(Debug, Default)]
struct Bucket {
    region: String,
    objects: BTreeMap<String, Bytes>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, Bucket>,
    failing_uploads: HashSet<String>,
    opened: Vec<String>,
}

/// Object store kept entirely in memory
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    /// Listings return at most `page_size` keys per page
    pub fn with_page_size(page_size: usize) -> Self {
        MemoryStore {
            state: Mutex::new(State::default()),
            page_size: page_size.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a bucket directly, bypassing the store API
    pub fn add_bucket(&self, bucket: &str, region: &str) {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_insert_with(|| Bucket {
                region: region.to_string(),
                objects: BTreeMap::new(),
            });
    }

    /// Insert or replace an object; the bucket must exist
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        if let Some(b) = self.lock().buckets.get_mut(bucket) {
            b.objects.insert(key.to_string(), data.into());
        }
    }

    /// Contents of an object, if present
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key).cloned())
    }

    /// All keys of a bucket in order; empty when the bucket does not exist
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Region of a bucket, if it exists
    pub fn region_of(&self, bucket: &str) -> Option<String> {
        self.lock().buckets.get(bucket).map(|b| b.region.clone())
    }

    /// Make every upload to `key` fail
    pub fn fail_uploads_to(&self, key: &str) {
        self.lock().failing_uploads.insert(key.to_string());
    }

    /// Keys opened through `get_object`, in call order
    pub fn opened_keys(&self) -> Vec<String> {
        self.lock().opened.clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn bucket_location(&self, bucket: &str) -> Result<String, StoreError> {
        self.region_of(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StoreError> {
        self.add_bucket(bucket, region);
        Ok(())
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, StoreError> {
        let state = self.lock();
        let b = state
            .buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;

        // The token is the last key of the previous page
        let after = continuation_token.as_deref().unwrap_or_default();
        let mut keys: Vec<String> = b
            .objects
            .keys()
            .filter(|k| k.as_str() > after)
            .filter(|k| prefix.is_none_or(|p| k.starts_with(p)))
            .take(self.page_size + 1)
            .cloned()
            .collect();

        let next_continuation_token = if keys.len() > self.page_size {
            keys.truncate(self.page_size);
            keys.last().cloned()
        } else {
            None
        };

        Ok(ObjectPage {
            keys,
            next_continuation_token,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError> {
        let mut state = self.lock();
        let data = state
            .buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NoSuchKey {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        state.opened.push(key.to_string());

        Ok(Box::pin(std::io::Cursor::new(data)))
    }

    async fn put_object(&self, bucket: &str, key: &str, path: &Path) -> Result<u64, StoreError> {
        let failing = self.lock().failing_uploads.contains(key);
        if failing {
            return Err(StoreError::Request {
                operation: "PutObject",
                message: format!("injected failure for {key}"),
            });
        }

        let data = tokio::fs::read(path).await?;
        let size = data.len() as u64;

        let mut state = self.lock();
        let b = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;
        b.objects.insert(key.to_string(), Bytes::from(data));

        Ok(size)
    }
}
