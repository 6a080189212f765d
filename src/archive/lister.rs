use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;

use super::is_archive_key;
use crate::s3::{ObjectStore, StoreError};

/// Enumerates archive keys in a bucket
pub struct Lister {
    store: Arc<dyn ObjectStore>,
    suffix: String,
}

impl Lister {
    pub fn new(store: Arc<dyn ObjectStore>, suffix: impl Into<String>) -> Self {
        Lister {
            store,
            suffix: suffix.into(),
        }
    }

    /// Stream every archive-suffixed key in the bucket.
    ///
    /// Pages are fetched lazily, one request per page, until the store stops
    /// returning a continuation token. The stream cannot be restarted.
    pub fn archive_keys<'a>(
        &'a self,
        bucket: &'a str,
        prefix: Option<&'a str>,
    ) -> BoxStream<'a, Result<String, StoreError>> {
        // `None` once the last page has been fetched
        let first_page: Option<Option<String>> = Some(None);

        let pages = stream::try_unfold(first_page, move |token| async move {
            let Some(token) = token else {
                return Ok::<_, StoreError>(None);
            };
            let page = self.store.list_page(bucket, prefix, token).await?;
            let next = page.next_continuation_token.map(Some);
            Ok::<_, StoreError>(Some((page.keys, next)))
        });

        let suffix = self.suffix.as_str();
        pages
            .map_ok(|keys| stream::iter(keys).map(Ok::<_, StoreError>))
            .try_flatten()
            .try_filter(move |key| future::ready(is_archive_key(key, suffix)))
            .boxed()
    }

    /// Collect every archive key in the bucket
    pub async fn collect_archive_keys(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        self.archive_keys(bucket, prefix).try_collect().await
    }
}
