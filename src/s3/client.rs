use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig, retry::RetryConfig};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::store::{ObjectBody, ObjectPage, ObjectStore, StoreError};
use crate::config::ClientConfig;

/// Region assumed when neither the caller nor the environment names one.
/// It is also the region S3 reports as an empty location constraint.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Wrapper around AWS S3 client
pub struct S3Client {
    client: Client,
    base_config: SdkConfig,
    config: ClientConfig,
    region: String,
}

impl S3Client {
    /// Create a new S3 client from the given configuration.
    ///
    /// Static credentials replace the default credential chain when present;
    /// the SDK's standard retry strategy is bounded by `max_attempts`.
    pub async fn new(config: ClientConfig) -> Self {
        let attempts = config.max_attempts.max(1);
        let retry = RetryConfig::standard().with_max_attempts(attempts);
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(retry);

        if let Some(creds) = &config.credentials {
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                None,
                None,
                "command-line",
            ));
        }

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        let base_config = loader.load().await;

        let region = base_config
            .region()
            .map(|r| r.as_ref().to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let client = Self::build_client(&base_config, &config, &region);

        S3Client {
            client,
            base_config,
            config,
            region,
        }
    }

    /// Region requests are signed for
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Same credentials and endpoint, different region
    pub fn for_region(&self, region: &str) -> Self {
        S3Client {
            client: Self::build_client(&self.base_config, &self.config, region),
            base_config: self.base_config.clone(),
            config: self.config.clone(),
            region: region.to_string(),
        }
    }

    fn build_client(base_config: &SdkConfig, config: &ClientConfig, region: &str) -> Client {
        let mut builder = aws_sdk_s3::config::Builder::from(base_config)
            .region(Region::new(region.to_string()));

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        Client::from_conf(builder.build())
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn bucket_location(&self, bucket: &str) -> Result<String, StoreError> {
        let resp = self
            .client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| {
                if err.code() == Some("NoSuchBucket") {
                    StoreError::NoSuchBucket(bucket.to_string())
                } else {
                    request_error("GetBucketLocation", err)
                }
            })?;

        Ok(normalize_location(
            resp.location_constraint().map(|c| c.as_str()),
        ))
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StoreError> {
        let mut req = self.client.create_bucket().bucket(bucket);

        // us-east-1 rejects an explicit location constraint
        if region != DEFAULT_REGION {
            req = req.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match req.send().await {
            Ok(_) => Ok(()),
            Err(err) if err.code() == Some("BucketAlreadyOwnedByYou") => {
                debug!(bucket, "bucket already exists and is owned by us");
                Ok(())
            }
            Err(err) => Err(request_error("CreateBucket", err)),
        }
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, StoreError> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(String::from))
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|err| {
                if err.code() == Some("NoSuchBucket") {
                    StoreError::NoSuchBucket(bucket.to_string())
                } else {
                    request_error("ListObjectsV2", err)
                }
            })?;

        object_page(&resp)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.code() == Some("NoSuchKey") {
                    StoreError::NoSuchKey {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    request_error("GetObject", err)
                }
            })?;

        Ok(Box::pin(resp.body.into_async_read()))
    }

    async fn put_object(&self, bucket: &str, key: &str, path: &Path) -> Result<u64, StoreError> {
        let size = tokio::fs::metadata(path).await?.len();

        let body = ByteStream::from_path(path)
            .await
            .map_err(|err| StoreError::Request {
                operation: "PutObject",
                message: format!("cannot read {}: {err}", path.display()),
            })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|err| request_error("PutObject", err))?;

        Ok(size)
    }

    fn with_region(&self, region: &str) -> Option<Arc<dyn ObjectStore>> {
        Some(Arc::new(self.for_region(region)))
    }
}

fn request_error<E>(operation: &'static str, err: E) -> StoreError
where
    E: std::error::Error + 'static,
{
    StoreError::Request {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}

/// Keys of one listing response and the token for the next page.
///
/// A response that claims truncation without a token is refused rather than
/// treated as the last page.
fn object_page(resp: &ListObjectsV2Output) -> Result<ObjectPage, StoreError> {
    let keys = resp
        .contents()
        .iter()
        .filter_map(|obj| obj.key())
        .map(String::from)
        .collect();

    let truncated = resp.is_truncated().unwrap_or(false);
    let next_continuation_token = match resp.next_continuation_token() {
        Some(token) if truncated => Some(token.to_string()),
        None if truncated => {
            return Err(StoreError::Request {
                operation: "ListObjectsV2",
                message: "truncated listing without a continuation token".to_string(),
            });
        }
        _ => None,
    };

    Ok(ObjectPage {
        keys,
        next_continuation_token,
    })
}

/// Map a GetBucketLocation constraint to a region name
fn normalize_location(constraint: Option<&str>) -> String {
    match constraint {
        None | Some("") => DEFAULT_REGION.to_string(),
        // Legacy alias still returned for old buckets
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}
