//! Runs against LocalStack.
//!
//! Start LocalStack on localhost:4566 (or set AWS_ENDPOINT_URL), then:
//! cargo test --test integration_s3 -- --ignored --test-threads=1

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use s3unzip::archive::Lister;
use s3unzip::config::{
    ClientConfig, FailurePolicy, PipelineOptions, StaticCredentials, UnzipConfig,
};
use s3unzip::s3::{ObjectStore, S3Client};
use s3unzip::{UnzipError, Unzipper};

const DEFAULT_ENDPOINT: &str = "http://localhost:4566";

fn endpoint_url() -> String {
    std::env::var("AWS_ENDPOINT_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string())
}

/// Bucket name unique to one test run
fn test_bucket(name: &str) -> String {
    format!("s3unzip-{name}-{}", chrono::Utc::now().timestamp_millis())
}

/// Raw SDK client used to seed and inspect buckets
async fn create_localstack_client() -> Client {
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region("us-east-1")
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&config)
        .endpoint_url(endpoint_url())
        .force_path_style(true) // Required for LocalStack
        .build();

    Client::from_conf(s3_config)
}

async fn create_store() -> Arc<S3Client> {
    let config = ClientConfig {
        endpoint_url: Some(endpoint_url()),
        force_path_style: true,
        region: Some("us-east-1".to_string()),
        credentials: Some(StaticCredentials {
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
        }),
        max_attempts: 2,
    };
    Arc::new(S3Client::new(config).await)
}

fn zip_of(files: &[(&str, &[u8])]) -> Bytes {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    Bytes::from(writer.finish().unwrap().into_inner())
}

async fn put(client: &Client, bucket: &str, key: &str, data: Bytes) {
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(data.into())
        .send()
        .await
        .unwrap_or_else(|e| panic!("Failed to upload {key}: {e}"));
}

async fn keys_of(client: &Client, bucket: &str) -> Vec<String> {
    let resp = client
        .list_objects_v2()
        .bucket(bucket)
        .send()
        .await
        .expect("Failed to list bucket");
    let mut keys: Vec<String> = resp
        .contents()
        .iter()
        .filter_map(|o| o.key().map(str::to_string))
        .collect();
    keys.sort();
    keys
}

/// Create a source bucket holding two archives and an unrelated file
async fn setup_source_bucket(client: &Client, bucket: &str) {
    let resp = client.list_buckets().send().await;
    assert!(
        resp.is_ok(),
        "Failed to connect to Localstack S3. Is it running on localhost:4566?"
    );

    client
        .create_bucket()
        .bucket(bucket)
        .send()
        .await
        .expect("Failed to create test bucket");

    let archive = zip_of(&[("x.csv", b"1,2,3")]);
    put(client, bucket, "in/a.zip", archive).await;
    let notes = Bytes::from_static(b"plain");
    put(client, bucket, "in/notes.txt", notes).await;
    put(
        client,
        bucket,
        "deep/er/b.zip",
        zip_of(&[("nested/y.csv", b"4,5"), ("z.txt", b"z")]),
    )
    .await;
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored --test-threads=1
async fn test_unzip_bucket() {
    let client = create_localstack_client().await;
    let bucket = test_bucket("unzip");
    setup_source_bucket(&client, &bucket).await;

    let staging_root = tempfile::tempdir().unwrap();
    let config = UnzipConfig {
        staging_root: staging_root.path().to_path_buf(),
        pipeline: PipelineOptions {
            failure_policy: FailurePolicy::Abort,
            ..PipelineOptions::default()
        },
        ..UnzipConfig::default()
    };

    let unzipper = Unzipper::new(create_store().await, config);
    let report = unzipper.run(&bucket).await.expect("run failed");

    assert!(report.is_success());
    assert_eq!(report.archives_found, 2);
    assert_eq!(report.objects_uploaded, 3);

    let destination = format!("{bucket}.unzipped");
    assert_eq!(
        keys_of(&client, &destination).await,
        vec!["deep/er/y.csv", "deep/er/z.txt", "in/x.csv"]
    );
    assert_eq!(std::fs::read_dir(staging_root.path()).unwrap().count(), 0);

    // A second run reuses the destination bucket it already owns
    let report = unzipper.run(&bucket).await.expect("second run failed");
    assert_eq!(report.objects_uploaded, 3);
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored --test-threads=1
async fn test_missing_bucket() {
    let staging_root = tempfile::tempdir().unwrap();
    let config = UnzipConfig {
        staging_root: staging_root.path().to_path_buf(),
        ..UnzipConfig::default()
    };

    let unzipper = Unzipper::new(create_store().await, config);
    let result = unzipper.run(&test_bucket("missing")).await;

    assert!(matches!(result, Err(UnzipError::ContainerLookup { .. })));
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored --test-threads=1
async fn test_list_archives() {
    let client = create_localstack_client().await;
    let bucket = test_bucket("list");
    setup_source_bucket(&client, &bucket).await;

    let store = create_store().await;
    let region = store.bucket_location(&bucket).await.unwrap();
    assert_eq!(region, "us-east-1");

    let lister = Lister::new(store, ".zip");
    let keys = lister.collect_archive_keys(&bucket, None).await.unwrap();
    assert_eq!(keys, vec!["deep/er/b.zip", "in/a.zip"]);

    let keys = lister
        .collect_archive_keys(&bucket, Some("in/"))
        .await
        .unwrap();
    assert_eq!(keys, vec!["in/a.zip"]);
}
