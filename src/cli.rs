//! CLI argument parsing using clap.

use clap::{Args, Parser};
use std::env;
use std::path::PathBuf;

use crate::config::{
    ClientConfig, DEFAULT_ARCHIVE_SUFFIX, DEFAULT_DESTINATION_SUFFIX, DEFAULT_MAX_ATTEMPTS,
    FailurePolicy, PipelineOptions, StaticCredentials, UnzipConfig,
};

/// Connection options shared by both binaries
#[derive(Args, Debug, Clone)]
pub struct S3Options {
    /// Region used until the source bucket's own region is known
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Custom S3 endpoint (LocalStack, MinIO, ...)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Use path-style addressing
    #[arg(long)]
    pub force_path_style: bool,

    /// Attempts per request, including the first
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,
}

impl S3Options {
    pub fn client_config(&self, credentials: Option<StaticCredentials>) -> ClientConfig {
        ClientConfig {
            endpoint_url: self.endpoint_url.clone(),
            force_path_style: self.force_path_style,
            region: self.region.clone(),
            credentials,
            max_attempts: self.max_attempts,
        }
    }
}

/// Unzip every archive of a bucket into `<BUCKET>.unzipped`
#[derive(Parser, Debug)]
#[command(name = "s3unzip")]
#[command(version, about, long_about = None)]
pub struct UnzipArgs {
    /// AWS access key id
    #[arg(value_name = "ACCESS_KEY")]
    pub access_key: String,

    /// AWS secret access key
    #[arg(value_name = "SECRET_KEY")]
    pub secret_key: String,

    /// Source bucket holding the archives
    #[arg(value_name = "BUCKET")]
    pub bucket: String,

    #[command(flatten)]
    pub s3: S3Options,

    /// Directory in which the staging directory is created (default: system temp dir)
    #[arg(long)]
    pub staging_root: Option<PathBuf>,

    /// Key suffix selecting archives (case-sensitive)
    #[arg(long, default_value = DEFAULT_ARCHIVE_SUFFIX)]
    pub suffix: String,

    /// Appended to the source bucket name to form the destination bucket
    #[arg(long, default_value = DEFAULT_DESTINATION_SUFFIX)]
    pub destination_suffix: String,

    /// Stop at the first archive that fails instead of skipping it
    #[arg(long)]
    pub fail_fast: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl UnzipArgs {
    pub fn client_config(&self) -> ClientConfig {
        self.s3.client_config(Some(StaticCredentials {
            access_key_id: self.access_key.clone(),
            secret_access_key: self.secret_key.clone(),
        }))
    }

    pub fn unzip_config(&self) -> UnzipConfig {
        let failure_policy = if self.fail_fast {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        };

        UnzipConfig {
            destination_suffix: self.destination_suffix.clone(),
            staging_root: self.staging_root.clone().unwrap_or_else(env::temp_dir),
            pipeline: PipelineOptions {
                archive_suffix: self.suffix.clone(),
                failure_policy,
            },
        }
    }
}

/// List the archive keys of a bucket without processing them
#[derive(Parser, Debug)]
#[command(name = "list-archives")]
#[command(version, about, long_about = None)]
pub struct ListArgs {
    /// Bucket to list, optionally followed by a key prefix
    #[arg(value_name = "BUCKET[/PREFIX]")]
    pub location: String,

    /// File receiving one key per line (default: stdout)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub s3: S3Options,

    /// Key suffix selecting archives (case-sensitive)
    #[arg(long, default_value = DEFAULT_ARCHIVE_SUFFIX)]
    pub suffix: String,
}

impl ListArgs {
    /// Split `bucket/prefix` into its bucket and optional prefix
    pub fn bucket_and_prefix(&self) -> (&str, Option<&str>) {
        let location = self.location.trim_start_matches("s3://");
        match location.split_once('/') {
            Some((bucket, prefix)) if !prefix.is_empty() => (bucket, Some(prefix)),
            Some((bucket, _)) => (bucket, None),
            None => (location, None),
        }
    }
}
