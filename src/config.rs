use std::path::PathBuf;

/// Key suffix that marks an object as an archive
pub const DEFAULT_ARCHIVE_SUFFIX: &str = ".zip";

/// Suffix appended to the source bucket name to form the destination bucket
pub const DEFAULT_DESTINATION_SUFFIX: &str = ".unzipped";

/// Default number of attempts for each storage request (including the first)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Static access key pair supplied on the command line
#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// Configuration for creating an S3 client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Optional custom endpoint URL (LocalStack, MinIO, ...)
    pub endpoint_url: Option<String>,
    /// Whether to use path-style addressing (required for some S3-compatible services)
    pub force_path_style: bool,
    /// Optional region override; falls back to the environment, then us-east-1
    pub region: Option<String>,
    /// Explicit credentials; `None` uses the default AWS credential chain
    pub credentials: Option<StaticCredentials>,
    /// Maximum attempts per request for the SDK's standard retry strategy
    pub max_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            force_path_style: false,
            region: None,
            credentials: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// What the orchestrator does when one archive fails to extract or upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the whole run on the first failed archive
    Abort,
    /// Record the failure and move on to the next archive
    #[default]
    Continue,
}

/// Options for the per-archive pipeline
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Case-sensitive key suffix selecting archives
    pub archive_suffix: String,
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            archive_suffix: DEFAULT_ARCHIVE_SUFFIX.to_string(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Options for a whole run against one source bucket
#[derive(Debug, Clone)]
pub struct UnzipConfig {
    /// Appended to the source bucket name to name the destination bucket
    pub destination_suffix: String,
    /// Directory under which the run's staging directory is created
    pub staging_root: PathBuf,
    pub pipeline: PipelineOptions,
}

impl Default for UnzipConfig {
    fn default() -> Self {
        Self {
            destination_suffix: DEFAULT_DESTINATION_SUFFIX.to_string(),
            staging_root: std::env::temp_dir(),
            pipeline: PipelineOptions::default(),
        }
    }
}

impl UnzipConfig {
    /// Name of the bucket receiving the unpacked files
    pub fn destination_bucket(&self, source_bucket: &str) -> String {
        format!("{source_bucket}{}", self.destination_suffix)
    }
}
