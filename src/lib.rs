//! Mirror zip archives stored in S3 into an unpacked sibling bucket.
//!
//! Every `*.zip` object of a source bucket is streamed through a local
//! staging directory and its files are uploaded to `<bucket>.unzipped`
//! under the archive's folder.

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod publish;
pub mod s3;
pub mod staging;
pub mod telemetry;
pub mod unzipper;

pub use error::{ExtractionError, UnzipError};
pub use pipeline::{Pipeline, PipelineState, RunReport};
pub use unzipper::Unzipper;
