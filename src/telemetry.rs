//! Tracing initialization for the binaries.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` applies to this
/// crate and `warn` to everything else, so the AWS SDK stays quiet.
///
/// ```bash
/// RUST_LOG=s3unzip=debug s3unzip AKID SECRET my-bucket
/// ```
pub fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let fallback = format!("warn,s3unzip={default_level}");
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}"))?;

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}
