use anyhow::Context;
use clap::Parser;
use colored::*;
use futures::TryStreamExt;
use s3unzip::archive::Lister;
use s3unzip::cli::ListArgs;
use s3unzip::s3::S3Client;
use s3unzip::telemetry;
use std::io::{BufWriter, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = ListArgs::parse();
    telemetry::init_tracing("warn")?;

    let (bucket, prefix) = args.bucket_and_prefix();
    let client = S3Client::new(args.s3.client_config(None)).await;
    let lister = Lister::new(Arc::new(client), args.suffix.clone());

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let mut keys = lister.archive_keys(bucket, prefix);
    let mut count = 0usize;
    while let Some(key) = keys
        .try_next()
        .await
        .with_context(|| format!("failed to list s3://{bucket}"))?
    {
        writeln!(out, "{key}")?;
        count += 1;
    }
    out.flush()?;

    if let Some(path) = &args.output {
        eprintln!(
            "{} {} archive(s) written to {}",
            "Done:".green().bold(),
            count,
            path.display()
        );
    }
    Ok(())
}
