use clap::Parser;
use colored::*;
use s3unzip::cli::UnzipArgs;
use s3unzip::s3::S3Client;
use s3unzip::{RunReport, Unzipper, telemetry};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let args = UnzipArgs::parse();

    let level = if args.verbose { "debug" } else { "info" };
    if let Err(e) = telemetry::init_tracing(level) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    let client = S3Client::new(args.client_config()).await;
    let unzipper = Unzipper::new(Arc::new(client), args.unzip_config());

    match unzipper.run(&args.bucket).await {
        Ok(report) => {
            print_summary(&report);
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn print_summary(report: &RunReport) {
    println!(
        "{} s3://{} -> s3://{}",
        "Done:".green().bold(),
        report.source_bucket,
        report.destination_bucket
    );
    println!(
        "  {} archive(s) found, {} unzipped, {} file(s) uploaded ({}) in {:.1}s",
        report.archives_found,
        report.archives_processed,
        report.objects_uploaded,
        humansize::format_size(report.bytes_uploaded, humansize::BINARY),
        report.elapsed.as_secs_f64()
    );

    for failure in &report.failures {
        eprintln!(
            "  {} {}: {}",
            "Skipped:".yellow().bold(),
            failure.key,
            failure.error
        );
    }
}
