//! Optipress command line client
//!
//! Sends one image to an Optipress server and writes the optimized JPEG
//! next to it. The client validates the file locally first, so nothing is
//! uploaded when the type or size is already known to be rejected.

mod client;
mod progress;
mod source;

use anyhow::{bail, Context, Result};
use clap::Parser;
use optipress_domain::{
    optimization::Quality,
    uploader::{format_file_size, Uploader},
};
use std::{
    io::{BufRead, Write},
    path::PathBuf,
    time::Instant,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{client::OptimizeClient, progress::Spinner, source::Source};

#[derive(Parser, Debug)]
#[command(name = "optipress", author, version, about, long_about = None)]
struct Args {
    /// Image to optimize (JPEG, PNG or WebP), or `-` to read standard input
    input: String,

    /// JPEG quality between 10 and 100
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(10..=100))]
    quality: Option<u8>,

    /// Base URL of the Optipress server
    #[arg(short, long, env = "OPTIPRESS_SERVER", default_value = "http://localhost:3000")]
    server: String,

    /// Where to write the result (default: `<name>_optimized.<ext>` in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Retry this many times when the server is unreachable or fails
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn confirm(prompt: &str) -> Result<bool> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{} [y/N] ", prompt)?;
    stderr.flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// What a completed run produced
#[derive(Debug)]
struct Report {
    output: PathBuf,
    original_size: usize,
    optimized_size: usize,
    reduction_percent: i64,
}

/// Validate, confirm, upload and write the result
///
/// Returns `None` when the user declines the confirmation. Nothing is sent
/// to the server until the file has passed local validation.
async fn run<C>(args: &Args, confirm: C) -> Result<Option<Report>>
where
    C: FnOnce(&str) -> Result<bool>,
{
    let source = Source::parse(&args.input);
    if source.is_stdin() && !args.yes {
        bail!("Reading the image from standard input requires --yes");
    }

    let mut uploader = Uploader::default();
    if let Some(quality) = args.quality {
        uploader.set_quality(Quality::new(i64::from(quality))?);
    }

    let file = source.load().await?;
    let preview = uploader.select(file, Instant::now())?;
    eprintln!(
        "{} ({}, {})",
        preview.file().name(),
        preview.display_size(),
        preview.format().label()
    );

    if !args.yes && !confirm(&format!("Optimize at quality {}?", uploader.quality()))? {
        return Ok(None);
    }

    let client = OptimizeClient::new(&args.server);
    info!(url = client.upload_url(), "Uploading image");

    let mut attempts_left = args.retries;
    loop {
        let submission = uploader.submit(Instant::now())?;

        let spinner = Spinner::start("Optimizing");
        let outcome = client.optimize(&submission).await;
        spinner.stop();

        match outcome {
            Ok(data) => {
                uploader.complete(data, Instant::now())?;
                break;
            }
            Err(err) => {
                let retry = err.is_retryable() && attempts_left > 0;
                uploader.fail(err.to_string(), Instant::now())?;
                if !retry {
                    let message = uploader
                        .notice()
                        .map(|notice| notice.message().to_string())
                        .unwrap_or_else(|| err.to_string());
                    bail!(message);
                }
                attempts_left -= 1;
                warn!(error = %err, attempts_left, "Upload failed, retrying");
            }
        }
    }

    uploader.tick(Instant::now());
    let result = uploader
        .result()
        .with_context(|| format!("Unexpected uploader state: {}", uploader.state().name()))?;
    let data = result
        .data()
        .context("The optimized image is no longer available")?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(result.download_name()));
    tokio::fs::write(&output, data)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(Some(Report {
        output,
        original_size: result.original_size(),
        optimized_size: result.optimized_size(),
        reduction_percent: result.reduction_percent(),
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let Some(report) = run(&args, confirm).await? else {
        eprintln!("Cancelled");
        return Ok(());
    };

    println!(
        "{} -> {} ({} -> {}, {}% smaller)",
        args.input,
        report.output.display(),
        format_file_size(report.original_size as u64),
        format_file_size(report.optimized_size as u64),
        report.reduction_percent
    );

    Ok(())
}
