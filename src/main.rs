use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use page_loader::error::exit_code;
use page_loader::{Error, PageLoader, PageLoaderCommand, Settings, SpinnerProgress};

const LOG_ENV: &str = "PAGE_LOADER_LOG";

#[tokio::main]
async fn main() {
    let args = PageLoaderCommand::parse();
    init_logging(args.verbose);

    let started = Instant::now();
    match run(&args).await {
        Ok(path) => {
            println!("✅ Page was downloaded as '{}'", path.display().to_string().green());
            println!("⏱️  Elapsed time: {:.2} seconds", started.elapsed().as_secs_f64());
            process::exit(exit_code::SUCCESS);
        }
        Err(err) => {
            eprintln!("❌ {}", format!("{:#}", err).red());
            process::exit(exit_code_for(&err));
        }
    }
}

async fn run(args: &PageLoaderCommand) -> Result<PathBuf> {
    info!("requested url: {}", args.url);
    info!("output path: {:?}", args.output);

    let mut settings = match &args.settings {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    if let Some(timeout) = args.timeout {
        settings.timeout_secs = timeout;
    }

    let mut loader = PageLoader::new(settings).context("Failed to build HTTP client")?;
    if !args.no_progress {
        loader = loader.with_observer(Box::new(SpinnerProgress::new()));
    }

    let saved = loader.download(&args.url, args.output.as_deref()).await?;
    Ok(saved)
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "page_loader=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Unclassified failures exit with `SOFTWARE`.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>()
        .map(Error::exit_code)
        .unwrap_or(exit_code::SOFTWARE)
}
