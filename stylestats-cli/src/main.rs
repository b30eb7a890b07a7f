#![doc = include_str!("../README.md")]

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use stylestats::{Options, StyleStats};

mod format;

use format::Format;

#[derive(Parser, Debug)]
#[command(name = "stylestats")]
#[command(about = "Compute structural statistics for CSS, LESS and Stylus stylesheets")]
struct Args {
    /// Files, directories, glob patterns, URLs or CSS text to analyze
    #[arg(required = true)]
    inputs: Vec<String>,

    /// JSON configuration file selecting metrics and request options
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Print raw numbers instead of human-readable sizes and percentages
    #[arg(long, short = 'n')]
    number: bool,

    /// User-Agent header for HTTP requests
    #[arg(long, short = 'u')]
    user_agent: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();
    tracing::debug!(?args, "Starting stylestats");

    let mut options = match &args.config {
        Some(path) => Options::from_file(path)
            .wrap_err_with(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Options::default(),
    };
    if let Some(user_agent) = args.user_agent {
        options.request_options.user_agent = Some(user_agent);
    }

    let stats = StyleStats::new(&args.inputs, options);
    let record = stats
        .parse()
        .await
        .wrap_err("Failed to analyze stylesheets")?;

    println!("{}", format::render(&record, args.format, args.number)?);

    Ok(())
}
