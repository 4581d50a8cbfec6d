//! tvmeta - Write TheTVDB episode metadata into mp4 files.
//!
//! Looks up each episode of a show by season folder and episode number,
//! writes the tags with ffmpeg into a `<name>_updated.mp4` copy,
//! and embeds the season artwork with AtomicParsley when available.

mod config;
mod source;
mod stamp;
mod tvdb;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::config::Config;
use crate::source::TvdbSource;
use crate::stamp::MetadataStamper;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Write TheTVDB episode metadata into mp4 files using ffmpeg"
)]
pub(crate) struct TvMetadataArgs {
    /// Optional show folder with "Season N" sub-folders. Defaults to the current directory
    #[arg(value_hint = clap::ValueHint::DirPath)]
    path: Option<PathBuf>,

    /// TheTVDB series id
    #[arg(short = 's', long, value_name = "ID")]
    series: Option<u64>,

    /// TheTVDB API key
    #[arg(short = 'k', long, value_name = "KEY")]
    api_key: Option<String>,

    /// TheTVDB subscriber PIN
    #[arg(short = 'n', long, value_name = "PIN")]
    pin: Option<String>,

    /// Overwrite existing output files
    #[arg(short = 'f', long)]
    force: bool,

    /// Print commands without running them
    #[arg(short = 'p', long)]
    print: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = TvMetadataArgs::parse();
    if let Some(ref shell) = args.completion {
        media_tools::generate_shell_completion(*shell, TvMetadataArgs::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        run(&args).await
    }
}

async fn run(args: &TvMetadataArgs) -> Result<()> {
    let series_id = args.series.context("Series id missing. Give it with --series")?;
    let root = media_tools::resolve_input_directory(args.path.as_deref())?;
    let config = Config::from_args(args)?;
    check_dependencies()?;

    let source = TvdbSource::connect(&config.api_url, &config.api_key, config.pin.as_deref(), series_id).await?;
    MetadataStamper::new(source, config, root).run().await
}

/// Check that ffmpeg is available.
fn check_dependencies() -> Result<()> {
    if std::process::Command::new("ffmpeg").arg("-version").output().is_err() {
        anyhow::bail!("ffmpeg not found. Install ffmpeg first and make sure it is in PATH");
    }
    Ok(())
}
