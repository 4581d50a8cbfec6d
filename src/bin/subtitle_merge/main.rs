mod config;
mod ffmpeg;
mod merge;
mod probe;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::merge::SubtitleMerger;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Mux .srt subtitles into mp4 files using ffmpeg"
)]
pub(crate) struct SubtitleMergeArgs {
    /// Optional show or movie library folder. Defaults to the current directory
    #[arg(value_hint = clap::ValueHint::DirPath)]
    path: Option<PathBuf>,

    /// Treat sub-folders as movies instead of seasons
    #[arg(short = 'm', long)]
    movies: bool,

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

fn main() -> Result<()> {
    let args = SubtitleMergeArgs::parse();
    if let Some(ref shell) = args.completion {
        media_tools::generate_shell_completion(*shell, SubtitleMergeArgs::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        SubtitleMerger::new(&args)?.run()
    }
}
