mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;

use media_tools::episode::{DEBUG_LOG_FILE_NAME, DebugLog, DecisionLog, EpisodeRenamer, MatchMode, NoopLog};

use crate::config::Config;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Rename TV episode files to '<key> <title>' using an episode-names.txt title list"
)]
pub(crate) struct EpisodeRenameArgs {
    /// Optional show or season folder. Defaults to the current directory
    #[arg(value_hint = clap::ValueHint::DirPath)]
    path: Option<PathBuf>,

    /// Root contains season folders, each with their own title list
    #[arg(short = 's', long)]
    seasons: bool,

    /// Move renamed files into "Season NN" folders under the root
    #[arg(short = 'm', long = "move")]
    move_to_season: bool,

    /// Only match single episode keys, ignore ranges like s01e01-e02
    #[arg(short = 'n', long)]
    single: bool,

    /// Match files by episode key or by title
    #[arg(short = 'M', long, value_enum, value_name = "MODE")]
    mode: Option<MatchMode>,

    /// Media file extensions to process
    #[arg(short = 'e', long, num_args = 1, action = clap::ArgAction::Append, value_name = "EXTENSION")]
    extension: Vec<String>,

    /// Write a debug log of all decisions to "debug.log" in the root folder
    #[arg(short = 'D', long)]
    debug: bool,

    /// Write the debug log to the given file
    #[arg(short = 'o', long, value_name = "LOG_FILE", value_hint = clap::ValueHint::FilePath)]
    log: Option<PathBuf>,

    /// Overwrite existing files
    #[arg(short = 'f', long)]
    force: bool,

    /// Only print changes without renaming files
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
    let args = EpisodeRenameArgs::parse();
    if let Some(ref shell) = args.completion {
        media_tools::generate_shell_completion(*shell, EpisodeRenameArgs::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        run(&args)
    }
}

fn run(args: &EpisodeRenameArgs) -> Result<()> {
    let root = media_tools::resolve_input_directory(args.path.as_deref())?;
    let config = Config::from_args(args)?;
    if config.options.verbose {
        println!("{}", format!("Renaming episodes in: {}", root.display()).bold());
        println!("{}", config.options);
    }

    let log_path = config
        .log_file
        .clone()
        .or_else(|| config.debug.then(|| root.join(DEBUG_LOG_FILE_NAME)));

    let log: Box<dyn DecisionLog> = match &log_path {
        Some(path) => Box::new(DebugLog::create(path)?),
        None => Box::new(NoopLog),
    };

    let dryrun = config.options.dryrun;
    let stats = EpisodeRenamer::new(root, config.options, log).run()?;
    stats.print_summary(dryrun);

    if let Some(path) = log_path {
        println!("Debug log: {}", path.display());
    }

    Ok(())
}
