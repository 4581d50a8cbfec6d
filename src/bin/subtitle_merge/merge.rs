use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use colored::Colorize;

use media_tools::{print_error, print_warning};

use crate::SubtitleMergeArgs;
use crate::config::Config;
use crate::{ffmpeg, probe};

/// Suffix of merged files, excluded when looking for videos.
const OUTPUT_SUFFIX: &str = ".output.mp4";

/// Muxes subtitle files into the videos of each sub-folder.
pub struct SubtitleMerger {
    config: Config,
    root: PathBuf,
}

/// One video and the subtitle files to mux into it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MergeJob {
    video: PathBuf,
    subtitles: Vec<PathBuf>,
    kind: MergeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeKind {
    /// One subtitle file with the same name as the video
    Episode,
    /// All subtitle files in the folder
    Movie,
}

/// Result of processing a single video.
#[derive(Debug)]
enum MergeResult {
    Merged { output: PathBuf },
    Planned { output: PathBuf },
    Skipped(SkipReason),
    Failed { error: String },
}

/// Reasons why a video was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SkipReason {
    /// No matching subtitle file next to the video
    NoSubtitle,
    /// Output file already exists
    OutputExists { path: PathBuf },
}

#[derive(Debug, Default)]
struct RunStats {
    merged: usize,
    skipped: usize,
    failed: usize,
}

impl SubtitleMerger {
    /// Create a new merger from command line arguments.
    pub fn new(args: &SubtitleMergeArgs) -> Result<Self> {
        Self::check_dependencies()?;
        let root = media_tools::resolve_input_directory(args.path.as_deref())?;
        let config = Config::from_args(args)?;
        Ok(Self { config, root })
    }

    /// Process all sub-folders of the root.
    pub fn run(&self) -> Result<()> {
        let folders = media_tools::sorted_sub_directories(&self.root)?;
        if folders.is_empty() {
            print_warning!("No sub-folders found in: {}", self.root.display());
            return Ok(());
        }

        let abort_flag = Arc::new(AtomicBool::new(false));
        let abort_flag_handler = Arc::clone(&abort_flag);
        ctrlc::set_handler(move || {
            if abort_flag_handler.load(Ordering::SeqCst) {
                // Second Ctrl+C
                std::process::exit(130);
            }
            println!("\n{}", "Received Ctrl+C, finishing current file...".yellow().bold());
            abort_flag_handler.store(true, Ordering::SeqCst);
        })
        .context("Failed to set Ctrl+C handler")?;

        let mut stats = RunStats::default();
        let aborted = self.process_folders(&folders, &abort_flag, &mut stats);
        if aborted {
            println!("\n{}", "Aborted by user".bold().red());
        }

        stats.print_summary(self.config.dryrun);
        Ok(())
    }

    /// Returns true if the run was aborted.
    fn process_folders(&self, folders: &[PathBuf], abort_flag: &AtomicBool, stats: &mut RunStats) -> bool {
        for folder in folders {
            println!(
                "{}",
                format!("Processing: {}", media_tools::get_relative_path_or_filename(folder, &self.root))
                    .magenta()
                    .bold()
            );

            let jobs = if self.config.movies {
                movie_jobs(folder)
            } else {
                episode_jobs(folder)
            };
            let jobs = match jobs {
                Ok(jobs) => jobs,
                Err(error) => {
                    print_error!("{error}");
                    stats.failed += 1;
                    continue;
                }
            };
            if jobs.is_empty() {
                print_warning!("No videos to process");
                continue;
            }

            for job in jobs {
                if abort_flag.load(Ordering::SeqCst) {
                    return true;
                }
                let name = media_tools::path_to_filename_string(&job.video);
                let result = self.merge(&job);
                match &result {
                    MergeResult::Merged { output } => {
                        println!("{} {}", "✓ Merged:".green(), media_tools::path_to_filename_string(output));
                    }
                    MergeResult::Planned { output } => {
                        if self.config.verbose {
                            println!("Would write: {}", media_tools::path_to_filename_string(output));
                        }
                    }
                    MergeResult::Skipped(reason) => print_warning!("Skipped {name}: {reason}"),
                    MergeResult::Failed { error } => print_error!("Failed to merge {name}: {error}"),
                }
                stats.add(&result);
            }
        }
        false
    }

    /// Mux the subtitles of one job.
    fn merge(&self, job: &MergeJob) -> MergeResult {
        let Some(first_subtitle) = job.subtitles.first() else {
            return MergeResult::Skipped(SkipReason::NoSubtitle);
        };

        let output = ffmpeg::output_path(&job.video);
        if output.exists() && !self.config.overwrite {
            return MergeResult::Skipped(SkipReason::OutputExists { path: output });
        }

        let streams = match probe::probe_audio_streams(&job.video) {
            Ok(streams) => streams,
            Err(error) => {
                return MergeResult::Failed {
                    error: format!("{error:#}"),
                };
            }
        };
        if streams.is_empty() {
            print_warning!("No audio tracks in {}", media_tools::path_to_filename_string(&job.video));
        }
        let audio_args = ffmpeg::audio_track_args(&streams, &self.config.keep_languages);

        let mut command = match job.kind {
            MergeKind::Episode => ffmpeg::episode_command(&job.video, first_subtitle, &audio_args, &output),
            MergeKind::Movie => ffmpeg::movie_command(&job.video, &job.subtitles, &audio_args, &output),
        };

        if self.config.dryrun {
            println!("[DRYRUN] {command:#?}");
            return MergeResult::Planned { output };
        }
        if self.config.verbose {
            println!("{command:#?}");
        }

        match Self::run_command(&mut command) {
            Ok(()) => MergeResult::Merged { output },
            Err(error) => MergeResult::Failed {
                error: format!("{error:#}"),
            },
        }
    }

    fn run_command(command: &mut Command) -> Result<()> {
        let output = command.output().context("Failed to execute ffmpeg")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg failed: {}", stderr.trim());
        }
        Ok(())
    }

    /// Check that ffmpeg and ffprobe are available.
    fn check_dependencies() -> Result<()> {
        if Command::new("ffprobe").arg("-version").output().is_err() {
            anyhow::bail!("ffprobe not found. Install ffmpeg first and make sure it is in PATH");
        }
        if Command::new("ffmpeg").arg("-version").output().is_err() {
            anyhow::bail!("ffmpeg not found. Install ffmpeg first and make sure it is in PATH");
        }
        Ok(())
    }
}

/// Sorted mp4 files of a folder, without previous merge outputs.
fn video_files(folder: &Path) -> Result<Vec<PathBuf>> {
    Ok(media_tools::sorted_files_with_extensions(folder, &["mp4".to_string()])?
        .into_iter()
        .filter(|path| {
            !media_tools::path_to_filename_string(path)
                .to_lowercase()
                .ends_with(OUTPUT_SUFFIX)
        })
        .collect())
}

/// One job per video, paired with `<stem>.srt` if it exists.
fn episode_jobs(folder: &Path) -> Result<Vec<MergeJob>> {
    Ok(video_files(folder)?
        .into_iter()
        .map(|video| {
            let subtitle = video.with_extension("srt");
            let subtitles = if subtitle.is_file() { vec![subtitle] } else { Vec::new() };
            MergeJob {
                video,
                subtitles,
                kind: MergeKind::Episode,
            }
        })
        .collect())
}

/// First video of the folder with all subtitle files.
fn movie_jobs(folder: &Path) -> Result<Vec<MergeJob>> {
    let Some(video) = video_files(folder)?.into_iter().next() else {
        return Ok(Vec::new());
    };
    let subtitles = media_tools::sorted_files_with_extensions(folder, &["srt".to_string()])?;
    Ok(vec![MergeJob {
        video,
        subtitles,
        kind: MergeKind::Movie,
    }])
}

impl RunStats {
    const fn add(&mut self, result: &MergeResult) {
        match result {
            MergeResult::Merged { .. } | MergeResult::Planned { .. } => self.merged += 1,
            MergeResult::Skipped(_) => self.skipped += 1,
            MergeResult::Failed { .. } => self.failed += 1,
        }
    }

    fn print_summary(&self, dryrun: bool) {
        let verb = if dryrun { "Would merge" } else { "Merged" };
        println!(
            "{}: {}, skipped: {}, failed: {}",
            verb.bold(),
            self.merged.to_string().green(),
            self.skipped.to_string().yellow(),
            self.failed.to_string().red()
        );
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSubtitle => write!(f, "Subtitle file not found"),
            Self::OutputExists { path } => write!(f, "Output already exists: {}", path.display()),
        }
    }
}
