use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use colored::Colorize;
use regex::Regex;

use media_tools::episode::KeyExtractor;
use media_tools::{print_error, print_warning};

use crate::config::Config;
use crate::source::{EpisodeInfo, EpisodeSource, SeasonInfo, SeriesInfo};

/// Suffix added to the stem of updated files.
const OUTPUT_SUFFIX: &str = "_updated";

/// Cover image embedded when present in a season folder.
pub const ARTWORK_FILE_NAME: &str = "artwork.jpg";

/// Season folder name like `Season 1` or `season 01`.
static RE_SEASON_FOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^season\s+(?P<number>[0-9]+)$").expect("Failed to create regex pattern for season folder")
});

/// Leading episode number like `01` in `01 Pilot.mp4`.
static RE_LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<number>[0-9]+)").expect("Failed to create regex pattern for episode number"));

/// Writes TVDB metadata into the episode files of a show.
pub struct MetadataStamper<S: EpisodeSource> {
    source: S,
    config: Config,
    root: PathBuf,
}

#[derive(Debug)]
enum StampResult {
    Updated { output: PathBuf },
    Planned,
    Skipped(SkipReason),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SkipReason {
    /// File name has no episode key or leading number
    NoEpisodeNumber,
    /// Season has no episode with the number
    EpisodeNotFound { number: u32 },
    /// Output file already exists
    OutputExists { path: PathBuf },
}

#[derive(Debug, Default)]
struct RunStats {
    updated: usize,
    skipped: usize,
    failed: usize,
}

impl<S: EpisodeSource> MetadataStamper<S> {
    pub const fn new(source: S, config: Config, root: PathBuf) -> Self {
        Self { source, config, root }
    }

    /// Process all season folders of the show.
    pub async fn run(&mut self) -> Result<()> {
        let series = self.source.series().await?;
        if self.config.verbose {
            println!("{}", format!("Series: {}", series.name).bold());
            println!("  genres: {}", series.genres);
            println!("  network: {}", series.network);
            println!("  rating: {}", series.content_rating);
        }

        let folders = season_folders(&self.root)?;
        if folders.is_empty() {
            print_warning!("No season folders found in: {}", self.root.display());
            return Ok(());
        }

        let mut stats = RunStats::default();
        for (number, folder) in folders {
            println!(
                "{}",
                format!("Processing: {}", media_tools::get_relative_path_or_filename(&folder, &self.root))
                    .magenta()
                    .bold()
            );
            let season = match self.source.season(number).await {
                Ok(Some(season)) => season,
                Ok(None) => {
                    print_warning!("Season {number} not found in aired order");
                    continue;
                }
                Err(error) => {
                    print_error!("Failed to get season {number}: {error:#}");
                    stats.failed += 1;
                    continue;
                }
            };
            self.process_season(&folder, &series, &season, &mut stats)?;
        }

        stats.print_summary(self.config.dryrun);
        Ok(())
    }

    fn process_season(
        &self,
        folder: &Path,
        series: &SeriesInfo,
        season: &SeasonInfo,
        stats: &mut RunStats,
    ) -> Result<()> {
        let artwork = Some(folder.join(ARTWORK_FILE_NAME)).filter(|path| path.is_file());
        for file in video_files(folder)? {
            let name = media_tools::path_to_filename_string(&file);
            let result = self.stamp_file(&file, series, season, artwork.as_deref());
            match &result {
                StampResult::Updated { output } => println!(
                    "{} {}",
                    "✓ Updated:".green(),
                    media_tools::path_to_filename_string(output)
                ),
                StampResult::Planned => {}
                StampResult::Skipped(reason) => print_warning!("Skipped {name}: {reason}"),
                StampResult::Failed { error } => print_error!("Failed to update {name}: {error}"),
            }
            stats.add(&result);
        }
        Ok(())
    }

    fn stamp_file(&self, file: &Path, series: &SeriesInfo, season: &SeasonInfo, artwork: Option<&Path>) -> StampResult {
        let Some(number) = episode_number(&media_tools::path_to_filename_string(file)) else {
            return StampResult::Skipped(SkipReason::NoEpisodeNumber);
        };
        let Some(episode) = season.episode(number) else {
            return StampResult::Skipped(SkipReason::EpisodeNotFound { number });
        };

        let output = output_path(file);
        if output.exists() && !self.config.overwrite {
            return StampResult::Skipped(SkipReason::OutputExists { path: output });
        }

        let tags = metadata_tags(series, season, episode);
        let mut ffmpeg = ffmpeg_command(file, &tags, &output);
        let mut atomic_parsley = artwork.map(|artwork| artwork_command(&output, artwork));

        if self.config.dryrun {
            println!("[DRYRUN] {ffmpeg:#?}");
            if let Some(command) = &atomic_parsley {
                println!("[DRYRUN] {command:#?}");
            }
            return StampResult::Planned;
        }
        if self.config.verbose {
            println!("{}", format!("s{:02}e{:02} {}", season.number, episode.number, episode.title).cyan());
        }

        let result = run_command(&mut ffmpeg, "ffmpeg").and_then(|()| match &mut atomic_parsley {
            Some(command) => run_command(command, "AtomicParsley"),
            None => Ok(()),
        });
        match result {
            Ok(()) => StampResult::Updated { output },
            Err(error) => StampResult::Failed {
                error: format!("{error:#}"),
            },
        }
    }
}

/// Season folders of the show with their season numbers, in name order.
fn season_folders(root: &Path) -> Result<Vec<(u32, PathBuf)>> {
    Ok(media_tools::sorted_sub_directories(root)?
        .into_iter()
        .filter_map(|folder| {
            let name = media_tools::path_to_filename_string(&folder);
            let number = RE_SEASON_FOLDER.captures(&name)?["number"].parse().ok()?;
            Some((number, folder))
        })
        .collect())
}

/// Sorted mp4 files without previous outputs.
fn video_files(folder: &Path) -> Result<Vec<PathBuf>> {
    Ok(media_tools::sorted_files_with_extensions(folder, &["mp4".to_string()])?
        .into_iter()
        .filter(|path| !media_tools::path_to_file_stem_string(path).ends_with(OUTPUT_SUFFIX))
        .collect())
}

/// Episode number from a file name.
///
/// Uses the episode key when the name starts with one,
/// otherwise the leading digits.
fn episode_number(file_name: &str) -> Option<u32> {
    if let Some(found) = KeyExtractor::default().extract(file_name) {
        return found.first_key().episode_number();
    }
    RE_LEADING_NUMBER
        .captures(file_name)
        .and_then(|captures| captures["number"].parse().ok())
}

fn output_path(file: &Path) -> PathBuf {
    media_tools::insert_suffix_before_extension(file, OUTPUT_SUFFIX)
}

/// Container tags for one episode in the order they are written.
fn metadata_tags(series: &SeriesInfo, season: &SeasonInfo, episode: &EpisodeInfo) -> Vec<(&'static str, String)> {
    let date = if episode.aired.is_empty() {
        season.year.clone()
    } else {
        episode.aired.clone()
    };

    vec![
        ("title", episode.title.clone()),
        ("show", series.name.clone()),
        ("season_number", season.number.to_string()),
        ("episode_sort", episode.number.to_string()),
        ("date", date),
        ("genre", series.genres.clone()),
        ("description", episode.overview.clone()),
        ("network", series.network.clone()),
        ("episode_id", episode.id.to_string()),
        ("cast", series.cast.clone()),
        ("director", series.directors.clone()),
        ("producer", series.producers.clone()),
        ("writer", series.writers.clone()),
        ("contentRating", series.content_rating.clone()),
    ]
}

fn ffmpeg_command(file: &Path, tags: &[(&str, String)], output: &Path) -> Command {
    let mut command = Command::new("ffmpeg");
    command
        .args(["-hide_banner", "-loglevel", "warning", "-nostdin", "-y"])
        .arg("-i")
        .arg(file);
    for (key, value) in tags {
        command.args(["-metadata", &format!("{key}={value}")]);
    }
    command.args(["-c", "copy"]).arg(output);
    command
}

fn artwork_command(output: &Path, artwork: &Path) -> Command {
    let mut command = Command::new("AtomicParsley");
    command.arg(output).arg("--artwork").arg(artwork).arg("--overWrite");
    command
}

fn run_command(command: &mut Command, name: &str) -> Result<()> {
    let output = command
        .output()
        .with_context(|| format!("Failed to execute {name}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{name} failed: {}", stderr.trim());
    }
    Ok(())
}

impl RunStats {
    const fn add(&mut self, result: &StampResult) {
        match result {
            StampResult::Updated { .. } | StampResult::Planned => self.updated += 1,
            StampResult::Skipped(_) => self.skipped += 1,
            StampResult::Failed { .. } => self.failed += 1,
        }
    }

    fn print_summary(&self, dryrun: bool) {
        let verb = if dryrun { "Would update" } else { "Updated" };
        println!(
            "{}: {}, skipped: {}, failed: {}",
            verb.bold(),
            self.updated.to_string().green(),
            self.skipped.to_string().yellow(),
            self.failed.to_string().red()
        );
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEpisodeNumber => write!(f, "No episode number in file name"),
            Self::EpisodeNotFound { number } => write!(f, "No metadata found for episode {number}"),
            Self::OutputExists { path } => write!(f, "Output already exists: {}", path.display()),
        }
    }
}
