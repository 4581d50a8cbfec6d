//! Matching episode files to titles and renaming them.

use std::path::{Path, PathBuf};
use std::{fmt, fs};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Deserialize;

use crate::episode::{DecisionLog, EpisodeKey, KeyExtractor, NoopLog, TitleIndex};
use crate::{print_error, print_warning};

/// Media file extensions renamed by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp4", "mkv"];

/// Joins titles of a multi-episode file.
const TITLE_SEPARATOR: &str = " & ";

/// Replaces path separators inside titles.
const SEPARATOR_REPLACEMENT: &str = "-";

/// How the new name is found for a file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Episode key from the file name is looked up to get the title.
    #[default]
    Key,
    /// Title from the file name is looked up to get the correct episode key.
    Title,
}

/// Options for one renaming run.
#[derive(Debug, Clone)]
pub struct RenameOptions {
    /// Accept key ranges like `s01e01-e03`.
    pub allow_multi_episode: bool,
    /// Only print changes without renaming.
    pub dryrun: bool,
    /// Media file extensions to process, without the dot.
    pub extensions: Vec<String>,
    pub match_mode: MatchMode,
    /// Move renamed files into `Season NN` folders under the root.
    pub move_to_season: bool,
    /// Replace an existing file at the destination.
    pub overwrite: bool,
    /// Root contains season folders, each with their own title list.
    pub seasons: bool,
    pub verbose: bool,
}

/// New name and optional new folder for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub source: PathBuf,
    pub new_name: String,
    /// Folder to move the file into. `None` keeps the current folder.
    pub target_dir: Option<PathBuf>,
}

/// Reasons why a file was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// File name does not start with an episode key
    NoEpisodeKey,
    /// File name has no title after the episode key
    NoTitleInName,
    /// One or more episode keys are missing from the title list
    TitleNotFound { keys: Vec<EpisodeKey> },
    /// Title from the file name is missing from the title list
    UnknownTitle { title: String },
    /// Title list maps the title to something that is not an episode key
    InvalidKey { key: String },
    /// Another file already has the new name
    DestinationExists { path: PathBuf },
}

/// Result of processing a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// File was renamed or moved
    Renamed { from: PathBuf, to: PathBuf },
    /// File would be renamed but dryrun is enabled
    Planned { from: PathBuf, to: PathBuf },
    /// File already has the correct name and location
    Unchanged,
    /// File was skipped
    Skipped(SkipReason),
    /// Rename failed
    Failed { error: String },
}

/// Counts of file results for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub renamed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub folders_skipped: usize,
}

/// Computes rename plans for the files of one folder.
#[derive(Debug)]
pub struct Planner<'a> {
    titles: &'a TitleIndex,
    extractor: KeyExtractor,
    match_mode: MatchMode,
    season_root: Option<&'a Path>,
}

/// Renames episode files under a show or season folder.
pub struct EpisodeRenamer {
    root: PathBuf,
    options: RenameOptions,
    log: Box<dyn DecisionLog>,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            allow_multi_episode: true,
            dryrun: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            match_mode: MatchMode::Key,
            move_to_season: false,
            overwrite: false,
            seasons: false,
            verbose: false,
        }
    }
}

impl RenamePlan {
    /// Full path the file ends up at.
    #[must_use]
    pub fn destination(&self) -> PathBuf {
        let dir = self
            .target_dir
            .as_deref()
            .or_else(|| self.source.parent())
            .unwrap_or_else(|| Path::new(""));
        dir.join(&self.new_name)
    }
}

impl RenameOutcome {
    /// Short uppercase label used in the debug log.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Renamed { .. } => "RENAME",
            Self::Planned { .. } => "DRYRUN",
            Self::Unchanged => "UNCHANGED",
            Self::Skipped(_) => "SKIP",
            Self::Failed { .. } => "ERROR",
        }
    }
}

impl RunStats {
    pub const fn add(&mut self, outcome: &RenameOutcome) {
        match outcome {
            RenameOutcome::Renamed { .. } | RenameOutcome::Planned { .. } => self.renamed += 1,
            RenameOutcome::Unchanged => self.unchanged += 1,
            RenameOutcome::Skipped(_) => self.skipped += 1,
            RenameOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Print a summary of the run.
    pub fn print_summary(&self, dryrun: bool) {
        let files = if self.renamed == 1 { "file" } else { "files" };
        if dryrun {
            println!("Dryrun: would have renamed {} {files}", self.renamed);
        } else {
            println!("{}", format!("Renamed {} {files}", self.renamed).green());
        }
        if self.unchanged > 0 {
            println!("Already named: {}", self.unchanged);
        }
        if self.skipped > 0 {
            println!("{}", format!("Skipped: {}", self.skipped).yellow());
        }
        if self.failed > 0 {
            println!("{}", format!("Failed: {}", self.failed).red());
        }
        if self.folders_skipped > 0 {
            println!("{}", format!("Folders skipped: {}", self.folders_skipped).yellow());
        }
    }
}

impl<'a> Planner<'a> {
    /// Create a planner for one folder.
    ///
    /// When `season_root` is given, plans move files into `Season NN` folders under it.
    #[must_use]
    pub const fn new(titles: &'a TitleIndex, options: &RenameOptions, season_root: Option<&'a Path>) -> Self {
        Self {
            titles,
            extractor: KeyExtractor::new(options.allow_multi_episode),
            match_mode: options.match_mode,
            season_root,
        }
    }

    /// Compute the new name for a file.
    ///
    /// # Errors
    /// Returns the reason when the file cannot be fully resolved.
    pub fn plan(&self, path: &Path, log: &mut dyn DecisionLog) -> Result<RenamePlan, SkipReason> {
        let file_name = crate::path_to_filename_string(path);
        match self.match_mode {
            MatchMode::Key => self.plan_by_key(path, &file_name, log),
            MatchMode::Title => self.plan_by_title(path, &file_name, log),
        }
    }

    fn plan_by_key(&self, path: &Path, file_name: &str, log: &mut dyn DecisionLog) -> Result<RenamePlan, SkipReason> {
        let found = self.extractor.extract(file_name).ok_or(SkipReason::NoEpisodeKey)?;
        log.log_match(file_name, &found);

        let titles = self
            .titles
            .resolve_all(found.keys())
            .map_err(|keys| SkipReason::TitleNotFound { keys })?;

        Ok(RenamePlan {
            source: path.to_path_buf(),
            new_name: Self::format_file_name(found.token(), &titles.join(TITLE_SEPARATOR), path),
            target_dir: self.target_dir(found.first_key()),
        })
    }

    fn plan_by_title(&self, path: &Path, file_name: &str, log: &mut dyn DecisionLog) -> Result<RenamePlan, SkipReason> {
        let stem = crate::normalize_nfc(&crate::path_to_file_stem_string(path));
        let title = stem
            .split_once(' ')
            .map(|(_, title)| title.trim())
            .filter(|title| !title.is_empty())
            .ok_or(SkipReason::NoTitleInName)?;

        let key = self
            .titles
            .key_for_title(title)
            .ok_or_else(|| SkipReason::UnknownTitle {
                title: title.to_string(),
            })?;

        let corrected = KeyExtractor::default()
            .extract(key)
            .filter(|found| found.token().len() == key.len())
            .ok_or_else(|| SkipReason::InvalidKey { key: key.to_string() })?;
        log.log_match(file_name, &corrected);

        Ok(RenamePlan {
            source: path.to_path_buf(),
            new_name: Self::format_file_name(key, title, path),
            target_dir: self.target_dir(corrected.first_key()),
        })
    }

    fn target_dir(&self, key: &EpisodeKey) -> Option<PathBuf> {
        self.season_root.map(|root| root.join(key.season_folder_name()))
    }

    /// Build `<key> <title>.<ext>` keeping the original extension as is.
    ///
    /// Path separators in the title are replaced so the result stays a single file name.
    fn format_file_name(key: &str, title: &str, original: &Path) -> String {
        let title = title.replace(['/', '\\'], SEPARATOR_REPLACEMENT);
        let extension = crate::os_str_to_string(original.extension().unwrap_or_default());
        if extension.is_empty() {
            format!("{key} {title}")
        } else {
            format!("{key} {title}.{extension}")
        }
    }
}

impl EpisodeRenamer {
    #[must_use]
    pub fn new(root: PathBuf, options: RenameOptions, log: Box<dyn DecisionLog>) -> Self {
        Self { root, options, log }
    }

    /// Create a renamer that does not keep a debug log.
    #[must_use]
    pub fn without_log(root: PathBuf, options: RenameOptions) -> Self {
        Self::new(root, options, Box::new(NoopLog))
    }

    /// Rename all matching files under the root.
    ///
    /// Failures for single files or season folders are reported and counted,
    /// they do not stop the run.
    ///
    /// # Errors
    /// Returns an error if the root is not a directory or cannot be listed.
    pub fn run(&mut self) -> Result<RunStats> {
        if !self.root.is_dir() {
            anyhow::bail!("Show folder is not a directory: {}", self.root.display());
        }

        let mut stats = RunStats::default();
        if self.options.seasons {
            let folders = season_folders(&self.root)?;
            if folders.is_empty() {
                print_warning!("No season folders found in: {}", self.root.display());
            }
            for folder in folders {
                self.rename_folder(&folder, &mut stats);
            }
        } else {
            let root = self.root.clone();
            self.rename_folder(&root, &mut stats);
        }

        Ok(stats)
    }

    /// Rename the media files of one folder using its own title list.
    pub fn rename_folder(&mut self, folder: &Path, stats: &mut RunStats) {
        let folder_name = crate::get_relative_path_or_filename(folder, &self.root);
        let titles = match TitleIndex::from_directory(folder) {
            Ok(titles) => titles,
            Err(error) => {
                print_warning!("Skipping folder {folder_name}: {error}");
                self.log.log_folder_skipped(folder, &error.to_string());
                stats.folders_skipped += 1;
                return;
            }
        };
        self.log.log_folder(folder, &titles);

        let files = match crate::sorted_files_with_extensions(folder, &self.options.extensions) {
            Ok(files) => files,
            Err(error) => {
                print_error!("Skipping folder {folder_name}: {error}");
                self.log.log_folder_skipped(folder, &error.to_string());
                stats.folders_skipped += 1;
                return;
            }
        };

        if self.options.verbose {
            println!(
                "{}",
                format!("{folder_name}: {} titles, {} files", titles.len(), files.len()).magenta()
            );
        }

        let season_root = self.options.move_to_season.then_some(self.root.as_path());
        let planner = Planner::new(&titles, &self.options, season_root);

        for file in files {
            let file_name = crate::path_to_filename_string(&file);
            let outcome = match planner.plan(&file, self.log.as_mut()) {
                Ok(plan) => {
                    self.log.log_plan(&plan);
                    apply_plan(&plan, &self.options)
                }
                Err(reason) => RenameOutcome::Skipped(reason),
            };
            report_outcome(&file_name, &outcome, &self.root, self.options.verbose);
            self.log.log_outcome(&file_name, &outcome);
            stats.add(&outcome);
        }
    }
}

/// List the season folders of a show root in name order.
///
/// A season folder is any sub-folder whose name starts with "season", ignoring case.
///
/// # Errors
/// Returns an error if the root cannot be listed.
pub fn season_folders(root: &Path) -> Result<Vec<PathBuf>> {
    Ok(crate::sorted_sub_directories(root)?
        .into_iter()
        .filter(|dir| {
            crate::path_to_filename_string(dir)
                .to_lowercase()
                .starts_with("season")
        })
        .collect())
}

/// Apply one plan to the file system.
fn apply_plan(plan: &RenamePlan, options: &RenameOptions) -> RenameOutcome {
    let destination = plan.destination();
    if destination == plan.source {
        return RenameOutcome::Unchanged;
    }

    // Only capitalization changes: the destination "exists" on case-insensitive file systems.
    let capitalization_change_only = destination.parent() == plan.source.parent()
        && crate::path_to_string(&destination).to_lowercase() == crate::path_to_string(&plan.source).to_lowercase();

    let destination_is_source = capitalization_change_only && is_same_file(&plan.source, &destination);
    if destination.exists() && !destination_is_source && !options.overwrite {
        return RenameOutcome::Skipped(SkipReason::DestinationExists { path: destination });
    }

    if options.dryrun {
        return RenameOutcome::Planned {
            from: plan.source.clone(),
            to: destination,
        };
    }

    match move_file(plan, &destination, capitalization_change_only) {
        Ok(()) => RenameOutcome::Renamed {
            from: plan.source.clone(),
            to: destination,
        },
        Err(error) => RenameOutcome::Failed {
            error: format!("{error:#}"),
        },
    }
}

fn move_file(plan: &RenamePlan, destination: &Path, capitalization_change_only: bool) -> Result<()> {
    if let Some(dir) = &plan.target_dir {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create folder: {}", dir.display()))?;
    }
    if capitalization_change_only {
        rename_with_temp_file(&plan.source, destination)
    } else {
        fs::rename(&plan.source, destination)
    }
    .with_context(|| format!("Failed to rename to {}", destination.display()))
}

/// Rename a file with an intermediate temp file to work around case-insensitive file systems.
fn rename_with_temp_file(path: &Path, new_path: &Path) -> std::io::Result<()> {
    let temp_file = unused_temp_path(new_path);
    fs::rename(path, &temp_file)?;
    fs::rename(&temp_file, new_path)
}

/// First of `<name>.tmp`, `<name>.1.tmp`, `<name>.2.tmp`... that does not exist.
fn unused_temp_path(path: &Path) -> PathBuf {
    let mut temp_file = crate::append_extension_to_path(path.to_path_buf(), "tmp");
    let mut index: usize = 1;
    while temp_file.exists() {
        temp_file = crate::append_extension_to_path(path.to_path_buf(), format!("{index}.tmp"));
        index += 1;
    }
    temp_file
}

/// True if both paths point to the same existing file.
#[cfg(unix)]
fn is_same_file(path: &Path, other: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(path), fs::metadata(other)) {
        (Ok(path), Ok(other)) => path.dev() == other.dev() && path.ino() == other.ino(),
        _ => false,
    }
}

/// True if both paths point to the same existing file.
#[cfg(not(unix))]
fn is_same_file(path: &Path, other: &Path) -> bool {
    match (dunce::canonicalize(path), dunce::canonicalize(other)) {
        (Ok(path), Ok(other)) => path == other,
        _ => false,
    }
}

fn report_outcome(file_name: &str, outcome: &RenameOutcome, root: &Path, verbose: bool) {
    match outcome {
        RenameOutcome::Renamed { from, to } => {
            println!("{}", "Renamed:".bold().green());
            crate::show_diff(
                &crate::get_relative_path_or_filename(from, root),
                &crate::get_relative_path_or_filename(to, root),
            );
        }
        RenameOutcome::Planned { from, to } => {
            println!("{}", "Dryrun:".bold().cyan());
            crate::show_diff(
                &crate::get_relative_path_or_filename(from, root),
                &crate::get_relative_path_or_filename(to, root),
            );
        }
        RenameOutcome::Unchanged => {
            if verbose {
                println!("Already named: {file_name}");
            }
        }
        RenameOutcome::Skipped(reason) => print_warning!("Skipped {file_name}: {reason}"),
        RenameOutcome::Failed { error } => print_error!("Failed to rename {file_name}: {error}"),
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEpisodeKey => write!(f, "No episode key in file name"),
            Self::NoTitleInName => write!(f, "No episode title in file name"),
            Self::TitleNotFound { keys } => {
                let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
                write!(f, "Title not found for one or more episodes: {}", keys.join(", "))
            }
            Self::UnknownTitle { title } => write!(f, "Title not found in title list: {title}"),
            Self::InvalidKey { key } => write!(f, "Invalid episode key in title list: {key}"),
            Self::DestinationExists { path } => write!(f, "Destination already exists: {}", path.display()),
        }
    }
}

impl fmt::Display for RenameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Renamed { from, to } | Self::Planned { from, to } => {
                write!(f, "{} -> {}", from.display(), to.display())
            }
            Self::Unchanged => write!(f, "Already named"),
            Self::Skipped(reason) => write!(f, "{reason}"),
            Self::Failed { error } => write!(f, "{error}"),
        }
    }
}

impl fmt::Display for RenameOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  allow_multi_episode: {}", self.allow_multi_episode)?;
        writeln!(f, "  dryrun: {}", self.dryrun)?;
        writeln!(f, "  extensions: {:?}", self.extensions)?;
        writeln!(f, "  match_mode: {:?}", self.match_mode)?;
        writeln!(f, "  move_to_season: {}", self.move_to_season)?;
        writeln!(f, "  overwrite: {}", self.overwrite)?;
        writeln!(f, "  seasons: {}", self.seasons)?;
        write!(f, "  verbose: {}", self.verbose)
    }
}
