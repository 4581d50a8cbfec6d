//! Debug trace of renaming decisions.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use crate::episode::{EpisodeMatch, RenameOutcome, RenamePlan, TitleIndex};

/// Default debug log file name, created in the root folder.
pub const DEBUG_LOG_FILE_NAME: &str = "debug.log";

/// Receives every decision the renamer makes.
///
/// Writing is best effort: a failing sink never stops renaming.
pub trait DecisionLog {
    /// A folder is about to be processed with the given titles.
    fn log_folder(&mut self, folder: &Path, titles: &TitleIndex);

    /// A folder was skipped entirely.
    fn log_folder_skipped(&mut self, folder: &Path, reason: &str);

    /// Episode keys were found in a file name.
    fn log_match(&mut self, file_name: &str, found: &EpisodeMatch);

    /// A new name was computed for a file.
    fn log_plan(&mut self, plan: &RenamePlan);

    /// Final result for one file.
    fn log_outcome(&mut self, file_name: &str, outcome: &RenameOutcome);
}

/// Discards all decisions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLog;

/// Plain text decision log with timestamps.
pub struct DebugLog<W: Write> {
    writer: W,
}

impl DecisionLog for NoopLog {
    fn log_folder(&mut self, _folder: &Path, _titles: &TitleIndex) {}

    fn log_folder_skipped(&mut self, _folder: &Path, _reason: &str) {}

    fn log_match(&mut self, _file_name: &str, _found: &EpisodeMatch) {}

    fn log_plan(&mut self, _plan: &RenamePlan) {}

    fn log_outcome(&mut self, _file_name: &str, _outcome: &RenameOutcome) {}
}

impl DebugLog<BufWriter<File>> {
    /// Open a debug log file, truncating any previous content.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to create debug log: {}", path.display()))?;

        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> DebugLog<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the log and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl<W: Write> DecisionLog for DebugLog<W> {
    fn log_folder(&mut self, folder: &Path, titles: &TitleIndex) {
        let _ = writeln!(
            self.writer,
            "[{}] FOLDER \"{}\" ({} titles)",
            Self::timestamp(),
            folder.display(),
            titles.len()
        );
        for (key, title) in titles.iter() {
            let _ = writeln!(self.writer, "  {key}: {title}");
        }
        let _ = self.writer.flush();
    }

    fn log_folder_skipped(&mut self, folder: &Path, reason: &str) {
        let _ = writeln!(
            self.writer,
            "[{}] SKIP FOLDER \"{}\" | {reason}",
            Self::timestamp(),
            folder.display()
        );
        let _ = self.writer.flush();
    }

    fn log_match(&mut self, file_name: &str, found: &EpisodeMatch) {
        let keys: Vec<String> = found.keys().iter().map(ToString::to_string).collect();
        let _ = writeln!(self.writer, "[{}] MATCH \"{file_name}\"", Self::timestamp());
        let _ = writeln!(self.writer, "  key: {}", found.token());
        let _ = writeln!(self.writer, "  episodes: {}", keys.join(", "));
    }

    fn log_plan(&mut self, plan: &RenamePlan) {
        let _ = writeln!(self.writer, "  new name: {}", plan.new_name);
        if let Some(dir) = &plan.target_dir {
            let _ = writeln!(self.writer, "  target folder: {}", dir.display());
        }
    }

    fn log_outcome(&mut self, file_name: &str, outcome: &RenameOutcome) {
        let _ = writeln!(
            self.writer,
            "[{}] {} \"{file_name}\" | {outcome}",
            Self::timestamp(),
            outcome.label()
        );
        let _ = self.writer.flush();
    }
}
