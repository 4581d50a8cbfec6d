//! Episode matching and renaming.
//!
//! Reads an `episode-names.txt` title list, finds the episode key or key range
//! at the start of each media file name, and renames the file to
//! `<key> <title>.<ext>`, optionally moving it into a `Season NN` folder.

mod key;
mod log;
mod rename;
mod titles;

pub use key::{EpisodeKey, EpisodeMatch, KeyExtractor};
pub use log::{DEBUG_LOG_FILE_NAME, DebugLog, DecisionLog, NoopLog};
pub use rename::{
    DEFAULT_EXTENSIONS, EpisodeRenamer, MatchMode, Planner, RenameOptions, RenameOutcome, RenamePlan, RunStats,
    SkipReason, season_folders,
};
pub use titles::{TITLE_LIST_FILE_NAME, TitleIndex};
