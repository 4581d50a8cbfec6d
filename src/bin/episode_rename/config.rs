use std::path::PathBuf;

use anyhow::Result;
use itertools::Itertools;
use serde::Deserialize;

use media_tools::episode::{DEFAULT_EXTENSIONS, MatchMode, RenameOptions};

use crate::EpisodeRenameArgs;

/// Config from the user config file
#[derive(Debug, Default, Deserialize)]
struct EpisodeRenameConfig {
    #[serde(default)]
    debug: bool,
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    log_file: Option<PathBuf>,
    #[serde(default)]
    match_mode: Option<MatchMode>,
    #[serde(default)]
    move_to_season: bool,
    #[serde(default)]
    overwrite: bool,
    #[serde(default)]
    seasons: bool,
    #[serde(default)]
    single_episode_only: bool,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the user config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    episode_rename: EpisodeRenameConfig,
}

/// Final config combined from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    pub(crate) debug: bool,
    pub(crate) log_file: Option<PathBuf>,
    pub(crate) options: RenameOptions,
}

impl EpisodeRenameConfig {
    /// Read the `[episode_rename]` section from the user config file if it exists.
    fn get_user_config() -> Result<Self> {
        media_tools::config::read_user_config(Self::from_toml_str)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        media_tools::config::parse_section(toml_str, |config: UserConfig| config.episode_rename)
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    pub fn from_args(args: &EpisodeRenameArgs) -> Result<Self> {
        let user_config = EpisodeRenameConfig::get_user_config()?;
        Ok(Self::combine(args, user_config))
    }

    fn combine(args: &EpisodeRenameArgs, user_config: EpisodeRenameConfig) -> Self {
        let extensions: Vec<String> = if args.extension.is_empty() {
            user_config.extensions
        } else {
            args.extension.clone()
        }
        .into_iter()
        .map(|ext| ext.trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unique()
        .collect();

        let extensions = if extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect()
        } else {
            extensions
        };

        let options = RenameOptions {
            allow_multi_episode: !(args.single || user_config.single_episode_only),
            dryrun: args.print || user_config.dryrun,
            extensions,
            match_mode: args.mode.or(user_config.match_mode).unwrap_or_default(),
            move_to_season: args.move_to_season || user_config.move_to_season,
            overwrite: args.force || user_config.overwrite,
            seasons: args.seasons || user_config.seasons,
            verbose: args.verbose || user_config.verbose,
        };

        Self {
            debug: args.debug || user_config.debug,
            log_file: args.log.clone().or(user_config.log_file),
            options,
        }
    }
}

#[cfg(test)]
mod episode_rename_config_tests {
    use super::*;

    use clap::Parser;

    fn default_args() -> EpisodeRenameArgs {
        EpisodeRenameArgs::parse_from(["epname"])
    }

    #[test]
    fn from_toml_str_parses_empty_config() {
        let config = EpisodeRenameConfig::from_toml_str("").expect("should parse empty config");
        assert!(!config.debug);
        assert!(!config.dryrun);
        assert!(config.extensions.is_empty());
        assert!(config.match_mode.is_none());
        assert!(!config.single_episode_only);
    }

    #[test]
    fn from_toml_str_parses_episode_rename_section() {
        let toml = r#"
[episode_rename]
debug = true
extensions = ["mp4", "m4v"]
log_file = "/tmp/episodes.log"
match_mode = "title"
move_to_season = true
overwrite = true
seasons = true
single_episode_only = true
"#;
        let config = EpisodeRenameConfig::from_toml_str(toml).expect("should parse config");
        assert!(config.debug);
        assert_eq!(config.extensions, vec!["mp4", "m4v"]);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/episodes.log")));
        assert_eq!(config.match_mode, Some(MatchMode::Title));
        assert!(config.move_to_season);
        assert!(config.overwrite);
        assert!(config.seasons);
        assert!(config.single_episode_only);
    }

    #[test]
    fn from_toml_str_rejects_unknown_match_mode() {
        let toml = r#"
[episode_rename]
match_mode = "random"
"#;
        assert!(EpisodeRenameConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn from_toml_str_ignores_other_sections() {
        let toml = r"
[subtitle_merge]
overwrite = true
";
        let config = EpisodeRenameConfig::from_toml_str(toml).expect("should parse config");
        assert!(!config.overwrite);
    }

    #[test]
    fn combine_uses_defaults() {
        let config = Config::combine(&default_args(), EpisodeRenameConfig::default());
        assert!(!config.debug);
        assert!(config.log_file.is_none());
        assert!(config.options.allow_multi_episode);
        assert_eq!(config.options.extensions, vec!["mp4", "mkv"]);
        assert_eq!(config.options.match_mode, MatchMode::Key);
        assert!(!config.options.dryrun);
    }

    #[test]
    fn combine_cli_flags_override_config() {
        let args = EpisodeRenameArgs::parse_from(["epname", "-p", "--single", "--mode", "title", "-e", ".MP4"]);
        let user_config = EpisodeRenameConfig {
            extensions: vec!["mkv".to_string()],
            match_mode: Some(MatchMode::Key),
            ..Default::default()
        };
        let config = Config::combine(&args, user_config);
        assert!(config.options.dryrun);
        assert!(!config.options.allow_multi_episode);
        assert_eq!(config.options.match_mode, MatchMode::Title);
        assert_eq!(config.options.extensions, vec!["mp4"]);
    }

    #[test]
    fn combine_bool_flags_are_combined() {
        let user_config = EpisodeRenameConfig {
            overwrite: true,
            seasons: true,
            ..Default::default()
        };
        let args = EpisodeRenameArgs::parse_from(["epname", "--move"]);
        let config = Config::combine(&args, user_config);
        assert!(config.options.overwrite);
        assert!(config.options.seasons);
        assert!(config.options.move_to_season);
    }

    #[test]
    fn combine_log_file_from_cli_wins() {
        let args = EpisodeRenameArgs::parse_from(["epname", "--log", "cli.log"]);
        let user_config = EpisodeRenameConfig {
            log_file: Some(PathBuf::from("config.log")),
            ..Default::default()
        };
        let config = Config::combine(&args, user_config);
        assert_eq!(config.log_file, Some(PathBuf::from("cli.log")));
    }
}
