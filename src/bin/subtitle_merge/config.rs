use anyhow::Result;
use itertools::Itertools;
use serde::Deserialize;

use crate::SubtitleMergeArgs;

/// Audio languages kept when no list is configured.
const DEFAULT_KEEP_LANGUAGES: &[&str] = &["eng", "und"];

/// Config from the user config file
#[derive(Debug, Default, Deserialize)]
struct SubtitleMergeConfig {
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    keep_languages: Vec<String>,
    #[serde(default)]
    movies: bool,
    #[serde(default)]
    overwrite: bool,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the user config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    subtitle_merge: SubtitleMergeConfig,
}

/// Final config combined from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    pub(crate) dryrun: bool,
    pub(crate) keep_languages: Vec<String>,
    pub(crate) movies: bool,
    pub(crate) overwrite: bool,
    pub(crate) verbose: bool,
}

impl SubtitleMergeConfig {
    /// Read the `[subtitle_merge]` section from the user config file if it exists.
    fn get_user_config() -> Result<Self> {
        media_tools::config::read_user_config(Self::from_toml_str)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        media_tools::config::parse_section(toml_str, |config: UserConfig| config.subtitle_merge)
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    pub fn from_args(args: &SubtitleMergeArgs) -> Result<Self> {
        let user_config = SubtitleMergeConfig::get_user_config()?;
        Ok(Self::combine(args, user_config))
    }

    fn combine(args: &SubtitleMergeArgs, user_config: SubtitleMergeConfig) -> Self {
        let keep_languages: Vec<String> = if user_config.keep_languages.is_empty() {
            DEFAULT_KEEP_LANGUAGES.iter().map(ToString::to_string).collect()
        } else {
            user_config
                .keep_languages
                .iter()
                .map(|language| language.trim().to_lowercase())
                .unique()
                .collect()
        };

        Self {
            dryrun: args.print || user_config.dryrun,
            keep_languages,
            movies: args.movies || user_config.movies,
            overwrite: args.force || user_config.overwrite,
            verbose: args.verbose || user_config.verbose,
        }
    }
}
