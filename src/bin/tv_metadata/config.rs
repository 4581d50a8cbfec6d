use anyhow::Result;
use serde::Deserialize;

use crate::TvMetadataArgs;
use crate::tvdb::TVDB_API_URL;

/// Config from the user config file
#[derive(Debug, Default, Deserialize)]
struct TvMetadataConfig {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    overwrite: bool,
    #[serde(default)]
    pin: Option<String>,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the user config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    tv_metadata: TvMetadataConfig,
}

/// Final config combined from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    pub(crate) api_key: String,
    pub(crate) api_url: String,
    pub(crate) dryrun: bool,
    pub(crate) overwrite: bool,
    pub(crate) pin: Option<String>,
    pub(crate) verbose: bool,
}

impl TvMetadataConfig {
    /// Read the `[tv_metadata]` section from the user config file if it exists.
    fn get_user_config() -> Result<Self> {
        media_tools::config::read_user_config(Self::from_toml_str)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        media_tools::config::parse_section(toml_str, |config: UserConfig| config.tv_metadata)
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    pub fn from_args(args: &TvMetadataArgs) -> Result<Self> {
        let user_config = TvMetadataConfig::get_user_config()?;
        Self::combine(args, user_config)
    }

    fn combine(args: &TvMetadataArgs, user_config: TvMetadataConfig) -> Result<Self> {
        let Some(api_key) = args
            .api_key
            .clone()
            .or(user_config.api_key)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
        else {
            anyhow::bail!("TVDB API key missing. Give it with --api-key or set api_key in the [tv_metadata] config section");
        };

        Ok(Self {
            api_key,
            api_url: user_config.api_url.unwrap_or_else(|| TVDB_API_URL.to_string()),
            dryrun: args.print || user_config.dryrun,
            overwrite: args.force || user_config.overwrite,
            pin: args.pin.clone().or(user_config.pin).filter(|pin| !pin.trim().is_empty()),
            verbose: args.verbose || user_config.verbose,
        })
    }
}

#[cfg(test)]
mod tv_metadata_config_tests {
    use super::*;

    use clap::Parser;

    fn default_args() -> TvMetadataArgs {
        TvMetadataArgs::parse_from(["tvmeta", "--series", "81189"])
    }

    #[test]
    fn from_toml_str_parses_empty_config() {
        let config = TvMetadataConfig::from_toml_str("").expect("should parse empty config");
        assert!(config.api_key.is_none());
        assert!(config.api_url.is_none());
        assert!(!config.dryrun);
    }

    #[test]
    fn from_toml_str_parses_tv_metadata_section() {
        let toml = r#"
[tv_metadata]
api_key = "secret"
pin = "1234"
overwrite = true
"#;
        let config = TvMetadataConfig::from_toml_str(toml).expect("should parse config");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.pin.as_deref(), Some("1234"));
        assert!(config.overwrite);
    }

    #[test]
    fn combine_requires_api_key() {
        assert!(Config::combine(&default_args(), TvMetadataConfig::default()).is_err());

        let user_config = TvMetadataConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(Config::combine(&default_args(), user_config).is_err());
    }

    #[test]
    fn combine_api_key_from_config() {
        let user_config = TvMetadataConfig {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        let config = Config::combine(&default_args(), user_config).unwrap();
        assert_eq!(config.api_key, "from-config");
        assert_eq!(config.api_url, TVDB_API_URL);
    }

    #[test]
    fn combine_cli_overrides_config() {
        let args = TvMetadataArgs::parse_from(["tvmeta", "--series", "1", "--api-key", "from-cli", "-p"]);
        let user_config = TvMetadataConfig {
            api_key: Some("from-config".to_string()),
            overwrite: true,
            ..Default::default()
        };
        let config = Config::combine(&args, user_config).unwrap();
        assert_eq!(config.api_key, "from-cli");
        assert!(config.dryrun);
        assert!(config.overwrite);
    }
}
