use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context;
use serde::de::DeserializeOwned;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

/// Path to the user config file: `$HOME/.config/media-tools.toml`
///
/// Returns `None` if the home directory cannot be determined.
pub static CONFIG_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| {
    let home_dir = dirs::home_dir()?;
    Some(home_dir.join(".config").join(format!("{PROJECT_NAME}.toml")))
});

/// Get the user config file path if the home directory is known.
#[must_use]
pub fn config_path() -> Option<&'static Path> {
    CONFIG_PATH.as_deref()
}

/// Read the user config file and parse it with the given function.
///
/// A missing config file is not an error and returns the default value.
///
/// # Errors
/// Returns an error if config file exists but cannot be read or parsed.
pub fn read_user_config<T, F>(parse: F) -> anyhow::Result<T>
where
    T: Default,
    F: FnOnce(&str) -> anyhow::Result<T>,
{
    let Some(path) = config_path() else {
        return Ok(T::default());
    };

    match fs::read_to_string(path) {
        Ok(content) => parse(&content).map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(error) => Err(anyhow::anyhow!(
            "Failed to read config file {}: {error}",
            path.display()
        )),
    }
}

/// Parse one tool section from a TOML string.
///
/// `W` is the wrapper struct that holds the section as a field,
/// `section` extracts it.
///
/// # Errors
/// Returns an error if the TOML string is invalid.
pub fn parse_section<W, T>(toml_str: &str, section: impl FnOnce(W) -> T) -> anyhow::Result<T>
where
    W: DeserializeOwned,
{
    toml::from_str::<W>(toml_str)
        .map(section)
        .context("Failed to parse config TOML")
}
