//! Episode title list parsing.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::episode::EpisodeKey;

/// Name of the title list file expected in each episode folder.
pub const TITLE_LIST_FILE_NAME: &str = "episode-names.txt";

/// Key token, first run of whitespace, rest of the line.
static RE_TITLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<key>\S+)\s+(?P<title>.+)$").expect("Failed to create regex pattern for title line"));

/// Lookup table from episode key to episode title.
///
/// Keys are stored lower-case and titles as written.
/// When the same key appears more than once, the last line wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleIndex {
    titles: BTreeMap<String, String>,
    keys_by_title: BTreeMap<String, String>,
}

impl TitleIndex {
    /// Parse a title list where each line is `<key> <title>`.
    ///
    /// Lines that do not have a key followed by whitespace and a title are skipped.
    ///
    /// ```rust
    /// use media_tools::episode::TitleIndex;
    ///
    /// let index = TitleIndex::parse("S01E01   Pilot  \nnot-a-record\n");
    /// assert_eq!(index.len(), 1);
    /// assert_eq!(index.get_str("s01e01"), Some("Pilot"));
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut titles = BTreeMap::new();
        let mut keys_by_title = BTreeMap::new();
        for line in text.lines() {
            if let Some(captures) = RE_TITLE_LINE.captures(line.trim()) {
                let key = captures["key"].to_lowercase();
                let title = captures["title"].trim().to_string();
                if let Some(previous) = titles.insert(key.clone(), title.clone()) {
                    let previous = lookup_key(&previous);
                    if keys_by_title.get(&previous) == Some(&key) {
                        keys_by_title.remove(&previous);
                    }
                }
                keys_by_title.insert(lookup_key(&title), key);
            }
        }
        Self { titles, keys_by_title }
    }

    /// Read and parse a title list file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("Failed to read title list: {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    /// Read `episode-names.txt` from the given directory.
    ///
    /// # Errors
    /// Returns an error if the file is missing or cannot be read.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let path = dir.join(TITLE_LIST_FILE_NAME);
        if !path.is_file() {
            anyhow::bail!("Title list not found: {}", path.display());
        }
        Self::from_file(&path)
    }

    /// Title for the given key.
    #[must_use]
    pub fn get(&self, key: &EpisodeKey) -> Option<&str> {
        self.get_str(&key.to_string())
    }

    /// Title for a key given as text, ignoring case.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.titles.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Look up titles for all keys in order.
    ///
    /// # Errors
    /// Returns the keys that have no title if any of them is missing.
    pub fn resolve_all(&self, keys: &[EpisodeKey]) -> Result<Vec<&str>, Vec<EpisodeKey>> {
        let mut titles = Vec::with_capacity(keys.len());
        let mut missing = Vec::new();
        for key in keys {
            match self.get(key) {
                Some(title) => titles.push(title),
                None => missing.push(key.clone()),
            }
        }
        if missing.is_empty() { Ok(titles) } else { Err(missing) }
    }

    /// Find the key for a title, ignoring case.
    ///
    /// If the same title is listed under several keys, the last line wins
    /// in the same way as duplicate keys do.
    #[must_use]
    pub fn key_for_title(&self, title: &str) -> Option<&str> {
        self.keys_by_title
            .get(&lookup_key(title))
            .map(String::as_str)
    }

    /// Iterate over key and title pairs sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.titles.iter().map(|(key, title)| (key.as_str(), title.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// Case and Unicode form insensitive title for reverse lookups.
fn lookup_key(title: &str) -> String {
    crate::normalize_nfc(title.trim()).to_lowercase()
}
