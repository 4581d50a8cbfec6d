//! Episode keys and extracting them from file names.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Multi-episode range at the start of a name, for example `s01e01-e03`.
static RE_MULTI_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^s(?P<season>[0-9]+)e(?P<episode>[0-9]+)(?P<rest>(?:-e[0-9]+)+)")
        .expect("Failed to create regex pattern for multi-episode key")
});

/// Single episode key at the start of a name, for example `s01e01`.
static RE_SINGLE_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^s(?P<season>[0-9]+)e(?P<episode>[0-9]+)")
        .expect("Failed to create regex pattern for single episode key")
});

/// One `-e<digits>` segment of a multi-episode range.
static RE_RANGE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-e(?P<episode>[0-9]+)").expect("Failed to create regex pattern for range segment"));

/// A whole-string episode key, for example `S01E02`.
static RE_EXACT_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^s(?P<season>[0-9]+)e(?P<episode>[0-9]+)$").expect("Failed to create regex pattern for episode key")
});

/// Canonical `s<season>e<episode>` identifier for one episode.
///
/// The season and episode digits are kept as written,
/// so `s1e2` and `s01e02` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpisodeKey {
    season: String,
    episode: String,
}

/// Episode key(s) found at the start of a file name.
///
/// Only created by [`KeyExtractor`], which always stores at least one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMatch {
    token: String,
    keys: Vec<EpisodeKey>,
}

/// Finds episode keys from file names.
#[derive(Debug, Clone, Copy)]
pub struct KeyExtractor {
    allow_multi_episode: bool,
}

impl EpisodeKey {
    /// Create a key from season and episode digit strings.
    #[must_use]
    pub fn new(season: impl Into<String>, episode: impl Into<String>) -> Self {
        Self {
            season: season.into(),
            episode: episode.into(),
        }
    }

    /// Parse a complete key like `S01E02`, ignoring case.
    ///
    /// ```rust
    /// use media_tools::episode::EpisodeKey;
    ///
    /// let key = EpisodeKey::parse("S01E02").unwrap();
    /// assert_eq!(key.to_string(), "s01e02");
    /// assert!(EpisodeKey::parse("s01e02 Title").is_none());
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        RE_EXACT_KEY
            .captures(text.trim())
            .map(|captures| Self::new(&captures["season"], &captures["episode"]))
    }

    /// Season digits as written.
    #[must_use]
    pub fn season(&self) -> &str {
        &self.season
    }

    /// Episode digits as written.
    #[must_use]
    pub fn episode(&self) -> &str {
        &self.episode
    }

    /// Season as a number, `None` if it does not fit in `u32`.
    #[must_use]
    pub fn season_number(&self) -> Option<u32> {
        self.season.parse().ok()
    }

    /// Episode as a number, `None` if it does not fit in `u32`.
    #[must_use]
    pub fn episode_number(&self) -> Option<u32> {
        self.episode.parse().ok()
    }

    /// Name of the season folder this episode belongs in, like `Season 01`.
    #[must_use]
    pub fn season_folder_name(&self) -> String {
        self.season_number()
            .map_or_else(|| format!("Season {}", self.season), |number| format!("Season {number:02}"))
    }
}

impl EpisodeMatch {
    fn new(token: &str, first: EpisodeKey, rest: impl IntoIterator<Item = EpisodeKey>) -> Self {
        Self {
            token: token.to_string(),
            keys: std::iter::once(first).chain(rest).collect(),
        }
    }

    /// The matched part of the file name exactly as written.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Ordered keys covered by the file, never empty.
    #[must_use]
    pub fn keys(&self) -> &[EpisodeKey] {
        &self.keys
    }

    /// True if the file covers more than one episode.
    #[must_use]
    pub const fn is_multi_episode(&self) -> bool {
        self.keys.len() > 1
    }

    /// First key of the match.
    #[must_use]
    pub fn first_key(&self) -> &EpisodeKey {
        &self.keys[0]
    }
}

impl KeyExtractor {
    #[must_use]
    pub const fn new(allow_multi_episode: bool) -> Self {
        Self { allow_multi_episode }
    }

    /// Extract the episode key or key range from the start of a file name.
    ///
    /// The multi-episode form is tried first since a range also starts with a single key.
    /// Each `-e<digits>` segment of a range inherits the season of the first key.
    ///
    /// ```rust
    /// use media_tools::episode::KeyExtractor;
    ///
    /// let found = KeyExtractor::new(true).extract("S01E01-E03 extra.mp4").unwrap();
    /// assert_eq!(found.token(), "S01E01-E03");
    /// let keys: Vec<String> = found.keys().iter().map(ToString::to_string).collect();
    /// assert_eq!(keys, ["s01e01", "s01e02", "s01e03"]);
    /// ```
    #[must_use]
    pub fn extract(&self, file_name: &str) -> Option<EpisodeMatch> {
        if self.allow_multi_episode
            && let Some(found) = Self::extract_multi_episode(file_name)
        {
            return Some(found);
        }
        Self::extract_single_episode(file_name)
    }

    fn extract_multi_episode(file_name: &str) -> Option<EpisodeMatch> {
        let captures = RE_MULTI_EPISODE.captures(file_name)?;
        let season = &captures["season"];
        let first = EpisodeKey::new(season, &captures["episode"]);
        let rest = RE_RANGE_SEGMENT
            .captures_iter(&captures["rest"])
            .map(|segment| EpisodeKey::new(season, &segment["episode"]));

        Some(EpisodeMatch::new(&captures[0], first, rest))
    }

    fn extract_single_episode(file_name: &str) -> Option<EpisodeMatch> {
        let captures = RE_SINGLE_EPISODE.captures(file_name)?;
        let key = EpisodeKey::new(&captures["season"], &captures["episode"]);
        Some(EpisodeMatch::new(&captures[0], key, []))
    }
}

impl Default for KeyExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}e{}", self.season, self.episode)
    }
}

impl fmt::Display for EpisodeMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.keys.iter().map(ToString::to_string).collect();
        write!(f, "{} [{}]", self.token, keys.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_strings(found: &EpisodeMatch) -> Vec<String> {
        found.keys().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parse_key_lowercases_and_keeps_digits() {
        let key = EpisodeKey::parse("S1E002").unwrap();
        assert_eq!(key.to_string(), "s1e002");
        assert_eq!(key.season(), "1");
        assert_eq!(key.episode(), "002");
        assert_eq!(key.episode_number(), Some(2));
    }

    #[test]
    fn parse_key_rejects_partial_and_range() {
        assert!(EpisodeKey::parse("s01").is_none());
        assert!(EpisodeKey::parse("s01e01-e02").is_none());
        assert!(EpisodeKey::parse("episode 1").is_none());
    }

    #[test]
    fn season_folder_name_is_zero_padded() {
        assert_eq!(EpisodeKey::new("1", "01").season_folder_name(), "Season 01");
        assert_eq!(EpisodeKey::new("01", "01").season_folder_name(), "Season 01");
        assert_eq!(EpisodeKey::new("12", "01").season_folder_name(), "Season 12");
        assert_eq!(EpisodeKey::new("101", "01").season_folder_name(), "Season 101");
    }

    #[test]
    fn extract_single_episode() {
        let found = KeyExtractor::new(true).extract("s01e05 Some Title.mp4").unwrap();
        assert_eq!(found.token(), "s01e05");
        assert_eq!(key_strings(&found), vec!["s01e05"]);
        assert!(!found.is_multi_episode());
    }

    #[test]
    fn extract_multi_episode_range() {
        let found = KeyExtractor::new(true).extract("s01e01-e03 extra.mp4").unwrap();
        assert_eq!(found.token(), "s01e01-e03");
        assert_eq!(key_strings(&found), vec!["s01e01", "s01e02", "s01e03"]);
        assert!(found.is_multi_episode());
    }

    #[test]
    fn extract_multi_episode_with_several_segments() {
        let found = KeyExtractor::new(true).extract("s02e07-e08-e09.mkv").unwrap();
        assert_eq!(found.token(), "s02e07-e08-e09");
        assert_eq!(key_strings(&found), vec!["s02e07", "s02e08", "s02e09"]);
    }

    #[test]
    fn extract_multi_episode_ignores_case_and_keeps_token() {
        let found = KeyExtractor::new(true).extract("S03E10-E11 Finale.mp4").unwrap();
        assert_eq!(found.token(), "S03E10-E11");
        assert_eq!(key_strings(&found), vec!["s03e10", "s03e11"]);
    }

    #[test]
    fn first_key_is_start_of_range() {
        let found = KeyExtractor::default().extract("s04e02-e03 x.mp4").unwrap();
        assert_eq!(found.first_key(), &EpisodeKey::new("04", "02"));
        assert_eq!(found.first_key(), &found.keys()[0]);
    }

    #[test]
    fn extract_without_multi_episode_support_uses_first_key() {
        let found = KeyExtractor::new(false).extract("s01e01-e02 Double.mp4").unwrap();
        assert_eq!(found.token(), "s01e01");
        assert_eq!(key_strings(&found), vec!["s01e01"]);
    }

    #[test]
    fn extract_requires_key_at_start() {
        let extractor = KeyExtractor::default();
        assert!(extractor.extract("Show s01e01.mp4").is_none());
        assert!(extractor.extract("01 something.mp4").is_none());
        assert!(extractor.extract("episode-names.txt").is_none());
    }

    #[test]
    fn dangling_range_separator_is_single_episode() {
        let found = KeyExtractor::default().extract("s01e04- Title.mp4").unwrap();
        assert_eq!(found.token(), "s01e04");
        assert_eq!(key_strings(&found), vec!["s01e04"]);
    }
}
