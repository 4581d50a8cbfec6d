use std::collections::HashMap;

use anyhow::{Context, Result};
use itertools::Itertools;

use crate::tvdb::{EpisodeRecord, SeasonRecord, SeriesRecord, TvdbClient};

/// Country code used for the content rating.
const CONTENT_RATING_COUNTRY: &str = "usa";

/// Metadata shared by all episodes of a series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesInfo {
    pub name: String,
    pub content_rating: String,
    pub genres: String,
    pub network: String,
    pub cast: String,
    pub directors: String,
    pub producers: String,
    pub writers: String,
}

/// One aired order season with its episodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonInfo {
    pub number: u32,
    pub year: String,
    pub episodes: Vec<EpisodeInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeInfo {
    pub id: u64,
    pub number: u32,
    pub title: String,
    pub overview: String,
    pub aired: String,
}

/// Provides series and season metadata.
pub trait EpisodeSource {
    /// Series level metadata.
    async fn series(&mut self) -> Result<SeriesInfo>;

    /// Aired order season with the given number, `None` if the series has no such season.
    async fn season(&mut self, number: u32) -> Result<Option<SeasonInfo>>;
}

/// Episode source backed by the TVDB API.
///
/// The series record is fetched once and each season at most once.
pub struct TvdbSource {
    client: TvdbClient,
    series_id: u64,
    series: Option<SeriesRecord>,
    seasons: HashMap<u32, Option<SeasonInfo>>,
}

impl SeasonInfo {
    pub fn episode(&self, number: u32) -> Option<&EpisodeInfo> {
        self.episodes.iter().find(|episode| episode.number == number)
    }
}

impl From<&SeriesRecord> for SeriesInfo {
    fn from(record: &SeriesRecord) -> Self {
        Self {
            name: record.name.clone().unwrap_or_default(),
            content_rating: record
                .content_rating(CONTENT_RATING_COUNTRY)
                .unwrap_or_default()
                .to_string(),
            genres: record.genre_names().join(", "),
            network: record
                .original_network
                .as_ref()
                .map(|network| network.name.clone())
                .unwrap_or_default(),
            cast: record.people("Actor").join(", "),
            directors: record.people("Director").join(", "),
            producers: record.people("Producer").join(", "),
            writers: record.people("Writer").join(", "),
        }
    }
}

impl From<SeasonRecord> for SeasonInfo {
    fn from(record: SeasonRecord) -> Self {
        let episodes = record
            .episodes
            .unwrap_or_default()
            .into_iter()
            .map(EpisodeInfo::from)
            .sorted_by_key(|episode| episode.number)
            .collect();

        Self {
            number: record.number,
            year: record.year.unwrap_or_default(),
            episodes,
        }
    }
}

impl From<EpisodeRecord> for EpisodeInfo {
    fn from(record: EpisodeRecord) -> Self {
        Self {
            id: record.id,
            number: record.number,
            title: record.name.unwrap_or_default(),
            overview: record.overview.unwrap_or_default(),
            aired: record.aired.unwrap_or_default(),
        }
    }
}

impl TvdbSource {
    /// Log in and create a source for one series.
    pub async fn connect(base_url: &str, api_key: &str, pin: Option<&str>, series_id: u64) -> Result<Self> {
        let mut client = TvdbClient::new(base_url)?;
        client.login(api_key, pin).await?;
        Ok(Self {
            client,
            series_id,
            series: None,
            seasons: HashMap::new(),
        })
    }

    async fn series_record(&mut self) -> Result<&SeriesRecord> {
        if self.series.is_none() {
            let record = self.client.series_extended(self.series_id).await?;
            self.series = Some(record);
        }
        self.series.as_ref().context("Series record missing")
    }
}

impl EpisodeSource for TvdbSource {
    async fn series(&mut self) -> Result<SeriesInfo> {
        Ok(SeriesInfo::from(self.series_record().await?))
    }

    async fn season(&mut self, number: u32) -> Result<Option<SeasonInfo>> {
        if let Some(season) = self.seasons.get(&number) {
            return Ok(season.clone());
        }

        let season_id = self.series_record().await?.aired_season(number).map(|season| season.id);
        let season = match season_id {
            Some(id) => Some(SeasonInfo::from(self.client.season_extended(id).await?)),
            None => None,
        };
        self.seasons.insert(number, season.clone());
        Ok(season)
    }
}
