//! TheTVDB v4 API client.
//!
//! Documentation:
//! <https://thetvdb.github.io/v4-api/>

use anyhow::{Context, Result, bail};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Default API address.
pub const TVDB_API_URL: &str = "https://api4.thetvdb.com/v4";

/// Season type used for the normal broadcast order.
const AIRED_ORDER: &str = "Aired Order";

/// TVDB API client with bearer token authentication.
#[derive(Debug)]
pub struct TvdbClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// All responses wrap the payload in a `data` field.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    apikey: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pin: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

/// Series record from `/series/{id}/extended`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub characters: Option<Vec<CharacterRecord>>,
    #[serde(default)]
    pub content_ratings: Option<Vec<ContentRatingRecord>>,
    #[serde(default)]
    pub genres: Option<Vec<NamedRecord>>,
    #[serde(default)]
    pub original_network: Option<NamedRecord>,
    #[serde(default)]
    pub seasons: Option<Vec<SeasonSummary>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    #[serde(default)]
    pub person_name: Option<String>,
    #[serde(default)]
    pub people_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentRatingRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedRecord {
    #[serde(default)]
    pub name: String,
}

/// Season entry listed in the series record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonSummary {
    pub id: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(rename = "type", default)]
    pub season_type: Option<NamedRecord>,
}

/// Season record from `/seasons/{id}/extended`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonRecord {
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub episodes: Option<Vec<EpisodeRecord>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
    pub id: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub aired: Option<String>,
}

impl TvdbClient {
    /// Create a new client for the given API address.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Exchange the API key for a bearer token.
    ///
    /// # Errors
    /// Returns an error if the request fails or the key is rejected.
    pub async fn login(&mut self, api_key: &str, pin: Option<&str>) -> Result<()> {
        let url = self.build_url("login");
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { apikey: api_key, pin })
            .send()
            .await
            .context("Failed to send login request")?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            bail!("TVDB login failed: invalid API key");
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("TVDB login failed: HTTP {status} - {body}");
        }

        let login: ApiResponse<LoginData> = response.json().await.context("Failed to parse login response")?;
        self.token = Some(login.data.token);
        Ok(())
    }

    /// Get the extended series record with characters and seasons.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn series_extended(&self, series_id: u64) -> Result<SeriesRecord> {
        self.get(&format!("series/{series_id}/extended"))
            .await
            .with_context(|| format!("Failed to get series {series_id}"))
    }

    /// Get the extended season record with episodes.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn season_extended(&self, season_id: u64) -> Result<SeasonRecord> {
        self.get(&format!("seasons/{season_id}/extended"))
            .await
            .with_context(|| format!("Failed to get season {season_id}"))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let Some(token) = &self.token else {
            bail!("Not authenticated. Call login() first.");
        };

        let response = self
            .client
            .get(self.build_url(path))
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response.text().await.context("Failed to read response body")?;
        if !status.is_success() {
            bail!("HTTP {status} - {body}");
        }

        parse_response(&body)
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

impl SeriesRecord {
    /// Content rating for the given country code, like `usa`.
    pub fn content_rating(&self, country: &str) -> Option<&str> {
        self.content_ratings
            .iter()
            .flatten()
            .find(|rating| rating.country.eq_ignore_ascii_case(country))
            .map(|rating| rating.name.as_str())
    }

    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().flatten().map(|genre| genre.name.as_str()).collect()
    }

    /// Names of people with the given role, in listed order without duplicates.
    ///
    /// Characters without a role are treated as actors.
    pub fn people(&self, people_type: &str) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for character in self.characters.iter().flatten() {
            let role = character.people_type.as_deref().unwrap_or("Actor");
            if let Some(name) = character.person_name.as_deref()
                && role.eq_ignore_ascii_case(people_type)
                && !name.is_empty()
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        names
    }

    /// The aired order season with the given number.
    pub fn aired_season(&self, number: u32) -> Option<&SeasonSummary> {
        self.seasons.iter().flatten().find(|season| {
            season.number == number
                && season
                    .season_type
                    .as_ref()
                    .is_some_and(|season_type| season_type.name == AIRED_ORDER)
        })
    }
}

fn parse_response<T: DeserializeOwned>(body: &str) -> Result<T> {
    let response: ApiResponse<T> = serde_json::from_str(body).context("Failed to parse TVDB response JSON")?;
    Ok(response.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERIES_JSON: &str = r#"{
        "status": "success",
        "data": {
            "id": 81189,
            "name": "Example Show",
            "contentRatings": [
                { "name": "15", "country": "gbr" },
                { "name": "TV-14", "country": "usa" }
            ],
            "genres": [{ "name": "Drama" }, { "name": "Crime" }],
            "originalNetwork": { "name": "AMC" },
            "characters": [
                { "personName": "Actor One", "peopleType": "Actor" },
                { "personName": "Actor Two", "peopleType": "Actor" },
                { "personName": "Actor One", "peopleType": "Actor" },
                { "personName": "Director One", "peopleType": "Director" },
                { "personName": "Untyped Person" }
            ],
            "seasons": [
                { "id": 10, "number": 1, "type": { "name": "DVD Order" } },
                { "id": 11, "number": 1, "type": { "name": "Aired Order" } },
                { "id": 12, "number": 2, "type": { "name": "Aired Order" } }
            ]
        }
    }"#;

    #[test]
    fn parse_series_record() {
        let series: SeriesRecord = parse_response(SERIES_JSON).unwrap();
        assert_eq!(series.name.as_deref(), Some("Example Show"));
        assert_eq!(series.content_rating("USA"), Some("TV-14"));
        assert_eq!(series.genre_names(), vec!["Drama", "Crime"]);
        assert_eq!(series.original_network.as_ref().map(|n| n.name.as_str()), Some("AMC"));
        assert_eq!(series.people("Actor"), vec!["Actor One", "Actor Two", "Untyped Person"]);
        assert_eq!(series.people("Director"), vec!["Director One"]);
        assert!(series.people("Writer").is_empty());
    }

    #[test]
    fn aired_season_ignores_other_orders() {
        let series: SeriesRecord = parse_response(SERIES_JSON).unwrap();
        assert_eq!(series.aired_season(1).map(|s| s.id), Some(11));
        assert_eq!(series.aired_season(2).map(|s| s.id), Some(12));
        assert!(series.aired_season(3).is_none());
    }

    #[test]
    fn parse_series_with_null_fields() {
        let json = r#"{ "data": { "id": 1, "name": null, "characters": null, "genres": null, "seasons": null } }"#;
        let series: SeriesRecord = parse_response(json).unwrap();
        assert!(series.content_rating("usa").is_none());
        assert!(series.genre_names().is_empty());
        assert!(series.people("Actor").is_empty());
        assert!(series.aired_season(1).is_none());
    }

    #[test]
    fn parse_season_record() {
        let json = r#"{
            "data": {
                "id": 11,
                "number": 1,
                "year": "2008",
                "image": "https://artworks.thetvdb.com/banners/seasons/1.jpg",
                "episodes": [
                    { "id": 349232, "number": 1, "seasonNumber": 1, "name": "Pilot", "overview": "First.", "aired": "2008-01-20" },
                    { "id": 349235, "number": 2, "seasonNumber": 1, "name": null, "aired": null }
                ]
            }
        }"#;
        let season: SeasonRecord = parse_response(json).unwrap();
        assert_eq!(season.year.as_deref(), Some("2008"));
        let episodes = season.episodes.unwrap();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].name.as_deref(), Some("Pilot"));
        assert_eq!(episodes[0].aired.as_deref(), Some("2008-01-20"));
        assert_eq!(episodes[1].number, 2);
        assert!(episodes[1].name.is_none());
    }

    #[test]
    fn parse_response_rejects_missing_data() {
        assert!(parse_response::<SeasonRecord>(r#"{ "status": "failure" }"#).is_err());
    }

    #[test]
    fn build_url_trims_trailing_slash() {
        let client = TvdbClient::new("https://example.com/v4/").unwrap();
        assert_eq!(client.build_url("login"), "https://example.com/v4/login");
    }
}
