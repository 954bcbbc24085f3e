use crate::error::SourceError;
use crate::traits::{CollectionSource, WatchHistorySource};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use janitor_models::WatchEvent;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::CLIENT_IDENTIFIER;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub key: String,
    pub type_: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryMovie {
    pub rating_key: String,
    pub title: String,
    pub view_count: u32,
    pub last_viewed_at: Option<DateTime<Utc>>,
}

impl LibraryMovie {
    /// Fully watched with a known last view.
    pub fn watch_event(&self) -> Option<WatchEvent> {
        if self.view_count == 0 {
            return None;
        }
        self.last_viewed_at
            .map(|viewed_at| WatchEvent::new(self.title.clone(), viewed_at))
    }
}

pub(crate) fn build_client(token: &str) -> Result<Client, SourceError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        reqwest::header::HeaderName::from_static("x-plex-token"),
        reqwest::header::HeaderValue::from_str(token)
            .map_err(|_| SourceError::PlexApi("Invalid token format".to_string()))?,
    );
    headers.insert(
        reqwest::header::HeaderName::from_static("x-plex-client-identifier"),
        reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
    );

    Client::builder()
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(SourceError::from_plex)
}

pub(crate) async fn get_json(client: &Client, url: &str) -> Result<Value, SourceError> {
    let response = client.get(url).send().await.map_err(SourceError::from_plex)?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::PlexApi(format!("{} returned {}", url, status)));
    }
    response.json().await.map_err(SourceError::from_plex)
}

pub(crate) fn parse_timestamp(timestamp: Option<&Value>) -> Option<DateTime<Utc>> {
    timestamp
        .and_then(|t| t.as_i64().or_else(|| t.as_str().and_then(|s| s.parse::<i64>().ok())))
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
}

fn media_container_array<'a>(json: &'a Value, field: &str) -> &'a [Value] {
    json.get("MediaContainer")
        .and_then(|mc| mc.get(field))
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn string_field(item: &Value, field: &str) -> Option<String> {
    item.get(field).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn parse_libraries(json: &Value) -> Vec<LibraryInfo> {
    media_container_array(json, "Directory")
        .iter()
        .map(|dir| LibraryInfo {
            key: string_field(dir, "key").unwrap_or_default(),
            type_: string_field(dir, "type").unwrap_or_default(),
            title: string_field(dir, "title").unwrap_or_default(),
        })
        .collect()
}

pub(crate) fn parse_library_movies(json: &Value) -> Vec<LibraryMovie> {
    let items = media_container_array(json, "Metadata");
    let mut skipped = 0;
    let movies: Vec<LibraryMovie> = items
        .iter()
        .filter_map(|item| {
            let parsed = item.get("title").and_then(|t| t.as_str()).map(|title| LibraryMovie {
                rating_key: string_field(item, "ratingKey").unwrap_or_default(),
                title: title.to_string(),
                view_count: item
                    .get("viewCount")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
                last_viewed_at: parse_timestamp(item.get("lastViewedAt")),
            });
            if parsed.is_none() {
                skipped += 1;
            }
            parsed
        })
        .collect();

    if skipped > 0 {
        debug!("Plex library: Skipped {} items without a title", skipped);
    }
    movies
}

/// Rating key of the collection whose title matches exactly.
pub(crate) fn find_collection_key(json: &Value, name: &str) -> Option<String> {
    media_container_array(json, "Metadata")
        .iter()
        .find(|c| c.get("title").and_then(|t| t.as_str()) == Some(name))
        .and_then(|c| string_field(c, "ratingKey"))
}

pub(crate) fn parse_titles(json: &Value) -> Vec<String> {
    media_container_array(json, "Metadata")
        .iter()
        .filter_map(|item| item.get("title").and_then(|t| t.as_str()).map(str::to_string))
        .collect()
}

/// A connected Plex Media Server with its movie section resolved.
pub struct PlexServer {
    client: Client,
    server_url: String,
    friendly_name: String,
    section: LibraryInfo,
}

impl PlexServer {
    /// Reach the server, then resolve the library section by its title.
    pub async fn connect(server_url: &str, token: &str, library: &str) -> Result<Self, SourceError> {
        let client = build_client(token)?;
        let server_url = server_url.trim_end_matches('/').to_string();

        let identity = get_json(&client, &format!("{}/", server_url)).await?;
        let friendly_name = identity
            .get("MediaContainer")
            .and_then(|mc| mc.get("friendlyName"))
            .and_then(|n| n.as_str())
            .unwrap_or("Unknown")
            .to_string();

        let sections = get_json(&client, &format!("{}/library/sections", server_url)).await?;
        let section = parse_libraries(&sections)
            .into_iter()
            .find(|lib| lib.title == library)
            .ok_or_else(|| {
                SourceError::PlexApi(format!("library section '{}' not found", library))
            })?;

        debug!(
            "Plex: Using section '{}' (key={}, type={})",
            section.title, section.key, section.type_
        );

        Ok(Self {
            client,
            server_url,
            friendly_name,
            section,
        })
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn section(&self) -> &LibraryInfo {
        &self.section
    }

    pub async fn get_movies(&self) -> Result<Vec<LibraryMovie>, SourceError> {
        let url = format!(
            "{}/library/sections/{}/all?type=1",
            self.server_url, self.section.key
        );
        let json = get_json(&self.client, &url).await?;
        let movies = parse_library_movies(&json);
        debug!("Plex get_movies: Found {} items in library", movies.len());
        Ok(movies)
    }
}

#[async_trait]
impl WatchHistorySource for PlexServer {
    fn source_name(&self) -> &str {
        "plex library"
    }

    async fn watch_events(&self) -> Result<Vec<WatchEvent>, SourceError> {
        let movies = self.get_movies().await?;
        Ok(movies.iter().filter_map(LibraryMovie::watch_event).collect())
    }
}

#[async_trait]
impl CollectionSource for PlexServer {
    async fn collection_titles(&self, name: &str) -> Result<Vec<String>, SourceError> {
        let url = format!(
            "{}/library/sections/{}/collections",
            self.server_url, self.section.key
        );
        let collections = get_json(&self.client, &url).await?;

        let Some(rating_key) = find_collection_key(&collections, name) else {
            warn!(collection = name, "Plex collection not found, nothing is protected");
            return Ok(Vec::new());
        };

        let url = format!("{}/library/collections/{}/children", self.server_url, rating_key);
        let children = get_json(&self.client, &url).await?;
        let titles = parse_titles(&children);
        info!(collection = name, count = titles.len(), "Plex collection loaded");
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_libraries() {
        let json = json!({
            "MediaContainer": {
                "Directory": [
                    { "key": "1", "type": "movie", "title": "Movies" },
                    { "key": "2", "type": "show", "title": "TV Shows" }
                ]
            }
        });
        let libraries = parse_libraries(&json);
        assert_eq!(libraries.len(), 2);
        assert_eq!(libraries[0].key, "1");
        assert_eq!(libraries[1].title, "TV Shows");
    }

    #[test]
    fn test_parse_library_movies_and_watch_events() {
        let json = json!({
            "MediaContainer": {
                "Metadata": [
                    { "ratingKey": "10", "title": "Alpha", "viewCount": 2, "lastViewedAt": 1706745600 },
                    { "ratingKey": "11", "title": "Beta", "lastViewedAt": 1706745600 },
                    { "ratingKey": "12", "title": "Gamma", "viewCount": 1 },
                    { "ratingKey": "13" }
                ]
            }
        });
        let movies = parse_library_movies(&json);
        assert_eq!(movies.len(), 3);

        let events: Vec<WatchEvent> = movies.iter().filter_map(LibraryMovie::watch_event).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Alpha");
        assert_eq!(
            events[0].viewed_at,
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_find_collection_key() {
        let json = json!({
            "MediaContainer": {
                "Metadata": [
                    { "ratingKey": "500", "title": "Favourites" },
                    { "ratingKey": 501, "title": "Keepers" }
                ]
            }
        });
        assert_eq!(find_collection_key(&json, "Keepers").as_deref(), Some("501"));
        assert_eq!(find_collection_key(&json, "keepers"), None);
    }

    #[test]
    fn test_missing_media_container() {
        let json = json!({ "error": "unauthorized" });
        assert!(parse_titles(&json).is_empty());
        assert!(parse_library_movies(&json).is_empty());
        assert!(parse_libraries(&json).is_empty());
    }
}
