use crate::error::SourceError;
use crate::traits::WatchHistorySource;
use async_trait::async_trait;
use janitor_models::WatchEvent;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::api::{build_client, get_json, parse_timestamp};
use super::PLEX_TV_BASE_URL;

const HISTORY_LIMIT: u32 = 10_000;

/// Account-level view of Plex, authenticated with a user token.
/// Its history covers every server and device the account watched on.
pub struct PlexAccount {
    client: Client,
    base_url: String,
    user_id: i64,
    username: String,
}

impl PlexAccount {
    pub async fn connect(user_token: &str) -> Result<Self, SourceError> {
        Self::connect_at(PLEX_TV_BASE_URL, user_token).await
    }

    pub async fn connect_at(base_url: &str, user_token: &str) -> Result<Self, SourceError> {
        let client = build_client(user_token)?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let user = get_json(&client, &format!("{}/api/v2/user", base_url)).await?;
        let user_id = user
            .get("id")
            .and_then(|id| id.as_i64())
            .ok_or_else(|| SourceError::PlexApi("account response has no user id".to_string()))?;
        let username = user
            .get("username")
            .or_else(|| user.get("title"))
            .and_then(|u| u.as_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            client,
            base_url,
            user_id,
            username,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn history_url(&self) -> String {
        format!(
            "{}/api/v2/user/{}/history?type=movie&sort=viewedAt:desc&limit={}",
            self.base_url, self.user_id, HISTORY_LIMIT
        )
    }

    pub async fn history(&self) -> Result<Vec<WatchEvent>, SourceError> {
        let json = get_json(&self.client, &self.history_url()).await?;
        let events = parse_history(&json);
        debug!("Plex account history: Returning {} items", events.len());
        Ok(events)
    }
}

/// History entries live under `MediaContainer.Metadata`, older responses
/// return a bare array. Entries without a title or `viewedAt` are dropped.
fn parse_history(json: &Value) -> Vec<WatchEvent> {
    let items = json
        .get("MediaContainer")
        .and_then(|mc| mc.get("Metadata"))
        .or(Some(json))
        .and_then(|v| v.as_array());

    let Some(items) = items else {
        debug!("Plex account history: No history array in response");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let title = item.get("title").and_then(|t| t.as_str())?;
            let viewed_at = parse_timestamp(item.get("viewedAt"))?;
            Some(WatchEvent::new(title, viewed_at))
        })
        .collect()
}

#[async_trait]
impl WatchHistorySource for PlexAccount {
    fn source_name(&self) -> &str {
        "plex account"
    }

    async fn watch_events(&self) -> Result<Vec<WatchEvent>, SourceError> {
        self.history().await
    }
}
