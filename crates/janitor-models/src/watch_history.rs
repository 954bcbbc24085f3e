use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One "title was viewed at" observation from Plex.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchEvent {
    pub title: String,
    pub viewed_at: DateTime<Utc>,
}

impl WatchEvent {
    pub fn new(title: impl Into<String>, viewed_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            viewed_at,
        }
    }
}

/// Title -> most recent view. Keyed by display title, not a stable ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchHistory {
    last_viewed: HashMap<String, DateTime<Utc>>,
}

impl WatchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a view, keeping the later timestamp if the title is already present.
    pub fn record(&mut self, title: impl Into<String>, viewed_at: DateTime<Utc>) {
        self.last_viewed
            .entry(title.into())
            .and_modify(|current| {
                if viewed_at > *current {
                    *current = viewed_at;
                }
            })
            .or_insert(viewed_at);
    }

    pub fn last_viewed(&self, title: &str) -> Option<DateTime<Utc>> {
        self.last_viewed.get(title).copied()
    }

    pub fn len(&self) -> usize {
        self.last_viewed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_viewed.is_empty()
    }
}

impl FromIterator<WatchEvent> for WatchHistory {
    fn from_iter<I: IntoIterator<Item = WatchEvent>>(iter: I) -> Self {
        let mut history = WatchHistory::new();
        for event in iter {
            history.record(event.title, event.viewed_at);
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_keeps_latest_view() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        let history: WatchHistory = vec![
            WatchEvent::new("Alpha", late),
            WatchEvent::new("Alpha", early),
            WatchEvent::new("Beta", early),
        ]
        .into_iter()
        .collect();

        assert_eq!(history.len(), 2);
        assert_eq!(history.last_viewed("Alpha"), Some(late));
        assert_eq!(history.last_viewed("Beta"), Some(early));
        assert_eq!(history.last_viewed("Gamma"), None);
    }
}
