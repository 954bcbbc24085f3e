use janitor_models::WatchHistory;
use janitor_sources::WatchHistorySource;
use tracing::{info, warn};

/// Fold a source's events into title -> latest view.
///
/// A failing source degrades to an empty history: nothing is unmonitored this
/// run, deletion rules still apply.
pub async fn resolve_watch_history(source: &dyn WatchHistorySource) -> WatchHistory {
    match source.watch_events().await {
        Ok(events) => {
            let history: WatchHistory = events.into_iter().collect();
            info!(
                source = source.source_name(),
                watched = history.len(),
                "Found {} watched movies",
                history.len()
            );
            history
        }
        Err(e) => {
            warn!(
                source = source.source_name(),
                error = %e,
                "Failed to fetch watch history, continuing without watch data"
            );
            WatchHistory::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use janitor_models::WatchEvent;
    use janitor_sources::SourceError;

    struct StaticSource(Vec<WatchEvent>);

    #[async_trait]
    impl WatchHistorySource for StaticSource {
        fn source_name(&self) -> &str {
            "static"
        }

        async fn watch_events(&self) -> Result<Vec<WatchEvent>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl WatchHistorySource for FailingSource {
        fn source_name(&self) -> &str {
            "failing"
        }

        async fn watch_events(&self) -> Result<Vec<WatchEvent>, SourceError> {
            Err(SourceError::PlexApi("401 Unauthorized".to_string()))
        }
    }

    #[tokio::test]
    async fn test_folds_to_latest_view() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let feb = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let source = StaticSource(vec![
            WatchEvent::new("Alpha", feb),
            WatchEvent::new("Alpha", jan),
            WatchEvent::new("Beta", jan),
        ]);

        let history = resolve_watch_history(&source).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history.last_viewed("Alpha"), Some(feb));
    }

    #[tokio::test]
    async fn test_failure_yields_empty_history() {
        let history = resolve_watch_history(&FailingSource).await;
        assert!(history.is_empty());
    }
}
