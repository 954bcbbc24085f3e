use crate::error::SourceError;
use async_trait::async_trait;
use janitor_models::{DeleteOptions, ManagedMovie, WatchEvent};

/// The downloader/manager side: the catalog of managed movies.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn fetch_movies(&self) -> Result<Vec<ManagedMovie>, SourceError>;

    /// Full-record update; the body is the whole movie.
    async fn update_movie(&self, movie: &ManagedMovie) -> Result<(), SourceError>;

    async fn delete_movie(&self, id: i64, options: DeleteOptions) -> Result<(), SourceError>;
}

/// Anything that can report which titles were watched and when.
#[async_trait]
pub trait WatchHistorySource: Send + Sync {
    fn source_name(&self) -> &str;

    async fn watch_events(&self) -> Result<Vec<WatchEvent>, SourceError>;
}

#[async_trait]
pub trait CollectionSource: Send + Sync {
    /// Titles of the named collection. A missing collection is empty, not an error.
    async fn collection_titles(&self, name: &str) -> Result<Vec<String>, SourceError>;
}
