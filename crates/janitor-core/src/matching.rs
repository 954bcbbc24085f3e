//! The single join point between Radarr and Plex. Both services are matched
//! on the display title; swapping to ID-based matching only touches this file.

use chrono::{DateTime, Utc};
use janitor_models::{ManagedMovie, ProtectedSet, WatchHistory};

pub fn last_viewed(history: &WatchHistory, movie: &ManagedMovie) -> Option<DateTime<Utc>> {
    history.last_viewed(&movie.title)
}

pub fn is_protected(protected: &ProtectedSet, movie: &ManagedMovie) -> bool {
    protected.contains(&movie.title)
}
