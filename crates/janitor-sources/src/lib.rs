pub mod error;
pub mod plex;
pub mod radarr;
pub mod retry;
pub mod traits;

pub use error::{ErrorCategory, SourceError};
pub use plex::{sign_in, PlexAccount, PlexServer, SignIn};
pub use radarr::RadarrClient;
pub use retry::RetryPolicy;
pub use traits::{CollectionSource, MovieCatalog, WatchHistorySource};
