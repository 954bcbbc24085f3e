pub mod movie;
pub mod protected;
pub mod watch_history;

pub use movie::{DeleteOptions, ManagedMovie, OriginalLanguage, UNKNOWN_LANGUAGE};
pub use protected::ProtectedSet;
pub use watch_history::{WatchEvent, WatchHistory};
