mod account;
pub mod api;
mod auth;

pub use account::PlexAccount;
pub use api::{LibraryInfo, LibraryMovie, PlexServer};
pub use auth::{sign_in, SignIn};

const PLEX_TV_BASE_URL: &str = "https://plex.tv";
const CLIENT_IDENTIFIER: &str = "radarr-janitor";
