pub mod config;
pub mod daemon;
pub mod plex_token;
pub mod run;
