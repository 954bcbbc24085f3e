pub mod config;
pub mod error;
pub mod paths;

pub use config::{
    parse_bool, Config, ConfigSource, LoggingConfig, PlexConfig, PolicyConfig, RadarrConfig,
    DEFAULT_LIBRARY,
};
pub use error::ConfigError;
pub use paths::{container_base_path, PathManager};
