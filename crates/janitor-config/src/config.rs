use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LIBRARY: &str = "Movies";

/// Where a run takes its configuration from. A run uses exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Env,
    Yaml(PathBuf),
}

impl ConfigSource {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => ConfigSource::Yaml(path),
            None => ConfigSource::Env,
        }
    }

    /// Log directory to use when the full configuration fails to load: the
    /// `logging.dir` of a YAML file whose logging section still parses, or
    /// `JANITOR_LOG_DIR`.
    pub fn log_dir_hint(&self) -> Option<PathBuf> {
        match self {
            ConfigSource::Env => {
                dotenvy::dotenv().ok();
                std::env::var("JANITOR_LOG_DIR")
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from)
            }
            ConfigSource::Yaml(path) => {
                let content = std::fs::read_to_string(path).ok()?;
                serde_yaml::from_str::<LoggingSection>(&content).ok()?.logging.dir
            }
        }
    }
}

/// Only the logging section; every other key is ignored.
#[derive(Deserialize)]
struct LoggingSection {
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub radarr: RadarrConfig,
    pub plex: PlexConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadarrConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlexConfig {
    pub url: String,
    pub token: String,
    /// Account-level token; switches watch history to the account feed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_library")]
    pub library: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
    #[serde(default)]
    pub accepted_languages: Vec<String>,
    #[serde(default)]
    pub language_filter: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    #[serde(default = "default_true")]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_library() -> String {
    DEFAULT_LIBRARY.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            accepted_languages: Vec::new(),
            language_filter: false,
            collection_name: None,
            dry_run: default_true(),
        }
    }
}

impl PolicyConfig {
    pub fn accepts_language(&self, name: &str) -> bool {
        self.accepted_languages.iter().any(|l| l == name)
    }
}

impl PlexConfig {
    /// Username and password, when both are present, for account sign-in.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }
}

/// Parse a `true`/`false` flag, case-insensitively. Anything else is an error.
pub fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}

fn split_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        let prefix: String = secret.chars().take(2).collect();
        format!("{}****", prefix)
    }
}

impl Config {
    pub fn load(source: &ConfigSource) -> Result<Self, ConfigError> {
        let config = match source {
            ConfigSource::Env => {
                dotenvy::dotenv().ok();
                Self::from_env()?
            }
            ConfigSource::Yaml(path) => Self::load_from_file(path)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from a key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| optional(key).ok_or(ConfigError::Missing(key));
        let flag = |key: &str, default: bool| -> Result<bool, ConfigError> {
            match optional(key) {
                Some(value) => parse_bool(key, &value),
                None => Ok(default),
            }
        };

        Ok(Config {
            radarr: RadarrConfig {
                url: required("RADARR_URL")?,
                api_key: required("RADARR_API_KEY")?,
            },
            plex: PlexConfig {
                url: required("PLEX_URL")?,
                token: required("PLEX_TOKEN")?,
                user_token: optional("PLEX_USER_TOKEN"),
                username: optional("PLEX_USERNAME"),
                password: optional("PLEX_PASSWORD"),
                library: optional("PLEX_LIBRARY").unwrap_or_else(default_library),
            },
            policy: PolicyConfig {
                accepted_languages: optional("ACCEPTED_LANGUAGES")
                    .map(|raw| split_languages(&raw))
                    .unwrap_or_default(),
                language_filter: flag("LANGUAGE_FILTER", false)?,
                collection_name: optional("MOVIE_COLLECTION_NAME"),
                dry_run: flag("DRY_RUN", true)?,
            },
            logging: LoggingConfig {
                dir: optional("JANITOR_LOG_DIR").map(PathBuf::from),
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radarr.url.trim().is_empty() {
            return Err(ConfigError::Missing("radarr.url"));
        }
        if self.radarr.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("radarr.api_key"));
        }
        if self.plex.url.trim().is_empty() {
            return Err(ConfigError::Missing("plex.url"));
        }
        if self.plex.token.trim().is_empty() {
            return Err(ConfigError::Missing("plex.token"));
        }
        if self.plex.library.trim().is_empty() {
            return Err(ConfigError::Missing("plex.library"));
        }
        if self.plex.username.is_some() != self.plex.password.is_some() {
            return Err(ConfigError::Invalid(
                "plex username and password must be set together".to_string(),
            ));
        }
        // An empty accepted set would delete every monitored title
        if self.policy.language_filter && self.policy.accepted_languages.is_empty() {
            return Err(ConfigError::Invalid(
                "language filter is enabled but no accepted languages are configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy with every secret masked, for display.
    pub fn masked(&self) -> Self {
        let mut config = self.clone();
        config.radarr.api_key = mask_secret(&config.radarr.api_key);
        config.plex.token = mask_secret(&config.plex.token);
        config.plex.user_token = config.plex.user_token.as_deref().map(mask_secret);
        config.plex.password = config.plex.password.as_deref().map(mask_secret);
        config
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
