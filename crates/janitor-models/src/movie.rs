use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// A movie as Radarr reports it from `/api/v3/movie`.
///
/// Only the fields the janitor reasons about are typed. Everything else is
/// kept in `extra` so the record can be sent back whole on a PUT.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedMovie {
    pub id: i64,
    pub title: String,
    #[serde(default = "default_monitored")]
    pub monitored: bool,
    // Raw string, parsed per entry so a bad value only skips that entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<OriginalLanguage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OriginalLanguage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_monitored() -> bool {
    true
}

impl ManagedMovie {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            monitored: true,
            added: None,
            original_language: None,
            extra: Map::new(),
        }
    }

    pub fn with_monitored(mut self, monitored: bool) -> Self {
        self.monitored = monitored;
        self
    }

    pub fn with_added(mut self, added: impl Into<String>) -> Self {
        self.added = Some(added.into());
        self
    }

    pub fn with_language(mut self, name: impl Into<String>) -> Self {
        self.original_language = Some(OriginalLanguage {
            name: Some(name.into()),
            extra: Map::new(),
        });
        self
    }

    /// Original-language name, or `"Unknown"` when Radarr has none.
    pub fn language_name(&self) -> &str {
        self.original_language
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .unwrap_or(UNKNOWN_LANGUAGE)
    }

    /// Copy of the full record with the monitored flag cleared.
    pub fn unmonitored(&self) -> Self {
        let mut movie = self.clone();
        movie.monitored = false;
        movie
    }
}

/// Query parameters for `DELETE /api/v3/movie/{id}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOptions {
    pub delete_files: bool,
    pub add_import_exclusion: bool,
}

impl DeleteOptions {
    /// Remove files from disk, allow the title to be re-added later.
    pub const PURGE: DeleteOptions = DeleteOptions {
        delete_files: true,
        add_import_exclusion: false,
    };
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self::PURGE
    }
}
