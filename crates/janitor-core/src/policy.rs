//! Per-movie decisions: unmonitor, delete or keep.
//!
//! Every catalog entry gets exactly one [`Action`], evaluated in this order:
//!
//! 1. monitored, has an `added` date, watched after it was added: unmonitor
//! 2. title is in the protected collection: keep
//! 3. not monitored: delete
//! 4. language filter on and language not accepted: delete
//! 5. otherwise: keep
//!
//! The protected collection only exempts from deletion, so a protected movie
//! can still be unmonitored.

use crate::matching::{is_protected, last_viewed};
use chrono::{DateTime, NaiveDateTime, Utc};
use janitor_config::PolicyConfig;
use janitor_models::{DeleteOptions, ManagedMovie, ProtectedSet, WatchHistory};
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Radarr's `added` timestamp layout.
pub const ADDED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DeleteReason {
    Unmonitored,
    Language { language: String },
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteReason::Unmonitored => write!(f, "unmonitored"),
            DeleteReason::Language { language } => write!(f, "language not accepted ({})", language),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepReason {
    Protected,
    Retained,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Unmonitor {
        viewed_at: DateTime<Utc>,
        added_at: DateTime<Utc>,
    },
    Delete {
        reason: DeleteReason,
        options: DeleteOptions,
    },
    Keep(KeepReason),
}

#[derive(Debug, Clone)]
pub struct Decision<'a> {
    pub movie: &'a ManagedMovie,
    pub action: Action,
    /// Title is in the protected collection, whatever the action
    pub protected: bool,
}

#[derive(Debug, Default)]
pub struct Plan<'a> {
    pub decisions: Vec<Decision<'a>>,
    pub warnings: Vec<String>,
}

impl<'a> Plan<'a> {
    pub fn unmonitors(&self) -> impl Iterator<Item = &Decision<'a>> {
        self.decisions
            .iter()
            .filter(|d| matches!(d.action, Action::Unmonitor { .. }))
    }

    pub fn deletions(&self) -> impl Iterator<Item = &Decision<'a>> {
        self.decisions
            .iter()
            .filter(|d| matches!(d.action, Action::Delete { .. }))
    }

    pub fn protected(&self) -> impl Iterator<Item = &Decision<'a>> {
        self.decisions.iter().filter(|d| d.protected)
    }
}

pub fn parse_added(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, ADDED_FORMAT).map(|naive| naive.and_utc())
}

/// Unmonitor check. `Err` carries a per-entry warning; the caller moves on.
fn unmonitor_action(
    movie: &ManagedMovie,
    history: &WatchHistory,
) -> Result<Option<Action>, String> {
    if !movie.monitored {
        return Ok(None);
    }
    let (Some(added), Some(viewed_at)) = (movie.added.as_deref(), last_viewed(history, movie)) else {
        return Ok(None);
    };

    let added_at = parse_added(added).map_err(|e| {
        format!(
            "Failed to process movie '{}' for unmonitoring: bad added timestamp '{}': {}",
            movie.title, added, e
        )
    })?;

    if viewed_at > added_at {
        Ok(Some(Action::Unmonitor { viewed_at, added_at }))
    } else {
        Ok(None)
    }
}

fn deletion_action(movie: &ManagedMovie, protected: bool, policy: &PolicyConfig) -> Action {
    if protected {
        return Action::Keep(KeepReason::Protected);
    }
    if !movie.monitored {
        return Action::Delete {
            reason: DeleteReason::Unmonitored,
            options: DeleteOptions::PURGE,
        };
    }
    let language = movie.language_name();
    if policy.language_filter && !policy.accepts_language(language) {
        return Action::Delete {
            reason: DeleteReason::Language {
                language: language.to_string(),
            },
            options: DeleteOptions::PURGE,
        };
    }
    Action::Keep(KeepReason::Retained)
}

/// Decide one movie. The second value is a warning when part of the
/// evaluation had to be skipped.
pub fn decide(
    movie: &ManagedMovie,
    history: &WatchHistory,
    protected: &ProtectedSet,
    policy: &PolicyConfig,
) -> (Action, Option<String>) {
    let is_protected = is_protected(protected, movie);
    match unmonitor_action(movie, history) {
        Ok(Some(action)) => (action, None),
        Ok(None) => (deletion_action(movie, is_protected, policy), None),
        Err(warning) => (deletion_action(movie, is_protected, policy), Some(warning)),
    }
}

pub fn plan<'a>(
    movies: &'a [ManagedMovie],
    history: &WatchHistory,
    protected: &ProtectedSet,
    policy: &PolicyConfig,
) -> Plan<'a> {
    let mut plan = Plan::default();
    for movie in movies {
        let (action, warning) = decide(movie, history, protected, policy);
        if let Some(warning) = warning {
            warn!(id = movie.id, "{}", warning);
            plan.warnings.push(warning);
        }
        plan.decisions.push(Decision {
            movie,
            action,
            protected: is_protected(protected, movie),
        });
    }
    plan
}

#[cfg(test)]
mod tests;
