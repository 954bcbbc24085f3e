use crate::policy::{plan, Action, DeleteReason, Plan};
use crate::sink::{sink_for, MutationSink};
use crate::watch::resolve_watch_history;
use anyhow::{Context, Result};
use async_trait::async_trait;
use janitor_config::{Config, PolicyConfig};
use janitor_models::{ProtectedSet, WatchEvent};
use janitor_sources::{
    sign_in, CollectionSource, MovieCatalog, PlexAccount, PlexServer, RadarrClient, RetryPolicy,
    SourceError, WatchHistorySource,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// The three services a run reads from. The catalog also receives writes.
pub struct Sources<'a> {
    pub catalog: &'a dyn MovieCatalog,
    pub watch: &'a dyn WatchHistorySource,
    pub collections: &'a dyn CollectionSource,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeletedMovie {
    pub id: i64,
    pub title: String,
    #[serde(flatten)]
    pub reason: DeleteReason,
}

#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub catalog_size: usize,
    pub watched_titles: usize,
    pub protected_titles: usize,
    pub unmonitored: Vec<String>,
    pub deleted: Vec<DeletedMovie>,
    pub skipped: Vec<String>,
    pub kept: usize,
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub duration: Duration,
}

/// Runs one reconciliation against the live services described by a [`Config`].
pub struct Reconciler {
    config: Config,
    retry: RetryPolicy,
}

impl Reconciler {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[instrument(skip(self), fields(dry_run = self.config.policy.dry_run))]
    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();
        let plex_config = &self.config.plex;

        info!("------ Connecting to Plex server ------");
        let (url, token, library) = (
            plex_config.url.as_str(),
            plex_config.token.as_str(),
            plex_config.library.as_str(),
        );
        let plex = self
            .retry
            .run("connect to plex", move || PlexServer::connect(url, token, library))
            .await
            .context("Failed to connect to Plex server")?;
        info!("Connected to Plex server: {}", plex.friendly_name());

        let account = self.user_token().await?.map(AccountFeed::new);
        let watch: &dyn WatchHistorySource = match &account {
            Some(feed) => feed,
            None => &plex,
        };

        let radarr = RadarrClient::new(&self.config.radarr.url, &self.config.radarr.api_key)
            .context("Failed to create Radarr client")?;

        let sources = Sources {
            catalog: &radarr,
            watch,
            collections: &plex,
        };
        let mut report = reconcile(&sources, &self.config.policy, &self.retry).await?;
        report.duration = started.elapsed();
        Ok(report)
    }

    /// Configured user token, or one obtained by signing in.
    async fn user_token(&self) -> Result<Option<String>> {
        if let Some(token) = &self.config.plex.user_token {
            return Ok(Some(token.clone()));
        }
        if let Some((username, password)) = self.config.plex.credentials() {
            info!("------ Signing in to Plex account ------");
            let signed_in = sign_in(username, password)
                .await
                .context("Failed to sign in to Plex account")?;
            return Ok(Some(signed_in.auth_token));
        }
        Ok(None)
    }
}

/// Account history, connected lazily so a bad token degrades like any other
/// history failure.
struct AccountFeed {
    user_token: String,
}

impl AccountFeed {
    fn new(user_token: String) -> Self {
        Self { user_token }
    }
}

#[async_trait]
impl WatchHistorySource for AccountFeed {
    fn source_name(&self) -> &str {
        "plex account"
    }

    async fn watch_events(&self) -> Result<Vec<WatchEvent>, SourceError> {
        let account = PlexAccount::connect(&self.user_token).await?;
        info!("Using watch history of Plex account {}", account.username());
        account.history().await
    }
}

async fn load_protected(
    collections: &dyn CollectionSource,
    collection_name: Option<&str>,
) -> Result<ProtectedSet> {
    let Some(name) = collection_name else {
        info!("No protected collection configured");
        return Ok(ProtectedSet::empty());
    };

    info!("------ Collecting movies in Plex collection ------");
    let titles = collections
        .collection_titles(name)
        .await
        .with_context(|| format!("Failed to load Plex collection '{}'", name))?;
    Ok(ProtectedSet::new(name, titles))
}

/// Fetch, decide, mutate. Write failures end the run; mutations already
/// issued stay applied.
pub async fn reconcile(
    sources: &Sources<'_>,
    policy: &PolicyConfig,
    retry: &RetryPolicy,
) -> Result<RunReport> {
    info!("------ Checking Radarr service ------");
    let catalog = sources.catalog;
    let movies = retry
        .run("fetch radarr catalog", move || catalog.fetch_movies())
        .await
        .context("Failed to fetch Radarr catalog")?;
    info!("Radarr service is reachable, {} movies in catalog", movies.len());

    info!("------ Fetching watched movies from Plex ------");
    let history = resolve_watch_history(sources.watch).await;

    let protected = load_protected(sources.collections, policy.collection_name.as_deref()).await?;

    let plan = plan(&movies, &history, &protected, policy);
    let sink = sink_for(policy.dry_run, sources.catalog);

    let mut report = RunReport {
        dry_run: sink.is_dry_run(),
        catalog_size: movies.len(),
        watched_titles: history.len(),
        protected_titles: protected.len(),
        warnings: plan.warnings.clone(),
        ..RunReport::default()
    };
    execute(&plan, sink.as_ref(), protected.collection(), &mut report).await?;
    Ok(report)
}

async fn execute(
    plan: &Plan<'_>,
    sink: &dyn MutationSink,
    collection: Option<&str>,
    report: &mut RunReport,
) -> Result<()> {
    let dry_run = sink.is_dry_run();

    info!("------ Unmonitoring watched movies in Radarr ------");
    for decision in plan.unmonitors() {
        let movie = decision.movie;
        if let Action::Unmonitor { viewed_at, added_at } = &decision.action {
            info!(
                id = movie.id,
                dry_run,
                "Unmonitoring movie: {} - watched {} after added {}",
                movie.title,
                viewed_at,
                added_at
            );
        }
        sink.unmonitor(movie)
            .await
            .with_context(|| format!("Failed to unmonitor '{}'", movie.title))?;
        report.unmonitored.push(movie.title.clone());
    }

    info!("------ Removing movies not in collection or language filter ------");
    for decision in plan.deletions() {
        let movie = decision.movie;
        if let Action::Delete { reason, options } = &decision.action {
            info!(id = movie.id, dry_run, "Removing movie: {} - reason: {}", movie.title, reason);
            sink.delete(movie, *options)
                .await
                .with_context(|| format!("Failed to delete '{}'", movie.title))?;
            report.deleted.push(DeletedMovie {
                id: movie.id,
                title: movie.title.clone(),
                reason: reason.clone(),
            });
        }
    }

    report.kept = plan
        .decisions
        .iter()
        .filter(|d| matches!(d.action, Action::Keep(_)))
        .count();

    info!("------ Logging skipped movies ------");
    for decision in plan.protected() {
        info!(
            "Skipping movie: {} - in collection '{}'",
            decision.movie.title,
            collection.unwrap_or_default()
        );
        report.skipped.push(decision.movie.title.clone());
    }

    Ok(())
}
