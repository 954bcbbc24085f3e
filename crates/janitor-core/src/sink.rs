//! Where mutations go. The dry-run switch is decided once, by picking a sink;
//! the policy and the executor never check it.

use async_trait::async_trait;
use janitor_models::{DeleteOptions, ManagedMovie};
use janitor_sources::{MovieCatalog, SourceError};
use tracing::debug;

#[async_trait]
pub trait MutationSink: Send + Sync {
    fn is_dry_run(&self) -> bool;

    async fn unmonitor(&self, movie: &ManagedMovie) -> Result<(), SourceError>;

    async fn delete(&self, movie: &ManagedMovie, options: DeleteOptions) -> Result<(), SourceError>;
}

/// Sends every mutation to the catalog.
pub struct ApplySink<'a> {
    catalog: &'a dyn MovieCatalog,
}

impl<'a> ApplySink<'a> {
    pub fn new(catalog: &'a dyn MovieCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl<'a> MutationSink for ApplySink<'a> {
    fn is_dry_run(&self) -> bool {
        false
    }

    async fn unmonitor(&self, movie: &ManagedMovie) -> Result<(), SourceError> {
        self.catalog.update_movie(&movie.unmonitored()).await
    }

    async fn delete(&self, movie: &ManagedMovie, options: DeleteOptions) -> Result<(), SourceError> {
        self.catalog.delete_movie(movie.id, options).await
    }
}

/// Logs what would be sent and sends nothing.
#[derive(Debug, Default)]
pub struct DryRunSink;

#[async_trait]
impl MutationSink for DryRunSink {
    fn is_dry_run(&self) -> bool {
        true
    }

    async fn unmonitor(&self, movie: &ManagedMovie) -> Result<(), SourceError> {
        debug!(
            id = movie.id,
            title = %movie.title,
            "Dry run: Would update endpoint movie/{} with monitored=false",
            movie.id
        );
        Ok(())
    }

    async fn delete(&self, movie: &ManagedMovie, options: DeleteOptions) -> Result<(), SourceError> {
        debug!(
            id = movie.id,
            title = %movie.title,
            delete_files = options.delete_files,
            add_import_exclusion = options.add_import_exclusion,
            "Dry run: Would delete endpoint movie/{}",
            movie.id
        );
        Ok(())
    }
}

pub fn sink_for<'a>(dry_run: bool, catalog: &'a dyn MovieCatalog) -> Box<dyn MutationSink + 'a> {
    if dry_run {
        Box::new(DryRunSink)
    } else {
        Box::new(ApplySink::new(catalog))
    }
}
