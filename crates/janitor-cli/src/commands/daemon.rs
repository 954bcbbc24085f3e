use super::run::{execute_pass, init_run_logging, load_config};
use crate::logging::Verbosity;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use janitor_core::Reconciler;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

/// Run `pass` unless another pass holds `gate`. A tick that lands while the
/// previous pass is still running is dropped, not queued.
async fn run_exclusive<F, Fut, T>(gate: &Mutex<()>, pass: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let Ok(_running) = gate.try_lock() else {
        warn!(
            operation = "scheduled_run_skipped",
            "Previous run still in progress, skipping this tick"
        );
        return None;
    };
    Some(pass().await)
}

/// Each tick is an independent pass. A failed pass is logged by
/// [`execute_pass`] and does not stop the scheduler.
fn reconcile_job(schedule: &str, reconciler: Arc<Reconciler>, gate: Arc<Mutex<()>>) -> Result<Job> {
    Job::new_async(schedule, move |_uuid, _lock| {
        let reconciler = Arc::clone(&reconciler);
        let gate = Arc::clone(&gate);
        Box::pin(async move {
            info!(operation = "scheduled_run_start", "Starting scheduled run");
            // Failures are already logged; the next tick runs regardless
            run_exclusive(&gate, || execute_pass(&reconciler)).await;
        })
    })
    .map_err(|e| eyre!("Invalid cron schedule '{}': {}", schedule, e))
}

pub async fn run_daemon(
    config_path: Option<PathBuf>,
    schedule: String,
    no_startup_run: bool,
    verbosity: Verbosity,
    output: &Output,
) -> Result<()> {
    let config = load_config(config_path, false)?;
    let log_file = init_run_logging(
        config.logging.dir.as_deref(),
        config.policy.dry_run,
        verbosity,
    )?;
    let reconciler = Arc::new(Reconciler::new(config));
    let gate = Arc::new(Mutex::new(()));

    // Validate the schedule before doing any work
    let job = reconcile_job(&schedule, Arc::clone(&reconciler), Arc::clone(&gate))?;

    if !no_startup_run {
        info!(operation = "scheduler_startup", "Running initial pass on startup");
        if execute_pass(&reconciler).await.is_err() {
            warn!(operation = "scheduler_startup", "Initial pass failed, continuing on schedule");
        }
    }

    let mut scheduler = JobScheduler::new()
        .await
        .map_err(|e| eyre!("Failed to create scheduler: {}", e))?;
    scheduler
        .add(job)
        .await
        .map_err(|e| eyre!("Failed to schedule job: {}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| eyre!("Failed to start scheduler: {}", e))?;

    info!(
        operation = "scheduler_started",
        schedule = %schedule,
        log_file = %log_file.display(),
        "Scheduler started"
    );
    output.info(format!("Scheduler running with schedule '{}'. Press Ctrl+C to stop.", schedule));

    tokio::signal::ctrl_c().await?;

    info!(operation = "scheduler_stopping", "Shutting down scheduler");
    scheduler
        .shutdown()
        .await
        .map_err(|e| eyre!("Failed to stop scheduler: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use janitor_config::Config;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn reconciler() -> Arc<Reconciler> {
        let config = Config::from_lookup(|key| match key {
            "RADARR_URL" => Some("http://radarr:7878".to_string()),
            "RADARR_API_KEY" => Some("key".to_string()),
            "PLEX_URL" => Some("http://plex:32400".to_string()),
            "PLEX_TOKEN" => Some("token".to_string()),
            _ => None,
        })
        .unwrap();
        Arc::new(Reconciler::new(config))
    }

    fn gate() -> Arc<Mutex<()>> {
        Arc::new(Mutex::new(()))
    }

    #[tokio::test]
    async fn test_rejects_invalid_schedule() {
        assert!(reconcile_job("every tuesday", reconciler(), gate()).is_err());
    }

    #[tokio::test]
    async fn test_accepts_six_field_schedule() {
        assert!(reconcile_job("0 0 */6 * * *", reconciler(), gate()).is_ok());
    }

    #[tokio::test]
    async fn test_tick_skipped_while_previous_run_in_progress() {
        let gate = gate();
        let calls = AtomicU32::new(0);

        let held = gate.lock().await;
        let skipped = run_exclusive(&gate, || async {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        assert!(skipped.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        drop(held);
        let ran = run_exclusive(&gate, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            7
        })
        .await;
        assert_eq!(ran, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gate_released_after_pass() {
        let gate = gate();
        run_exclusive(&gate, || async {}).await;
        assert!(gate.try_lock().is_ok());
    }
}
