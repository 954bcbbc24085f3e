use crate::logging::{self, Verbosity};
use crate::output::Output;
use anyhow::Context;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use janitor_config::{Config, ConfigError, ConfigSource, PathManager};
use janitor_core::{Reconciler, RunReport};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

fn read_config(source: &ConfigSource, force_dry_run: bool) -> Result<Config, ConfigError> {
    let mut config = Config::load(source)?;
    if force_dry_run {
        config.policy.dry_run = true;
    }
    Ok(config)
}

/// Load from the YAML file when given, the environment otherwise. `--dry-run`
/// can only turn dry-run on.
pub fn load_config(path: Option<PathBuf>, force_dry_run: bool) -> Result<Config> {
    read_config(&ConfigSource::from_path(path), force_dry_run)
        .map_err(|e| eyre!("Invalid configuration: {}", e))
}

pub fn init_run_logging(
    log_dir: Option<&Path>,
    dry_run: bool,
    verbosity: Verbosity,
) -> Result<PathBuf> {
    let paths = PathManager::with_log_dir(log_dir);
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create log directory {}: {}", paths.log_dir().display(), e))?;
    let log_file = paths.log_file();
    logging::init_logging(verbosity, dry_run, Some(&log_file))
        .map_err(|e| eyre!("Failed to initialize logging at {}: {}", log_file.display(), e))?;
    Ok(log_file)
}

/// Bracket a pass with a start and an end line. A failure is logged here as a
/// single error line before it is returned.
pub async fn bracketed<F, Fut>(dry_run: bool, pass: F) -> anyhow::Result<RunReport>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<RunReport>>,
{
    info!(dry_run, "====== Radarr Janitor run started ======");
    if dry_run {
        debug!("DRY_RUN mode enabled, no changes will be made in Radarr");
    }

    let result = pass().await;
    match &result {
        Ok(report) => info!(
            unmonitored = report.unmonitored.len(),
            deleted = report.deleted.len(),
            skipped = report.skipped.len(),
            warnings = report.warnings.len(),
            duration_ms = report.duration.as_millis() as u64,
            "Run completed"
        ),
        Err(e) => error!(error = %format!("{:#}", e), "Run failed"),
    }

    info!("====== Radarr Janitor run ended ======");
    result
}

pub async fn execute_pass(reconciler: &Reconciler) -> anyhow::Result<RunReport> {
    bracketed(reconciler.config().policy.dry_run, || reconciler.run()).await
}

pub async fn run_once(
    config_path: Option<PathBuf>,
    dry_run: bool,
    verbosity: Verbosity,
    output: &Output,
) -> Result<()> {
    let source = ConfigSource::from_path(config_path);
    let loaded = read_config(&source, dry_run);

    // A bad config still gets its failure and end lines into the log file
    let (log_dir, effective_dry_run) = match &loaded {
        Ok(config) => (config.logging.dir.clone(), config.policy.dry_run),
        Err(_) => (source.log_dir_hint(), dry_run),
    };
    let log_file = init_run_logging(log_dir.as_deref(), effective_dry_run, verbosity)?;
    debug!(log_file = %log_file.display(), "Logging to file");

    let report = bracketed(effective_dry_run, || async move {
        let config = loaded.context("Invalid configuration")?;
        Reconciler::new(config).run().await
    })
    .await
    .map_err(|e| eyre!("Run failed: {:#}", e))?;

    output.report(&report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log lines in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    const YAML: &str = r#"
radarr:
  url: http://radarr:7878
  api_key: radarr-key
plex:
  url: http://plex:32400
  token: plex-token
policy:
  dry_run: false
"#;

    #[test]
    fn test_dry_run_flag_forces_dry_run() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = load_config(Some(file.path().to_path_buf()), false).unwrap();
        assert!(!config.policy.dry_run);

        let config = load_config(Some(file.path().to_path_buf()), true).unwrap();
        assert!(config.policy.dry_run);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"radarr:\n  url: http://radarr:7878\n").unwrap();

        let err = load_config(Some(file.path().to_path_buf()), false).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[tokio::test]
    async fn test_failed_pass_logs_error_then_end_line() {
        let (logs, _guard) = capture();

        let result = bracketed(false, || async {
            Err(anyhow::anyhow!("radarr unreachable"))
        })
        .await;
        assert!(result.is_err());

        let logs = logs.contents();
        let started = logs.find("run started").unwrap();
        let failed = logs.find("Run failed").unwrap();
        let ended = logs.find("run ended").unwrap();
        assert!(started < failed && failed < ended);
        assert!(logs.contains("radarr unreachable"));
        assert_eq!(logs.matches("Run failed").count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_is_reported_inside_the_pass() {
        let (logs, _guard) = capture();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", YAML.replace("dry_run: false", "dry_run: perhaps")).unwrap();
        let loaded = read_config(&ConfigSource::Yaml(file.path().to_path_buf()), false);

        let result = bracketed(false, || async move {
            let config = loaded.context("Invalid configuration")?;
            Reconciler::new(config).run().await
        })
        .await;

        assert!(result.is_err());
        let logs = logs.contents();
        assert!(logs.contains("Invalid configuration"));
        assert!(logs.contains("run ended"));
    }
}
