use anyhow::Result;
use std::path::{Path, PathBuf};

const LOG_FILE_NAME: &str = "radarr_janitor.log";

/// Get the container base path from environment variable, defaulting to "/app"
pub fn container_base_path() -> PathBuf {
    std::env::var("JANITOR_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

pub struct PathManager {
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?
            .join("radarr-janitor");

        Ok(Self {
            log_dir: base_dir.join("logs"),
        })
    }

    pub fn from_docker_env() -> Self {
        Self {
            log_dir: container_base_path().join("logs"),
        }
    }

    /// Configured log directory wins over the detected default.
    pub fn with_log_dir(log_dir: Option<&Path>) -> Self {
        match log_dir {
            Some(dir) => Self {
                log_dir: dir.to_path_buf(),
            },
            None => Self::default(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // The container image creates the base directory
        let base = container_base_path();
        if base.exists() {
            return Self::from_docker_env();
        }

        Self::new().unwrap_or_else(|_| Self::from_docker_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_log_dir(Some(dir.path()));
        assert_eq!(paths.log_dir(), dir.path());
        assert_eq!(paths.log_file(), dir.path().join("radarr_janitor.log"));
    }

    #[test]
    fn test_ensure_directories_creates_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("logs");
        let paths = PathManager::with_log_dir(Some(&nested));
        paths.ensure_directories().unwrap();
        assert!(nested.is_dir());
    }
}
