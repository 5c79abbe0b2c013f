//! Runtime configuration.
//!
//! Precedence, highest first: explicit overrides (CLI flags), environment
//! variables, platform defaults.
//!
//! | Setting | Env | Default |
//! |---|---|---|
//! | database | `DAILYDO_DB_PATH` | `<data_dir>/dailydo/dailydo.sqlite3` |
//! | log level | `DAILYDO_LOG_LEVEL` | `debug` (debug build) / `info` |
//! | log dir | `DAILYDO_LOG_DIR` | `<data_dir>/dailydo/logs` |
//!
//! `<data_dir>` comes from `dirs::data_dir()`, falling back to the system
//! temp directory when the platform has none.

use crate::logging::default_log_level;
use crate::scheduler::ResetSchedule;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "DAILYDO_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "DAILYDO_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "DAILYDO_LOG_DIR";

const APP_DIR_NAME: &str = "dailydo";
const DB_FILE_NAME: &str = "dailydo.sqlite3";

/// Values supplied by the caller that win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

/// Fully resolved settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub schedule: ResetSchedule,
}

#[derive(Debug)]
pub enum ConfigError {
    CreateDir { dir: PathBuf, source: std::io::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateDir { dir, source } => {
                write!(f, "failed to create directory `{}`: {source}", dir.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
        }
    }
}

impl AppConfig {
    /// Resolves against the process environment.
    pub fn resolve(overrides: ConfigOverrides) -> Self {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolves against `env`; blank values count as unset.
    pub fn resolve_with<F>(overrides: ConfigOverrides, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| env(key).filter(|value| !value.trim().is_empty());
        let app_dir = app_data_dir();

        let db_path = overrides
            .db_path
            .or_else(|| env_value(DB_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| app_dir.join(DB_FILE_NAME));
        let log_level = overrides
            .log_level
            .or_else(|| env_value(LOG_LEVEL_ENV))
            .unwrap_or_else(|| default_log_level().to_string());
        let log_dir = overrides
            .log_dir
            .or_else(|| env_value(LOG_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| app_dir.join("logs"));

        Self {
            db_path,
            log_level,
            log_dir: absolutize(log_dir),
            schedule: ResetSchedule::default(),
        }
    }

    /// Creates the database's parent directory and the log directory.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        let db_parent = self
            .db_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty());
        for dir in db_parent.into_iter().chain([self.log_dir.as_path()]) {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                dir: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

/// `<platform data dir>/dailydo`, or `<temp>/dailydo` without one.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

// The logger only accepts absolute directories.
fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}
