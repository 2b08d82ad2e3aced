//! Runtime configuration.
//!
//! Defaults suit running from the project directory; each path and the log
//! level can be overridden through `STUDYNOTE_*` environment variables.

use crate::logging::default_log_level;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "STUDYNOTE_DATA_DIR";
pub const TEST_DIR_ENV: &str = "STUDYNOTE_TEST_DIR";
pub const EXPORT_DIR_ENV: &str = "STUDYNOTE_EXPORT_DIR";
pub const LOG_LEVEL_ENV: &str = "STUDYNOTE_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "STUDYNOTE_LOG_DIR";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TEST_DIR: &str = "testdata";
const DEFAULT_EXPORT_DIR: &str = "export";
const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Production storage root.
    pub data_dir: PathBuf,
    /// Sandbox root used while test mode is active. Deleted on exit.
    pub test_dir: PathBuf,
    /// Folder the `export` command copies topic files into.
    pub export_dir: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            test_dir: PathBuf::from(DEFAULT_TEST_DIR),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            log_level: default_log_level().to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by whichever `STUDYNOTE_*` variables are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();
        Self {
            data_dir: non_empty(DATA_DIR_ENV).map_or(defaults.data_dir, PathBuf::from),
            test_dir: non_empty(TEST_DIR_ENV).map_or(defaults.test_dir, PathBuf::from),
            export_dir: non_empty(EXPORT_DIR_ENV).map_or(defaults.export_dir, PathBuf::from),
            log_level: non_empty(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: non_empty(LOG_DIR_ENV).map_or(defaults.log_dir, PathBuf::from),
        }
    }

    /// Log directory made absolute against `cwd`.
    pub fn absolute_log_dir(&self, cwd: &Path) -> PathBuf {
        if self.log_dir.is_absolute() {
            self.log_dir.clone()
        } else {
            cwd.join(&self.log_dir)
        }
    }
}
