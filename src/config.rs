use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::target::Mode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("word count must be positive")]
    ZeroWords,
    #[error("seconds must be positive")]
    ZeroSeconds,
    #[error("failed to write config")]
    Io(#[from] io::Error),
    #[error("failed to serialize config")]
    Json(#[from] serde_json::Error),
}

/// Persistent defaults for `mtype test`. Missing keys take their default,
/// so a config file only needs the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub seconds: u64,
    pub words: usize,
    /// Seconds of countdown before the test; 0 disables it
    pub countdown: u64,
    pub no_color: bool,
    /// Wrap column for the prompt; 0 follows the terminal width
    pub wrap: u16,
    pub chart: bool,
    pub words_file: Option<PathBuf>,
    pub quotes_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Words,
            seconds: 30,
            words: 25,
            countdown: 3,
            no_color: false,
            wrap: 0,
            chart: true,
            words_file: None,
            quotes_file: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.words == 0 {
            return Err(ConfigError::ZeroWords);
        }
        if self.seconds == 0 {
            return Err(ConfigError::ZeroSeconds);
        }
        Ok(())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("mtype_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(target: "config", path = %self.path.display(), error = %err, "config_invalid_using_defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            mode: Mode::Timer,
            seconds: 60,
            words: 50,
            countdown: 0,
            no_color: true,
            wrap: 72,
            chart: false,
            words_file: Some(PathBuf::from("/tmp/words.txt")),
            quotes_file: None,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn invalid_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "mode = words").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"mode": "quote", "countdown": 0}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.mode, Mode::Quote);
        assert_eq!(cfg.countdown, 0);
        assert_eq!(cfg.words, 25);
        assert!(cfg.chart);
    }

    #[test]
    fn validate_rejects_zero_counts() {
        assert!(Config::default().validate().is_ok());
        let cfg = Config {
            words: 0,
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(ConfigError::ZeroWords));
        let cfg = Config {
            seconds: 0,
            ..Config::default()
        };
        assert_matches!(cfg.validate(), Err(ConfigError::ZeroSeconds));
    }
}
