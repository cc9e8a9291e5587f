//! Persisted CLI configuration.
//!
//! Read from `~/.config/estuary/config.toml` at startup. A missing file is
//! created with defaults; an invalid file is a startup error. The current
//! user is written back here by `register` and `login`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::{EstuaryError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the default database location under the data directory.
    pub db_path: Option<PathBuf>,
    /// The user commands act as. Set by `register`/`login`.
    pub current_user: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)
            .map_err(|e| EstuaryError::Config(format!("{}: {e}", path.display())))?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| EstuaryError::Config(e.to_string()))?;
        fs::write(path, content)?;

        Ok(())
    }

    /// `~/.config/estuary/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| EstuaryError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("estuary").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_creates_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load(&path).unwrap();
        assert!(config.current_user.is_none());
        assert!(config.db_path.is_none());
        assert!(path.exists());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.current_user = Some("alice".into());
        config.db_path = Some(PathBuf::from("/tmp/estuary.db"));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.current_user.as_deref(), Some("alice"));
        assert_eq!(loaded.db_path.as_deref(), Some(Path::new("/tmp/estuary.db")));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "current_user = [not toml").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(EstuaryError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_fields_ignored_missing_fields_defaulted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "future_knob = 3\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.current_user.is_none());
    }
}
