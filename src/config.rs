// Configuration loaded from YAML

use crate::backend::{self, Backend, FileBackend, MemoryBackend, SqliteBackend};
use crate::store::{DEFAULT_KEY, RecordStore};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

const APP_DIR: &str = "vitalstore";
const CONFIG_FILE: &str = "config.yaml";
const SQLITE_FILE: &str = "vitalstore.db";

/// Which backing store entries are persisted to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Sqlite,
    Memory,
}

impl FromStr for BackendKind {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(eyre!("Unknown backend: {} (expected file, sqlite or memory)", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => write!(f, "file"),
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendKind,
    /// Directory holding the data files; platform data dir when unset
    pub data_dir: Option<PathBuf>,
    pub key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_dir: None,
            key: DEFAULT_KEY.to_string(),
        }
    }
}

impl Config {
    /// Default config file location, e.g. `~/.config/vitalstore/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load config from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(file = ?path, "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };

        let config: Self =
            serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))?;
        backend::validate_key(&config.key)?;
        if config.backend == BackendKind::Memory {
            return Err(eyre!(
                "{}: backend `memory` does not save anything; use --backend memory for a dry run",
                path.display()
            ));
        }
        Ok(config)
    }

    /// Write config to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Directory data files live in
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| eyre!("Could not determine a data directory; set data_dir in the config")),
        }
    }

    /// Open the configured backend and load a store from it
    pub fn open_store(&self) -> Result<RecordStore<Box<dyn Backend>>> {
        let backend: Box<dyn Backend> = match self.backend {
            BackendKind::File => Box::new(FileBackend::open(self.resolve_data_dir()?)?),
            BackendKind::Sqlite => {
                let dir = self.resolve_data_dir()?;
                fs::create_dir_all(&dir).context("Failed to create data directory")?;
                Box::new(SqliteBackend::open(dir.join(SQLITE_FILE))?)
            }
            BackendKind::Memory => {
                warn!("Using the memory backend, changes will not be saved");
                Box::new(MemoryBackend::new())
            }
        };

        Ok(RecordStore::open_with_key(backend, self.key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();

        let config = Config::load(&temp.path().join("missing.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.key, "vital_signs");
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.yaml");

        let config = Config {
            backend: BackendKind::Sqlite,
            data_dir: Some(temp.path().join("data")),
            key: "readings".to_string(),
        };
        config.save(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("backend: sqlite"));

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "backend: sqlite\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.key, DEFAULT_KEY);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_load_rejects_memory_backend() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "backend: memory\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("--backend memory"));
    }

    #[test]
    fn test_open_store_memory_backend_when_overridden() {
        let config = Config {
            backend: BackendKind::Memory,
            ..Config::default()
        };

        let mut store = config.open_store().unwrap();
        store.insert("36.5", "120/80", "75");
        assert_eq!(store.len(), 1);

        assert!(config.open_store().unwrap().is_empty());
    }

    #[test]
    fn test_load_rejects_bad_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "key: ../escape\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("file".parse::<BackendKind>().unwrap(), BackendKind::File);
        assert_eq!("SQLite".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
        assert_eq!(BackendKind::Memory.to_string(), "memory");
        assert!("redis".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_open_store_file_backend() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            data_dir: Some(temp.path().to_path_buf()),
            ..Config::default()
        };

        let mut store = config.open_store().unwrap();
        store.insert("36.5", "120/80", "75");
        drop(store);

        let store = config.open_store().unwrap();
        assert_eq!(store.len(), 1);
        assert!(temp.path().join("vital_signs.json").exists());
    }

    #[test]
    fn test_open_store_sqlite_backend() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            backend: BackendKind::Sqlite,
            data_dir: Some(temp.path().join("data")),
            ..Config::default()
        };

        let mut store = config.open_store().unwrap();
        store.insert("36.5", "120/80", "75");
        drop(store);

        let store = config.open_store().unwrap();
        assert_eq!(store.len(), 1);
        assert!(temp.path().join("data").join(SQLITE_FILE).exists());
    }
}
