use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Capture settings, persisted next to the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderConfig {
    /// Drop ongoing (non-dismissible) notifications at capture time.
    pub filter_ongoing: bool,
    /// Drop `transport` (media playback) notifications at capture time.
    pub filter_transport: bool,
    /// Stop persisting captures once the store reaches this many megabytes.
    /// `None` or a negative value means unlimited.
    pub storage_limit: Option<f64>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            filter_ongoing: true,
            filter_transport: true,
            storage_limit: None,
        }
    }
}

impl ReaderConfig {
    pub fn storage_limit_bytes(&self) -> Option<u64> {
        self.storage_limit
            .filter(|mb| *mb > 0.0)
            .map(|mb| (mb * 1024.0 * 1024.0) as u64)
    }
}

pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<ReaderConfig>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring unreadable config at {}: {err}; using defaults",
                    path.display()
                );
                ReaderConfig::default()
            })
        } else {
            ReaderConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> ReaderConfig {
        self.read().clone()
    }

    pub fn update(&self, config: ReaderConfig) -> Result<()> {
        let mut guard = self.write();
        self.persist(&config)?;
        *guard = config;
        Ok(())
    }

    fn persist(&self, data: &ReaderConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, ReaderConfig> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, ReaderConfig> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_filter_ongoing_and_transport() {
        let config = ReaderConfig::default();
        assert!(config.filter_ongoing);
        assert!(config.filter_transport);
        assert_eq!(config.storage_limit_bytes(), None);
    }

    #[test]
    fn negative_limit_means_unlimited() {
        let config = ReaderConfig {
            storage_limit: Some(-1.0),
            ..ReaderConfig::default()
        };
        assert_eq!(config.storage_limit_bytes(), None);

        let config = ReaderConfig {
            storage_limit: Some(1.5),
            ..ReaderConfig::default()
        };
        assert_eq!(config.storage_limit_bytes(), Some(1_572_864));
    }

    #[test]
    fn persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notification-reader.json");

        let store = ConfigStore::new(path.clone()).unwrap();
        let updated = ReaderConfig {
            filter_ongoing: false,
            filter_transport: true,
            storage_limit: Some(64.0),
        };
        store.update(updated.clone()).unwrap();

        let reloaded = ConfigStore::new(path).unwrap();
        assert_eq!(reloaded.get(), updated);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notification-reader.json");
        fs::write(&path, "{ not json").unwrap();

        let store = ConfigStore::new(path).unwrap();
        assert_eq!(store.get(), ReaderConfig::default());
    }

    #[test]
    fn accepts_partial_documents() {
        let config: ReaderConfig = serde_json::from_str(r#"{"filterOngoing": false}"#).unwrap();
        assert!(!config.filter_ongoing);
        assert!(config.filter_transport);
    }
}
