//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the studio configuration
//! from the configuration file (~/.config/atelier/config.toml), writing a
//! default file on first run.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use atelier_core::config::StudioConfig;
use atelier_core::{Result, StudioError};

use crate::paths::AtelierPaths;

/// Configuration service that loads and caches the studio configuration.
///
/// The configuration is read from config.toml and cached to avoid repeated
/// file I/O operations.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    /// Uses RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<StudioConfig>>>,
}

impl ConfigService {
    /// Creates a service reading from the default location.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(AtelierPaths::config_file()?))
    }

    /// Creates a service reading from an explicit path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// Falls back to defaults when the file cannot be loaded or parsed.
    pub fn get_config(&self) -> StudioConfig {
        // Check if already cached
        {
            let read_lock = self.config.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load_or_init().unwrap_or_else(|err| {
            tracing::warn!("Falling back to default configuration: {err}");
            StudioConfig::default()
        });

        // Cache it
        {
            let mut write_lock = self.config.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap();
        *write_lock = None;
    }

    /// Persists the configuration and refreshes the cache.
    pub fn save(&self, config: &StudioConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                StudioError::io(format!("Failed to create config directory: {err}"))
            })?;
        }

        let rendered = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, rendered)
            .map_err(|err| StudioError::io(format!("Failed to write config file: {err}")))?;

        let mut write_lock = self.config.write().unwrap();
        *write_lock = Some(config.clone());
        Ok(())
    }

    /// Loads the configuration file, writing a default one if missing.
    fn load_or_init(&self) -> Result<StudioConfig> {
        if !self.path.exists() {
            let default_config = StudioConfig::default();
            self.save(&default_config)?;
            return Ok(default_config);
        }

        let raw = std::fs::read_to_string(&self.path)
            .map_err(|err| StudioError::io(format!("Failed to read config file: {err}")))?;
        Ok(toml::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::config::ImageSize;
    use tempfile::TempDir;

    #[test]
    fn test_first_access_writes_default_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());

        let config = service.get_config();

        assert_eq!(config, StudioConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_existing_file_is_honored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [generation]
            image_size = "4K"
            variations = true
            "#,
        )
        .unwrap();

        let service = ConfigService::with_path(path);
        let config = service.get_config();

        assert_eq!(config.generation.image_size, ImageSize::FourK);
        assert!(config.generation.variations);
        // Untouched sections keep their defaults.
        assert_eq!(config.polling.interval_secs, 5);
    }

    #[test]
    fn test_save_then_reload_after_invalidation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::with_path(path);

        let mut config = service.get_config();
        config.generation.variations = true;
        service.save(&config).unwrap();

        service.invalidate_cache();
        assert!(service.get_config().generation.variations);
    }

    #[test]
    fn test_unparseable_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "this is [not valid toml").unwrap();

        let service = ConfigService::with_path(path);
        assert_eq!(service.get_config(), StudioConfig::default());
    }
}
