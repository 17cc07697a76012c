//! Unified path management for Atelier configuration and data files.
//!
//! Configuration lives under the platform config directory, archived session
//! data under the platform data directory.

use std::path::PathBuf;

use atelier_core::{Result, StudioError};

/// Unified path management for the studio.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/atelier/           # Config directory
/// └── config.toml              # Application configuration
///
/// ~/.local/share/atelier/      # Data directory
/// └── store/                   # Key-value store files (session archive)
/// ```
pub struct AtelierPaths;

impl AtelierPaths {
    /// Returns the studio configuration directory.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("atelier"))
            .ok_or_else(|| StudioError::config("Cannot find config directory"))
    }

    /// Returns the studio data directory.
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("atelier"))
            .ok_or_else(|| StudioError::config("Cannot find data directory"))
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the key-value store directory backing the session archive.
    pub fn store_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("store"))
    }
}
