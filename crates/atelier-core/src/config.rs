//! Studio configuration.
//!
//! All sections have full defaults so a missing or partial TOML file still
//! yields a working configuration. The API key is resolved by the shell
//! (environment first, config second) and injected into the client; it is
//! carried here only so a config file can supply one.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Backing model ids, one per generation pathway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelCatalog {
    pub video: String,
    pub image_edit: String,
    pub image_gen: String,
    pub analyze: String,
    pub maps: String,
    pub search: String,
    pub ui: String,
    pub chat: String,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            video: "veo-3.1-fast-generate-preview".to_string(),
            image_edit: "gemini-2.5-flash-image".to_string(),
            image_gen: "gemini-3-pro-image-preview".to_string(),
            analyze: "gemini-3-pro-preview".to_string(),
            maps: "gemini-2.5-flash".to_string(),
            search: "gemini-3-flash-preview".to_string(),
            ui: "gemini-3-flash-preview".to_string(),
            chat: "gemini-2.5-flash-lite-latest".to_string(),
        }
    }
}

/// Requested output resolution for still image generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    /// The wire value the generation API expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        ImageSize::OneK
    }
}

/// Fixed parameters sent with every video job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub number_of_videos: u32,
    /// 1080p is slower; 720p keeps preview latency acceptable
    pub resolution: String,
    pub aspect_ratio: String,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            number_of_videos: 1,
            resolution: "720p".to_string(),
            aspect_ratio: "16:9".to_string(),
        }
    }
}

/// Knobs shared by the generation pathways.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GenerationSettings {
    pub image_size: ImageSize,
    /// When true, UI generation fans out three concurrent style variations
    /// per session instead of a single artifact.
    pub variations: bool,
    pub video: VideoSettings,
}

/// Bounds for the video job poll loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub interval_secs: u64,
    /// Poll attempts before the job is declared timed out.
    pub max_polls: u32,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_polls: 60,
        }
    }
}

/// Placeholder deck rotation and startup refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderSettings {
    pub rotate_secs: u64,
    /// Ask the chat model for a fresh prompt batch once at startup.
    pub refresh_on_start: bool,
}

impl Default for PlaceholderSettings {
    fn default() -> Self {
        Self {
            rotate_secs: 6,
            refresh_on_start: true,
        }
    }
}

/// Where and how much session history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Overrides the platform data directory when set.
    pub data_dir: Option<PathBuf>,
    /// Retention cap: persisting keeps only the most recent N sessions.
    pub max_sessions: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_sessions: 100,
        }
    }
}

/// Root configuration for the studio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StudioConfig {
    /// Generation API key; the `GEMINI_API_KEY` environment variable takes
    /// precedence when both are present.
    pub api_key: Option<String>,
    pub models: ModelCatalog,
    pub generation: GenerationSettings,
    pub polling: PollingSettings,
    pub placeholders: PlaceholderSettings,
    pub storage: StorageSettings,
}
