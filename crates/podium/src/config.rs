//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! [storage]
//! data_dir = "data"
//!
//! [render]
//! media_root = "media"
//! default_font = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"
//!
//! [live]
//! idle_timeout_secs = 300
//! channel_capacity = 64
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::live::DEFAULT_CHANNEL_CAPACITY;

/// Fonts tried when no default font is configured
pub(crate) const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Holds `roster.json`, `scores.json` and `themes.json`
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl StorageConfig {
    pub fn roster_path(&self) -> PathBuf {
        self.data_dir.join("roster.json")
    }

    pub fn scores_path(&self) -> PathBuf {
        self.data_dir.join("scores.json")
    }

    pub fn themes_path(&self) -> PathBuf {
        self.data_dir.join("themes.json")
    }

    /// Lock file serializing writers across processes
    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join(".podium.lock")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Root directory that asset references are resolved against
    pub media_root: PathBuf,
    pub default_font: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            default_font: None,
        }
    }
}

impl RenderConfig {
    /// The configured default font, or the first known system font present.
    pub fn resolve_default_font(&self) -> Option<PathBuf> {
        if let Some(path) = &self.default_font {
            return Some(path.clone());
        }
        SYSTEM_FONTS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Seconds without a change before a standings feed ends
    pub idle_timeout_secs: u64,
    pub channel_capacity: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 300,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl LiveConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub render: RenderConfig,
    pub live: LiveConfig,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration, falling back to defaults when the file is missing.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loaded config from {}", path.display());
                Self::from_toml(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Builder for [`Config`]
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    data_dir: Option<PathBuf>,
    media_root: Option<PathBuf>,
    default_font: Option<PathBuf>,
    idle_timeout: Option<Duration>,
    channel_capacity: Option<usize>,
}

impl ConfigBuilder {
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    pub fn media_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.media_root = Some(path.into());
        self
    }

    pub fn default_font<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.default_font = Some(path.into());
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Config {
        let default = Config::default();
        Config {
            storage: StorageConfig {
                data_dir: self.data_dir.unwrap_or(default.storage.data_dir),
            },
            render: RenderConfig {
                media_root: self.media_root.unwrap_or(default.render.media_root),
                default_font: self.default_font.or(default.render.default_font),
            },
            live: LiveConfig {
                idle_timeout_secs: self
                    .idle_timeout
                    .map_or(default.live.idle_timeout_secs, |d| d.as_secs()),
                channel_capacity: self
                    .channel_capacity
                    .unwrap_or(default.live.channel_capacity),
            },
        }
    }
}
