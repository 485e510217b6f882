//! Configuration management for Printdown
//!
//! Handles loading, saving, and managing application configuration.
//! Configuration is persisted as JSON in the platform configuration directory.

use crate::error::{ConfigError, ConfigResult};
use crate::presentation::Theme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier following reverse-DNS convention
pub const APP_ID: &str = "io.github.Printdown";

/// Maximum file size to open (in bytes) - 10MB
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default edit coalescing window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default per-item engine timeout in milliseconds
pub const DEFAULT_ENGINE_TIMEOUT_MS: u64 = 30_000;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Render pipeline configuration
    pub render: RenderConfig,

    /// File handling configuration
    pub files: FileConfig,

    /// PDF export configuration
    pub export: ExportConfig,

    /// External rendering engines
    pub engines: EngineConfig,

    /// UI configuration
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from the default location, or return defaults
    pub fn load() -> ConfigResult<Self> {
        let path = Self::config_dir()?.join("config.json");
        Self::load_from(&path)
    }

    /// Load configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;

        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::SaveError(e.to_string()))
    }

    /// Reject values that would stall or break the render pipeline
    pub fn validate(&self) -> ConfigResult<()> {
        if self.render.engine_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.engine_timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.files.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "files.max_file_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Get the configuration directory path
    pub fn config_dir() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_ID))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Get the data directory path (for session data)
    pub fn data_dir() -> ConfigResult<PathBuf> {
        dirs::data_dir()
            .map(|p| p.join(APP_ID))
            .ok_or(ConfigError::DirectoryError)
    }
}

/// Render pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Quiet period after the last edit before a render cycle starts
    pub debounce_ms: u64,

    /// Upper bound for a single math or diagram item
    pub engine_timeout_ms: u64,

    /// Duration of the layout-settle tick awaited by the completion gate
    pub layout_tick_ms: u64,

    /// Delay before re-paginating after a theme or font change
    pub pagination_settle_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            engine_timeout_ms: DEFAULT_ENGINE_TIMEOUT_MS,
            layout_tick_ms: 16,
            pagination_settle_ms: 120,
        }
    }
}

impl RenderConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_timeout_ms)
    }

    pub fn layout_tick(&self) -> Duration {
        Duration::from_millis(self.layout_tick_ms)
    }

    pub fn pagination_settle(&self) -> Duration {
        Duration::from_millis(self.pagination_settle_ms)
    }
}

/// File handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Maximum file size to open (in bytes)
    pub max_file_size: u64,

    /// Enable file watching for external changes
    pub watch_files: bool,

    /// File extensions accepted when opening files
    pub extensions: Vec<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            watch_files: true,
            extensions: vec!["md".to_string(), "markdown".to_string()],
        }
    }
}

impl FileConfig {
    /// Whether a path has one of the accepted Markdown extensions
    pub fn accepts(&self, path: &Path) -> bool {
        crate::utils::path::has_extension(path, &self.extensions)
    }
}

/// PDF export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Browser executable used as the print-to-PDF primitive
    pub browser_command: String,

    /// Extra arguments passed before the print flags
    pub browser_args: Vec<String>,

    /// Settle delay awaited by the export-side completion gate
    pub settle_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            browser_command: "chromium".to_string(),
            browser_args: vec!["--disable-gpu".to_string()],
            settle_ms: 100,
        }
    }
}

/// External programs backing the rendering engines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Math typesetter: TeX on stdin, markup on stdout
    pub math_command: Option<Vec<String>>,

    /// Flow-diagram renderer: diagram source on stdin, SVG on stdout
    pub flow_command: Option<Vec<String>>,

    /// Sequence-diagram renderer: diagram source on stdin, SVG on stdout
    pub sequence_command: Option<Vec<String>>,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Theme used when no session provides one
    pub default_theme: Theme,

    /// Paginated preview enabled by default
    pub pagination_enabled: bool,

    /// Table of contents sidebar visible by default
    pub toc_visible: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_theme: Theme::Dark,
            pagination_enabled: true,
            toc_visible: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.files.watch_files);
        assert!(config.ui.pagination_enabled);
        assert_eq!(config.render.debounce_ms, DEFAULT_DEBOUNCE_MS);
        assert!(config.engines.math_command.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config.render.engine_timeout_ms, deserialized.render.engine_timeout_ms);
        assert_eq!(config.ui.default_theme, deserialized.ui.default_theme);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"render": {"debounce_ms": 50}}"#).unwrap();
        assert_eq!(config.render.debounce_ms, 50);
        assert_eq!(config.render.engine_timeout_ms, DEFAULT_ENGINE_TIMEOUT_MS);
        assert_eq!(config.export.settle_ms, 100);
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.files.max_file_size, MAX_FILE_SIZE);
    }

    #[test]
    fn test_load_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"render": {"engine_timeout_ms": 0}}"#).unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.ui.default_theme = Theme::Nord;
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.ui.default_theme, Theme::Nord);
    }

    #[test]
    fn test_accepts_markdown_extensions() {
        let files = FileConfig::default();
        assert!(files.accepts(Path::new("/a/readme.MD")));
        assert!(files.accepts(Path::new("notes.markdown")));
        assert!(!files.accepts(Path::new("image.png")));
    }
}
