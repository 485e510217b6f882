//! Session persistence
//!
//! The session record carries an explicit schema version. Records written
//! before versioning existed are migrated field by field; records from a
//! newer version are rejected rather than half-understood.

use super::ApplicationState;
use crate::config::Config;
use crate::error::SessionError;
use crate::presentation::{FontScale, ImageScale, PageSettings, Theme};
use crate::render::ImageWidths;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Current session schema version
pub const SESSION_VERSION: u32 = 1;

/// Session state that can be serialized and restored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    /// Session version for migration
    pub version: u32,

    /// Open documents (file paths) in tab order
    pub open_paths: Vec<PathBuf>,

    /// Active document index in open_paths
    pub active_index: Option<usize>,

    pub theme: Theme,

    pub font_scale_factor: FontScale,

    pub image_scale_factor: ImageScale,

    pub page_settings: PageSettings,

    pub pagination_enabled: bool,

    pub image_widths: ImageWidths,

    pub saved_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            version: SESSION_VERSION,
            open_paths: Vec::new(),
            active_index: None,
            theme: Theme::default(),
            font_scale_factor: FontScale::default(),
            image_scale_factor: ImageScale::default(),
            page_settings: PageSettings::default(),
            pagination_enabled: true,
            image_widths: ImageWidths::default(),
            saved_at: None,
        }
    }
}

impl SessionRecord {
    /// Snapshot of the persisted parts of the application state
    pub fn capture(state: &ApplicationState) -> Self {
        let open_paths = state.open_paths();
        let active_index = state
            .active_document()
            .and_then(|doc| doc.path.as_ref())
            .and_then(|active| open_paths.iter().position(|p| p == active));

        Self {
            version: SESSION_VERSION,
            open_paths,
            active_index,
            theme: state.presentation.theme,
            font_scale_factor: state.presentation.font_scale,
            image_scale_factor: state.presentation.image_scale,
            page_settings: state.presentation.page.clone(),
            pagination_enabled: state.pagination_enabled,
            image_widths: state.image_widths.clone(),
            saved_at: Some(chrono::Utc::now()),
        }
    }

    /// Restore presentation settings; documents are reopened by the caller
    pub fn apply_presentation(&self, state: &mut ApplicationState) {
        state.presentation.theme = self.theme;
        state.presentation.font_scale = self.font_scale_factor;
        state.presentation.image_scale = self.image_scale_factor;
        if self.page_settings.validate().is_ok() {
            state.presentation.page = self.page_settings.clone();
        } else {
            log::warn!("Ignoring invalid page settings in session");
        }
        state.pagination_enabled = self.pagination_enabled;
        state.image_widths = self.image_widths.clone();
    }

    /// Parse a stored session, migrating unversioned records
    pub fn from_json(content: &str) -> Result<Self, SessionError> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| SessionError::ParseError(e.to_string()))?;

        let Some(version) = value.get("version") else {
            log::info!("Migrating unversioned session record");
            return Ok(Self::from_legacy(&value));
        };

        let found = version
            .as_u64()
            .ok_or_else(|| SessionError::ParseError("version is not a number".to_string()))?;
        if found > SESSION_VERSION as u64 {
            return Err(SessionError::UnsupportedVersion {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                supported: SESSION_VERSION,
            });
        }

        serde_json::from_value(value).map_err(|e| SessionError::ParseError(e.to_string()))
    }

    /// Best-effort read of the legacy shape
    /// (`openFiles`, `activeIndex`, `theme`, `fontSizeFactor`, `imageScaleFactor`)
    fn from_legacy(value: &Value) -> Self {
        let open_paths: Vec<PathBuf> = value
            .get("openFiles")
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(Value::as_str)
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        let active_index = value
            .get("activeIndex")
            .and_then(Value::as_u64)
            .map(|i| i as usize)
            .filter(|i| *i < open_paths.len());

        let theme = value
            .get("theme")
            .and_then(Value::as_str)
            .and_then(|name| name.parse::<Theme>().ok())
            .unwrap_or_default();

        let font_scale_factor = value
            .get("fontSizeFactor")
            .and_then(Value::as_f64)
            .map(|f| FontScale::new(f as f32))
            .unwrap_or_default();

        let image_scale_factor = value
            .get("imageScaleFactor")
            .and_then(Value::as_f64)
            .map(|f| ImageScale::new(f as f32))
            .unwrap_or_default();

        Self {
            open_paths,
            active_index,
            theme,
            font_scale_factor,
            image_scale_factor,
            ..Self::default()
        }
    }
}

/// Reads and writes the session file
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/<APP_ID>/session.json`
    pub fn default_location() -> Result<Self, SessionError> {
        Config::data_dir()
            .map(|dir| Self::new(dir.join("session.json")))
            .map_err(|_| SessionError::DirectoryError)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load session state from disk; a missing file is an empty session
    pub fn load(&self) -> Result<SessionRecord, SessionError> {
        if !self.path.exists() {
            return Ok(SessionRecord::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| SessionError::LoadError(e.to_string()))?;
        SessionRecord::from_json(&content)
    }

    /// Load, starting empty on any failure
    pub fn load_or_default(&self) -> SessionRecord {
        self.load().unwrap_or_else(|e| {
            log::warn!("{}; starting with an empty session", e);
            SessionRecord::default()
        })
    }

    /// Save session state to disk
    pub fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SessionError::SaveError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| SessionError::SaveError(e.to_string()))?;

        std::fs::write(&self.path, content)
            .map_err(|e| SessionError::SaveError(e.to_string()))?;

        log::debug!("Session saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::PageSize;
    use crate::state::Document;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));

        let mut record = SessionRecord {
            open_paths: vec![PathBuf::from("/a.md"), PathBuf::from("/b.md")],
            active_index: Some(1),
            theme: Theme::Nord,
            font_scale_factor: FontScale::new(1.25),
            image_scale_factor: ImageScale::new(0.6),
            pagination_enabled: false,
            ..SessionRecord::default()
        };
        record.page_settings.size = PageSize::A4;
        record.image_widths.set("img/a.png", 60.0);

        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap(), record);
    }

    #[test]
    fn test_missing_and_corrupt_files_start_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert_eq!(store.load().unwrap(), SessionRecord::default());

        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(SessionError::ParseError(_))));
        assert_eq!(store.load_or_default(), SessionRecord::default());
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = SessionRecord::from_json(r#"{"version": 7, "open_paths": ["/a.md"]}"#).unwrap_err();
        assert!(matches!(
            err,
            SessionError::UnsupportedVersion { found: 7, supported: 1 }
        ));
    }

    #[test]
    fn test_legacy_record_is_migrated() {
        let record = SessionRecord::from_json(
            r#"{"openFiles": ["/a.md", 3, "/b.md"], "activeIndex": 1,
                "theme": "dracula", "fontSizeFactor": 1.1, "imageScaleFactor": 9}"#,
        )
        .unwrap();
        assert_eq!(record.version, SESSION_VERSION);
        assert_eq!(record.open_paths, vec![PathBuf::from("/a.md"), PathBuf::from("/b.md")]);
        assert_eq!(record.active_index, Some(1));
        assert_eq!(record.theme, Theme::Dracula);
        assert_eq!(record.font_scale_factor, FontScale::new(1.1));
        assert_eq!(record.image_scale_factor.value(), ImageScale::MAX);

        let partial = SessionRecord::from_json(r#"{"theme": "no-such", "activeIndex": 4}"#).unwrap();
        assert_eq!(partial.theme, Theme::default());
        assert_eq!(partial.active_index, None);
    }

    #[test]
    fn test_capture_and_apply() {
        let mut state = ApplicationState::default();
        state.add_document(Document::from_file(PathBuf::from("/a.md"), "", None));
        state.add_document(Document::new());
        state.add_document(Document::from_file(PathBuf::from("/b.md"), "", None));
        state.presentation.theme = Theme::Sepia;
        state.presentation.image_scale.decrease();

        let record = SessionRecord::capture(&state);
        assert_eq!(record.open_paths, vec![PathBuf::from("/a.md"), PathBuf::from("/b.md")]);
        assert_eq!(record.active_index, Some(1));
        assert!(record.saved_at.is_some());

        let mut restored = ApplicationState::default();
        record.apply_presentation(&mut restored);
        assert_eq!(restored.presentation.theme, Theme::Sepia);
        assert_eq!(restored.presentation.image_scale, ImageScale::new(0.9));
    }

    #[test]
    fn test_record_without_image_scale_uses_default() {
        let record =
            SessionRecord::from_json(r#"{"version": 1, "font_scale_factor": 1.2}"#).unwrap();
        assert_eq!(record.image_scale_factor, ImageScale::default());
        assert_eq!(record.font_scale_factor, FontScale::new(1.2));
    }
}
