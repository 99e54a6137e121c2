//! Persistent reader settings.
//!
//! Settings are stored as TOML in the platform-specific config folder:
//! - macOS: ~/Library/Application Support/dev.csvview.csvview/
//! - Windows: %APPDATA%/csvview/csvview/config/
//! - Linux: ~/.config/csvview/

use std::fs;
use std::path::{Path, PathBuf};

use csvview_ingest::{Delimiter, LoadRequest, OnDetectFailure, SourceEncoding};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_QUALIFIER: &str = "dev";
const APP_ORG: &str = "csvview";
const APP_NAME: &str = "csvview";
const CONFIG_FILENAME: &str = "settings.toml";

/// Default number of rows shown by `preview`.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reader: ReaderSettings,
}

/// Defaults applied when a command line does not say otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    /// Encoding label used instead of detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    pub preview_rows: usize,
    pub strict_encoding: bool,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            encoding: None,
            delimiter: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            strict_encoding: false,
        }
    }
}

impl ReaderSettings {
    /// Configured encoding, ignoring labels that do not parse.
    pub fn encoding(&self) -> Option<SourceEncoding> {
        let label = self.encoding.as_deref()?;
        match label.parse() {
            Ok(encoding) => Some(encoding),
            Err(e) => {
                tracing::warn!("Ignoring encoding setting: {}", e);
                None
            }
        }
    }

    /// Configured delimiter, ignoring characters that cannot separate fields.
    pub fn delimiter(&self) -> Option<Delimiter> {
        let ch = self.delimiter?;
        match Delimiter::try_from(ch) {
            Ok(delimiter) => Some(delimiter),
            Err(e) => {
                tracing::warn!("Ignoring delimiter setting: {}", e);
                None
            }
        }
    }

    /// Builds a load request, command-line values taking precedence.
    pub fn load_request(
        &self,
        path: &Path,
        encoding: Option<SourceEncoding>,
        delimiter: Option<Delimiter>,
        strict_encoding: bool,
    ) -> LoadRequest {
        let mut request = LoadRequest::new(path);
        request.encoding = encoding.or_else(|| self.encoding());
        request.delimiter = delimiter.or_else(|| self.delimiter());
        request.on_detect_failure = if strict_encoding || self.strict_encoding {
            OnDetectFailure::Fail
        } else {
            OnDetectFailure::UseFallback
        };
        request
    }
}

/// Get the path to the settings file.
///
/// Returns `None` if the platform-specific directory cannot be determined.
pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Load settings from `path`, or from the default location.
///
/// Never fails: a missing, unreadable or malformed file yields defaults.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match settings_path() {
            Some(path) => path,
            None => {
                tracing::warn!("Could not determine settings path, using defaults");
                return Settings::default();
            }
        },
    };

    match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                tracing::debug!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                Settings::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No settings file found at {:?}, using defaults", path);
            Settings::default()
        }
        Err(e) => {
            tracing::warn!("Failed to read settings file: {}, using defaults", e);
            Settings::default()
        }
    }
}

/// Save settings to `path`, or to the default location.
///
/// Creates the parent directory if it doesn't exist.
pub fn save_settings(settings: &Settings, path: Option<&Path>) -> Result<(), String> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => settings_path().ok_or_else(|| "Could not determine settings path".to_string())?,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let content = toml::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    fs::write(&path, content).map_err(|e| format!("Failed to write settings file: {}", e))?;

    tracing::info!("Saved settings to {:?}", path);
    Ok(())
}
