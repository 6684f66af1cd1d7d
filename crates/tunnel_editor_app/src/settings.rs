// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings.
//!
//! Stored as RON next to the workflows the editor works on. A missing file
//! yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "tunnel_editor.ron";

/// Editor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Settings format version
    pub version: u32,
    /// Run the tunnel refresh pass on the next tick after a workflow load
    /// instead of immediately
    #[serde(default = "default_defer_propagation")]
    pub defer_propagation: bool,
    /// Maximum undo depth
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
    /// Log filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_defer_propagation() -> bool {
    true
}

fn default_history_depth() -> usize {
    100
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            defer_propagation: default_defer_propagation(),
            history_depth: default_history_depth(),
            log_filter: default_log_filter(),
        }
    }
}

impl EditorSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> std::io::Result<Self> {
        match Self::load(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings at {:?}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse settings from RON
    pub fn from_ron(content: &str) -> std::io::Result<Self> {
        let settings: EditorSettings = ron::from_str(content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        // Version check
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    settings.version, SETTINGS_FORMAT_VERSION
                ),
            ));
        }

        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EditorSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert!(settings.defer_propagation);
        assert_eq!(settings.history_depth, 100);
    }

    #[test]
    fn test_serialization() {
        let settings = EditorSettings {
            defer_propagation: false,
            ..EditorSettings::default()
        };
        let ron_str = ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default()).unwrap();
        let loaded = EditorSettings::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded = EditorSettings::from_ron("(version: 1)").unwrap();
        assert_eq!(loaded, EditorSettings::default());
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = EditorSettings::from_ron("(version: 99)").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = EditorSettings::load_or_default(Path::new("does/not/exist.ron")).unwrap();
        assert_eq!(settings, EditorSettings::default());
    }
}
