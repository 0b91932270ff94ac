#![forbid(unsafe_code)]

//! Adapter configuration.
//!
//! Captures the tunable behavior of [`ImeAdapter`](crate::adapter::ImeAdapter)
//! as a single [`AdapterConfig`] that can be loaded from TOML or JSON at
//! startup (behind the `config` feature).
//!
//! # Loading
//!
//! ```toml
//! # imesync.toml
//! show_keyboard_on_focus = false
//! sanitize_single_line = true
//! hide_keyboard_on_unselect = true
//! max_queued_compositions = 64
//! ```
//!
//! ```rust,ignore
//! let config = AdapterConfig::from_toml_file("imesync.toml")?;
//! let config = AdapterConfig::from_json_str(json)?;
//! ```

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Default bound of the composition queue.
pub const DEFAULT_MAX_QUEUED_COMPOSITIONS: usize = 64;

/// Tunable adapter behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct AdapterConfig {
    /// Show the keyboard on programmatic focus too, not just on user gestures.
    pub show_keyboard_on_focus: bool,

    /// Map line breaks and tabs to spaces (and drop other control
    /// characters) in single-line fields.
    pub sanitize_single_line: bool,

    /// Hide the keyboard after `unselect`.
    pub hide_keyboard_on_unselect: bool,

    /// Maximum pending composition updates; the oldest is dropped beyond it.
    pub max_queued_compositions: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            show_keyboard_on_focus: false,
            sanitize_single_line: true,
            hide_keyboard_on_unselect: true,
            max_queued_compositions: DEFAULT_MAX_QUEUED_COMPOSITIONS,
        }
    }
}

impl AdapterConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set keyboard-on-programmatic-focus (builder).
    #[must_use]
    pub fn show_keyboard_on_focus(mut self, show: bool) -> Self {
        self.show_keyboard_on_focus = show;
        self
    }

    /// Set single-line sanitization (builder).
    #[must_use]
    pub fn sanitize_single_line(mut self, sanitize: bool) -> Self {
        self.sanitize_single_line = sanitize;
        self
    }

    /// Set keyboard hiding after unselect (builder).
    #[must_use]
    pub fn hide_keyboard_on_unselect(mut self, hide: bool) -> Self {
        self.hide_keyboard_on_unselect = hide;
        self
    }

    /// Set the composition queue bound (builder).
    #[must_use]
    pub fn max_queued_compositions(mut self, max: usize) -> Self {
        self.max_queued_compositions = max;
        self
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(s)?.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(s)?.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Serialize to a TOML string.
    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_queued_compositions == 0 {
            errors.push("max_queued_compositions must be at least 1".to_owned());
        }
        errors
    }

    /// Return `self` if valid, otherwise the validation errors.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors from loading an [`AdapterConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[cfg(feature = "config")]
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// JSON parse error.
    #[cfg(feature = "config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation errors.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AdapterConfig::default();
        assert!(config.validate().is_empty());
        assert!(!config.show_keyboard_on_focus);
        assert!(config.sanitize_single_line);
        assert!(config.hide_keyboard_on_unselect);
        assert_eq!(config.max_queued_compositions, DEFAULT_MAX_QUEUED_COMPOSITIONS);
    }

    #[test]
    fn zero_queue_is_rejected() {
        let err = AdapterConfig::new()
            .max_queued_compositions(0)
            .validated()
            .expect_err("zero queue");
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
        assert!(err.to_string().contains("max_queued_compositions"));
    }

    #[test]
    fn builders_chain() {
        let config = AdapterConfig::new()
            .show_keyboard_on_focus(true)
            .sanitize_single_line(false)
            .hide_keyboard_on_unselect(false)
            .max_queued_compositions(8);
        assert!(config.show_keyboard_on_focus);
        assert!(!config.sanitize_single_line);
        assert!(!config.hide_keyboard_on_unselect);
        assert_eq!(config.max_queued_compositions, 8);
    }

    #[cfg(feature = "config")]
    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AdapterConfig::from_toml_str("show_keyboard_on_focus = true\n")
            .expect("parse toml");
        assert!(config.show_keyboard_on_focus);
        assert_eq!(config.max_queued_compositions, DEFAULT_MAX_QUEUED_COMPOSITIONS);
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_round_trip_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("imesync.json");
        std::fs::write(&path, r#"{"max_queued_compositions": 4}"#).expect("write");
        let config = AdapterConfig::from_json_file(&path).expect("load json");
        assert_eq!(config.max_queued_compositions, 4);
        assert!(config.sanitize_single_line);
    }

    #[cfg(feature = "config")]
    #[test]
    fn invalid_toml_reports_parse_error() {
        let err = AdapterConfig::from_toml_str("max_queued_compositions = \"lots\"")
            .expect_err("type mismatch");
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[cfg(feature = "config")]
    #[test]
    fn toml_validation_runs_on_load() {
        let err = AdapterConfig::from_toml_str("max_queued_compositions = 0")
            .expect_err("invalid");
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[cfg(feature = "config")]
    #[test]
    fn missing_file_is_io_error() {
        let err = AdapterConfig::from_toml_file("/definitely/not/here.toml").expect_err("missing");
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
