// Application settings
// Loaded from ~/.config/tagcalc/settings.json

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};
use tagcalc_engine::{DisplayMode, EditorOptions};

/// Overrides `suggest.endpoint` when set.
pub const ENDPOINT_ENV: &str = "TAGCALC_SUGGEST_ENDPOINT";

pub const DEFAULT_ENDPOINT: &str = "https://652f91320b8d8ddac0b2b62b.mockapi.io/autocomplete";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Autocomplete source
    #[serde(rename = "suggest.endpoint")]
    pub suggest_endpoint: String,

    /// How long a fetched suggestion list stays fresh for its query
    #[serde(rename = "suggest.staleSeconds")]
    pub suggest_stale_seconds: u64,

    #[serde(rename = "suggest.timeoutSeconds")]
    pub suggest_timeout_seconds: u64,

    // Input
    #[serde(rename = "input.maxLength")]
    pub max_input_length: usize,

    #[serde(rename = "input.defaultNumberMode")]
    pub default_number_mode: DisplayMode,

    #[serde(rename = "input.strictOperators")]
    pub strict_operators: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let editor = EditorOptions::default();
        Self {
            suggest_endpoint: DEFAULT_ENDPOINT.to_string(),
            suggest_stale_seconds: 60,
            suggest_timeout_seconds: 10,
            max_input_length: editor.max_input_len,
            default_number_mode: editor.default_number_mode,
            strict_operators: editor.strict_operators,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tagcalc");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, creating it on first run,
    /// then apply environment overrides.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            if let Err(e) = settings.create_default_file(&path) {
                warn!("could not write default settings to {}: {}", path.display(), e);
            }
            return settings.with_env_overrides();
        }

        Self::load_from(&path).with_env_overrides()
    }

    /// Load settings from a specific file, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                warn!("error parsing {}: {}; using default settings", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                warn!("error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                self.suggest_endpoint = endpoint.trim().to_string();
            }
        }
        self
    }

    /// Save current settings to the default location
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.suggest_stale_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.suggest_timeout_seconds.max(1))
    }

    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            max_input_len: self.max_input_length,
            default_number_mode: self.default_number_mode,
            strict_operators: self.strict_operators,
        }
    }

    /// Write the default settings file with comments
    fn create_default_file(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let default_config = format!(
            r#"{{
    // Autocomplete source (GET, returns [{{ "id", "name", "value"?, "inputs"? }}])
    "suggest.endpoint": "{}",
    "suggest.staleSeconds": 60,
    "suggest.timeoutSeconds": 10,

    // Pending input longer than this is refused
    "input.maxLength": 20,

    // "Value", "Percentage" or "Growth"
    "input.defaultNumberMode": "Percentage",

    // Refuse ^ ( ) since they cannot be evaluated
    "input.strictOperators": true
}}
"#,
            DEFAULT_ENDPOINT
        );

        fs::write(path, default_config).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.max_input_length, 20);
        assert_eq!(settings.default_number_mode, DisplayMode::Percentage);
        assert!(settings.strict_operators);
        assert_eq!(settings.stale_time(), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_strips_comments_and_fills_defaults() {
        let json = r#"{
            // only override one key
            "input.maxLength": 8
        }"#;
        let settings = Settings::parse(json).unwrap();
        assert_eq!(settings.max_input_length, 8);
        assert_eq!(settings.suggest_endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_parse_number_mode() {
        let settings = Settings::parse(r#"{ "input.defaultNumberMode": "Value" }"#).unwrap();
        assert_eq!(settings.editor_options().default_number_mode, DisplayMode::Value);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Settings::parse("{ not json").is_err());
    }

    #[test]
    fn test_default_file_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        Settings::default().create_default_file(&path).unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            suggest_endpoint: "http://localhost:9000/s".into(),
            strict_operators: false,
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_unreadable_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("missing.json"));
        assert_eq!(settings, Settings::default());
    }
}
