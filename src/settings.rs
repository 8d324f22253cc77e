use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// Application settings, persisted as pretty JSON. Missing fields take their defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
    pub typing_delay_ms: u64,
    pub partial_match_threshold: usize,
    pub knowledge_base_path: PathBuf,
    pub default_game: String,
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_key: None,
            model: "gemini-pro".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 500,
            request_timeout_secs: 15,
            typing_delay_ms: 1200,
            partial_match_threshold: 2,
            knowledge_base_path: PathBuf::from("data/knowledge_base.csv"),
            default_game: "valorant".to_string(),
            debug_mode: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    // <home>/coach_gpt/data, or a relative data dir when no home is known.
    pub fn data_dir() -> PathBuf {
        dir::home_dir()
            .unwrap_or_default()
            .join("coach_gpt")
            .join("data")
    }

    pub fn default_path() -> PathBuf {
        Self::data_dir().join("settings.json")
    }

    // Loads the default settings file, falling back to defaults, then applies env overrides.
    pub fn load() -> Self {
        Self::load_settings_from_file(Self::default_path())
            .unwrap_or_default()
            .with_env_overrides()
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_file(Self::default_path())
    }

    pub fn load_settings_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let settings: Settings =
            serde_json::from_str(r#"{ "model": "gemini-1.5-flash", "top_k": 10 }"#)
                .expect("valid settings json");

        assert_eq!(settings.model, "gemini-1.5-flash");
        assert_eq!(settings.top_k, 10);
        assert_eq!(settings.partial_match_threshold, 2);
        assert_eq!(settings.api_key, None);
    }

    #[test]
    fn blank_key_is_not_a_key() {
        let settings = Settings {
            api_key: Some("   ".to_string()),
            ..Settings::default()
        };
        assert!(!settings.has_api_key());
    }
}
