use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use self::hotkey::HotkeyConfig;
use self::ocr::{OcrConfig, TIMEOUT_MS_RANGE};
use self::overlay::{FONT_SIZE_RANGE, OverlayConfig};
use self::translator::TranslatorConfig;

pub mod hotkey;
pub mod ocr;
pub mod overlay;
pub mod translator;

pub const APP_NAME: &str = "OCR Translate";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub hotkey: HotkeyConfig,
    pub ocr: OcrConfig,
    pub translator: TranslatorConfig,
    pub overlay: OverlayConfig,
}

impl Config {
    /// Defaults with environment overrides applied
    pub fn new() -> Self {
        Config::default().with_env_overrides()
    }

    /// Override fields from `SNAPLATE_HOTKEY`, `SNAPLATE_OCR_LANGUAGE`,
    /// `SNAPLATE_OCR_TIMEOUT_MS` and `GEMINI_API_KEY`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(combo) = env::var("SNAPLATE_HOTKEY") {
            self.hotkey.combo = combo;
        }

        if let Ok(language) = env::var("SNAPLATE_OCR_LANGUAGE") {
            self.ocr.language = language;
        }

        if let Some(timeout_ms) = env::var("SNAPLATE_OCR_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|ms| TIMEOUT_MS_RANGE.contains(ms))
        {
            self.ocr.timeout_ms = timeout_ms;
        }

        if let Ok(api_key) = env::var("GEMINI_API_KEY")
            && !api_key.is_empty()
        {
            self.translator.api_key = api_key;
        }

        self
    }

    /// Read settings from `path`.
    ///
    /// A missing file is created with defaults. A file that cannot be parsed
    /// is moved aside to `<name>.bak` and replaced with defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No settings at {}, writing defaults", path.display());
            let config = Config::default();
            config.save(path)?;
            return Ok(config);
        }

        let parsed = fs::read_to_string(path)
            .map_err(ConfigError::from)
            .and_then(|text| serde_json::from_str::<Config>(&text).map_err(ConfigError::from));

        match parsed {
            Ok(mut config) => {
                config.sanitize();
                Ok(config)
            }
            Err(e) => {
                let backup = backup_path(path);
                tracing::warn!(
                    "Settings at {} unreadable ({}), moving to {}",
                    path.display(),
                    e,
                    backup.display()
                );
                if let Err(e) = fs::rename(path, &backup) {
                    tracing::warn!("Failed to back up settings: {}", e);
                }
                let config = Config::default();
                config.save(path)?;
                Ok(config)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject settings a user could not have meant
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hotkey.validate()?;

        if self.ocr.language.trim().is_empty() {
            return Err(ConfigError::Invalid("OCR language is empty".to_string()));
        }
        if !TIMEOUT_MS_RANGE.contains(&self.ocr.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "OCR timeout {}ms outside {:?}",
                self.ocr.timeout_ms, TIMEOUT_MS_RANGE
            )));
        }
        if self.translator.model.trim().is_empty() {
            return Err(ConfigError::Invalid("translator model is empty".to_string()));
        }
        if self.overlay.font_family.trim().is_empty() {
            return Err(ConfigError::Invalid("font family is empty".to_string()));
        }
        if !FONT_SIZE_RANGE.contains(&self.overlay.font_size) {
            return Err(ConfigError::Invalid(format!(
                "font size {} outside {:?}",
                self.overlay.font_size, FONT_SIZE_RANGE
            )));
        }
        Ok(())
    }

    /// Reset fields that fail validation to their defaults
    pub fn sanitize(&mut self) {
        if let Err(e) = self.hotkey.validate() {
            tracing::warn!("{}, using default hotkey", e);
            self.hotkey = HotkeyConfig::default();
        }

        let defaults = Config::default();
        if self.ocr.language.trim().is_empty() {
            self.ocr.language = defaults.ocr.language;
        }
        if !TIMEOUT_MS_RANGE.contains(&self.ocr.timeout_ms) {
            tracing::warn!("OCR timeout {}ms out of range, using default", self.ocr.timeout_ms);
            self.ocr.timeout_ms = defaults.ocr.timeout_ms;
        }
        if self.translator.model.trim().is_empty() {
            self.translator.model = defaults.translator.model;
        }
        if self.overlay.font_family.trim().is_empty()
            || !FONT_SIZE_RANGE.contains(&self.overlay.font_size)
        {
            tracing::warn!("Invalid overlay font settings, using defaults");
            self.overlay.font_family = defaults.overlay.font_family;
            self.overlay.font_size = defaults.overlay.font_size;
        }
    }
}

/// `%APPDATA%/OCR Translate/settings.json`
pub fn settings_path() -> PathBuf {
    let base = env::var_os("APPDATA")
        .map(PathBuf::from)
        .or_else(|| {
            env::var_os("USERPROFILE")
                .or_else(|| env::var_os("HOME"))
                .map(|home| PathBuf::from(home).join("AppData").join("Roaming"))
        })
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_NAME).join("settings.json")
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}
