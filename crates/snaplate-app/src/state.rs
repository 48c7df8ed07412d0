use std::path::PathBuf;
use std::sync::Arc;

use snaplate_config::translator::TranslatorConfig;
use snaplate_config::{Config, ConfigError};
use snaplate_ocr::{OcrBridge, ScreenCapture};
use snaplate_translator::{GeminiTranslator, Translator};
use tokio::sync::RwLock;

pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub settings_path: PathBuf,
    pub bridge: OcrBridge,
    pub capture: Arc<dyn ScreenCapture>,
    translator: RwLock<Option<Arc<dyn Translator>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        settings_path: PathBuf,
        bridge: OcrBridge,
        capture: Arc<dyn ScreenCapture>,
    ) -> Self {
        let translator = build_translator(&config.translator);

        Self {
            config: Arc::new(RwLock::new(config)),
            settings_path,
            bridge,
            capture,
            translator: RwLock::new(translator),
        }
    }

    /// Replace the configured translator
    pub fn with_translator(mut self, translator: Option<Arc<dyn Translator>>) -> Self {
        self.translator = RwLock::new(translator);
        self
    }

    pub async fn translator(&self) -> Option<Arc<dyn Translator>> {
        self.translator.read().await.clone()
    }

    /// Re-read the settings file and rebuild what depends on it
    pub async fn reload_config(&self) -> Result<Config, ConfigError> {
        let config = Config::load(&self.settings_path)?.with_env_overrides();

        *self.translator.write().await = build_translator(&config.translator);
        *self.config.write().await = config.clone();

        tracing::info!("Settings reloaded from {}", self.settings_path.display());
        Ok(config)
    }
}

pub fn build_translator(config: &TranslatorConfig) -> Option<Arc<dyn Translator>> {
    if !config.enabled {
        return None;
    }

    if config.api_key.trim().is_empty() {
        tracing::warn!("Translator enabled without an API key, requests will fail");
    }

    Some(Arc::new(GeminiTranslator::new(
        config.api_url.clone(),
        config.api_key.clone(),
        config.model.clone(),
        config.system_prompt.clone(),
    )))
}
