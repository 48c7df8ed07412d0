use serde::{Deserialize, Serialize};
use snaplate_ocr::KeyCombination;

use crate::ConfigError;

fn default_combo() -> String {
    "ctrl+shift+c".to_string()
}

fn default_no_repeat() -> bool {
    true
}

fn default_id() -> u32 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HotkeyConfig {
    #[serde(default = "default_combo")]
    pub combo: String,
    /// Suppress auto-repeat while the key is held
    #[serde(default = "default_no_repeat")]
    pub no_repeat: bool,
    #[serde(default = "default_id")]
    pub id: u32,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            combo: default_combo(),
            no_repeat: default_no_repeat(),
            id: default_id(),
        }
    }
}

impl HotkeyConfig {
    pub fn combination(&self) -> Result<KeyCombination, ConfigError> {
        if !self.combo.contains('+') {
            return Err(ConfigError::Invalid(format!(
                "hotkey '{}' must look like 'ctrl+shift+f1'",
                self.combo
            )));
        }
        KeyCombination::parse(&self.combo)
            .map_err(|e| ConfigError::Invalid(format!("hotkey '{}': {e}", self.combo)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.combination()?;
        if self.id == 0 || self.id > snaplate_ocr::MAX_HOTKEY_ID {
            return Err(ConfigError::Invalid(format!("hotkey id {} out of range", self.id)));
        }
        Ok(())
    }
}
