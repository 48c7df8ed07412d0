use std::time::Duration;

use serde::{Deserialize, Serialize};
use snaplate_types::CaptureRegion;

/// Accepted `timeout_ms` values
pub const TIMEOUT_MS_RANGE: std::ops::RangeInclusive<u64> = 1..=600_000;

fn default_enabled() -> bool {
    true
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_timeout_ms() -> u64 {
    3000
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// BCP-47 tag handed to the recognition service
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Region captured on hotkey; whole primary monitor when unset
    pub capture_region: Option<CaptureRegion>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            language: default_language(),
            timeout_ms: default_timeout_ms(),
            capture_region: None,
        }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
