use serde::{Deserialize, Serialize};

pub const FONT_SIZE_RANGE: std::ops::RangeInclusive<u32> = 6..=96;

fn default_enabled() -> bool {
    true
}

fn default_font_family() -> String {
    "Malgun Gothic".to_string()
}

fn default_font_size() -> u32 {
    14
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct OverlayConfig {
    /// Draw the translation over the captured region
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            font_family: default_font_family(),
            font_size: default_font_size(),
        }
    }
}
