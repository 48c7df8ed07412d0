use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_system_prompt() -> String {
    concat!(
        "You are a translator for in-game text.\n",
        "Keep proper nouns such as names and places in their original form.\n",
        "Translate UI labels, buttons and setting names literally.\n",
        "Output only the translation of the given text, nothing else.\n",
        "If the text has several paragraphs, separate them with a blank line."
    )
    .to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TranslatorConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            model: default_model(),
            api_key: String::new(),
            api_url: default_api_url(),
            system_prompt: default_system_prompt(),
        }
    }
}
