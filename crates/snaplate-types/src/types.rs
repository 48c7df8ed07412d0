use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Settings file changed, reload and re-apply
    ConfigChanged,
    /// The global hotkey fired
    HotkeyTriggered { id: u32 },
    /// Recognize and translate a screen region (None = configured default)
    TriggerOcr(Option<CaptureRegion>),
    RawTextInput {
        text: String,
        source: TextSource,
    },
    OcrStatusUpdate {
        status: String,
        capturing: bool,
    },
    ShowTranslation {
        text: String,
        source_text: String,
    },
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Ocr,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    /// Regions smaller than 2x2 are treated as a cancelled selection
    pub fn is_selectable(&self) -> bool {
        self.width >= 2 && self.height >= 2
    }
}
