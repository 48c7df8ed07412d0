use crate::bitmap::{Bitmap, BitmapError};

/// One recognized line, words in reading order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedLine {
    pub words: Vec<String>,
}

/// Raw engine output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedPage {
    pub lines: Vec<RecognizedLine>,
}

impl RecognizedPage {
    pub fn from_lines<I, L, W>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = W>,
        W: Into<String>,
    {
        Self {
            lines: lines
                .into_iter()
                .map(|words| RecognizedLine {
                    words: words.into_iter().map(Into::into).collect(),
                })
                .collect(),
        }
    }

    /// Lines with words separated by single spaces.
    ///
    /// Whitespace inside words is collapsed, and blank lines at the start and
    /// end of the page are dropped.
    pub fn normalized_lines(&self) -> Vec<String> {
        let lines: Vec<String> = self
            .lines
            .iter()
            .map(|line| {
                line.words
                    .iter()
                    .flat_map(|word| word.split_whitespace())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        let Some(first) = lines.iter().position(|line| !line.is_empty()) else {
            return Vec::new();
        };
        let last = lines.iter().rposition(|line| !line.is_empty()).unwrap_or(first);
        lines[first..=last].to_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid bitmap: {0}")]
    Bitmap(#[from] BitmapError),

    #[error("image {width}x{height} exceeds the engine limit of {max} pixels per side")]
    ImageTooLarge { width: u32, height: u32, max: u32 },

    #[error("{0}")]
    Platform(String),
}

/// An engine bound to one recognition language
#[async_trait::async_trait(?Send)]
pub trait RecognitionEngine: Send {
    async fn recognize(&self, bitmap: &Bitmap) -> Result<RecognizedPage, EngineError>;
}

/// The installed recognition capability
pub trait RecognitionService: Send + Sync {
    fn is_language_supported(&self, tag: &str) -> bool;

    /// `None` when an engine cannot be built for a supported language
    fn create_for_language(&self, tag: &str) -> Option<Box<dyn RecognitionEngine>>;
}

/// Service for targets without an OS recognizer
pub struct UnsupportedRecognition;

impl RecognitionService for UnsupportedRecognition {
    fn is_language_supported(&self, _tag: &str) -> bool {
        true
    }

    fn create_for_language(&self, _tag: &str) -> Option<Box<dyn RecognitionEngine>> {
        None
    }
}

/// Input of one `recognize` call
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub bitmap: Bitmap,
    pub language: String,
}

impl RecognitionRequest {
    pub fn new(bitmap: Bitmap, language: impl Into<String>) -> Self {
        Self {
            bitmap,
            language: language.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    Text(Vec<String>),
    LanguagePackMissing(String),
    EngineUnavailable,
    TimedOut,
    Failed(String),
}

impl RecognitionOutcome {
    /// Recognized text joined with newlines, if recognition succeeded
    pub fn text(&self) -> Option<String> {
        match self {
            RecognitionOutcome::Text(lines) => Some(lines.join("\n")),
            _ => None,
        }
    }
}
