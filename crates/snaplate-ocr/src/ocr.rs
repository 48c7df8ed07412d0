use windows::{
    Globalization::Language,
    Graphics::Imaging::{BitmapAlphaMode, BitmapPixelFormat, SoftwareBitmap},
    Media::Ocr::OcrEngine as WinOcrEngine,
    Storage::Streams::DataWriter,
    core::HSTRING,
};

use crate::bitmap::Bitmap;
use crate::com::ComGuard;
use crate::engine::{EngineError, RecognitionEngine, RecognitionService, RecognizedLine, RecognizedPage};

fn platform(e: windows::core::Error) -> EngineError {
    EngineError::Platform(e.message().to_string())
}

fn language(tag: &str) -> windows::core::Result<Language> {
    Language::CreateLanguage(&HSTRING::from(tag))
}

/// `Windows.Media.Ocr` with per-language engines
pub struct WindowsOcr;

impl RecognitionService for WindowsOcr {
    fn is_language_supported(&self, tag: &str) -> bool {
        let _com = ComGuard::initialize();
        language(tag)
            .and_then(|language| WinOcrEngine::IsLanguageSupported(&language))
            .unwrap_or(false)
    }

    fn create_for_language(&self, tag: &str) -> Option<Box<dyn RecognitionEngine>> {
        let _com = ComGuard::initialize();
        match language(tag).and_then(|language| WinOcrEngine::TryCreateFromLanguage(&language)) {
            Ok(engine) => Some(Box::new(OcrEngine { engine })),
            Err(e) => {
                tracing::warn!("Failed to create OCR engine for {}: {}", tag, e.message());
                None
            }
        }
    }
}

pub struct OcrEngine {
    engine: WinOcrEngine,
}

impl OcrEngine {
    /// Get the recognizer language for this engine
    pub fn recognizer_language(&self) -> Result<String, EngineError> {
        self.engine
            .RecognizerLanguage()
            .and_then(|language| language.LanguageTag())
            .map(|tag| tag.to_string())
            .map_err(platform)
    }
}

#[async_trait::async_trait(?Send)]
impl RecognitionEngine for OcrEngine {
    async fn recognize(&self, bitmap: &Bitmap) -> Result<RecognizedPage, EngineError> {
        let _com = ComGuard::initialize().map_err(platform)?;

        let max = WinOcrEngine::MaxImageDimension().map_err(platform)?;
        if bitmap.width() > max || bitmap.height() > max {
            return Err(EngineError::ImageTooLarge {
                width: bitmap.width(),
                height: bitmap.height(),
                max,
            });
        }

        let software_bitmap = to_software_bitmap(bitmap).map_err(platform)?;
        let result = self
            .engine
            .RecognizeAsync(&software_bitmap)
            .map_err(platform)?
            .await
            .map_err(platform)?;

        let mut lines = Vec::new();
        for line in result.Lines().map_err(platform)? {
            let words = line
                .Words()
                .map_err(platform)?
                .into_iter()
                .map(|word| word.Text().map(|text| text.to_string()))
                .collect::<windows::core::Result<Vec<_>>>()
                .map_err(platform)?;
            lines.push(RecognizedLine { words });
        }

        Ok(RecognizedPage { lines })
    }
}

/// Copy raw pixels straight into a BGRA8 SoftwareBitmap, no image codec involved
fn to_software_bitmap(bitmap: &Bitmap) -> windows::core::Result<SoftwareBitmap> {
    let pixels = bitmap.to_bgra8();
    let writer = DataWriter::new()?;
    writer.WriteBytes(&pixels)?;
    let buffer = writer.DetachBuffer()?;

    SoftwareBitmap::CreateCopyWithAlphaFromBuffer(
        &buffer,
        BitmapPixelFormat::Bgra8,
        bitmap.width() as i32,
        bitmap.height() as i32,
        BitmapAlphaMode::Ignore,
    )
}
