//! Simple OCR smoke test - run with: cargo run -p snaplate-ocr --bin test_ocr [lang]

use std::time::Instant;

use anyhow::Result;
use snaplate_ocr::{DEFAULT_TIMEOUT, OcrBridge, RecognitionRequest, platform_capture};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let language = std::env::args().nth(1).unwrap_or_else(|| "en-US".to_string());

    let start = Instant::now();
    let bitmap = platform_capture().capture(None)?;
    tracing::info!(
        "Captured {}x{} in {:?}",
        bitmap.width(),
        bitmap.height(),
        start.elapsed()
    );

    let start = Instant::now();
    let outcome =
        OcrBridge::platform().recognize(RecognitionRequest::new(bitmap, language.as_str()), DEFAULT_TIMEOUT);
    tracing::info!("OCR ({}) finished in {:?}", language, start.elapsed());

    match outcome.text() {
        Some(text) => {
            for line in text.lines().take(5) {
                tracing::info!("   > {}", line);
            }
        }
        None => tracing::warn!("No text: {:?}", outcome),
    }

    Ok(())
}
