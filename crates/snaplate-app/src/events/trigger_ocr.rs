use std::sync::Arc;

use anyhow::Context;
use kanal::AsyncSender;
use snaplate_ocr::{RecognitionOutcome, RecognitionRequest};
use snaplate_types::{AppEvent, CaptureRegion, TextSource};

use crate::state::AppState;

/// Capture, recognize and translate one screen region.
///
/// `None` falls back to the configured region, then to the whole primary
/// monitor. Every path ends with an `OcrStatusUpdate`.
pub async fn handle_ocr_trigger(
    state: &Arc<AppState>,
    region: Option<CaptureRegion>,
    app_to_ui_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    let (language, timeout, configured_region) = {
        let config = state.config.read().await;
        (
            config.ocr.language.clone(),
            config.ocr.timeout(),
            config.ocr.capture_region,
        )
    };

    let region = region.or(configured_region);
    if let Some(region) = region
        && !region.is_selectable()
    {
        tracing::debug!(">>> [OCR] Selection cancelled: {:?}", region);
        send_status(app_to_ui_tx, "Selection cancelled", false).await;
        return Ok(());
    }

    send_status(app_to_ui_tx, "Recognizing...", true).await;

    let task_state = Arc::clone(state);
    let result = tokio::task::spawn_blocking(move || {
        let bitmap = task_state
            .capture
            .capture(region)
            .context("screen capture failed")?;
        let request = RecognitionRequest::new(bitmap, language);
        Ok::<_, anyhow::Error>(task_state.bridge.recognize(request, timeout))
    })
    .await;

    let outcome = match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::error!(">>> [OCR] Failed: {:#}", e);
            send_status(app_to_ui_tx, &format!("OCR failed: {e:#}"), false).await;
            return Ok(());
        }
        Err(e) => {
            tracing::error!(">>> [OCR] Task error: {}", e);
            send_status(app_to_ui_tx, "OCR failed: capture task aborted", false).await;
            return Ok(());
        }
    };

    let text = match outcome_text(outcome) {
        Ok(text) => text,
        Err(status) => {
            send_status(app_to_ui_tx, &status, false).await;
            return Ok(());
        }
    };

    tracing::debug!(">>> [OCR] Got text: {} chars", text.len());
    let _ = app_to_ui_tx
        .send(AppEvent::RawTextInput {
            text: text.clone(),
            source: TextSource::Ocr,
        })
        .await;

    if let Some(translator) = state.translator().await {
        match translator.translate(&text).await {
            Ok(translation) => {
                let _ = app_to_ui_tx
                    .send(AppEvent::ShowTranslation {
                        text: translation.text,
                        source_text: text,
                    })
                    .await;
            }
            Err(e) => {
                tracing::warn!("Translation failed: {}", e);
                send_status(app_to_ui_tx, &format!("Translation failed: {e}"), false).await;
                return Ok(());
            }
        }
    }

    send_status(app_to_ui_tx, "Ready", false).await;
    Ok(())
}

/// Recognized text, or the status line to show instead
pub fn outcome_text(outcome: RecognitionOutcome) -> Result<String, String> {
    match outcome {
        RecognitionOutcome::Text(lines) => {
            let text = lines.join("\n");
            if text.trim().is_empty() {
                Err("No text found".to_string())
            } else {
                Ok(text)
            }
        }
        RecognitionOutcome::LanguagePackMissing(tag) => {
            Err(format!("OCR language pack not installed: {tag}"))
        }
        RecognitionOutcome::TimedOut => Err("OCR timed out".to_string()),
        RecognitionOutcome::EngineUnavailable => {
            Err("OCR failed: recognition engine unavailable".to_string())
        }
        RecognitionOutcome::Failed(reason) => Err(format!("OCR failed: {reason}")),
    }
}

pub async fn send_status(app_to_ui_tx: &AsyncSender<AppEvent>, status: &str, capturing: bool) {
    let _ = app_to_ui_tx
        .send(AppEvent::OcrStatusUpdate {
            status: status.to_string(),
            capturing,
        })
        .await;
}
