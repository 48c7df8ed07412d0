use std::sync::Arc;

use kanal::AsyncReceiver;
use snaplate_config::Config;
use snaplate_types::{AppEvent, TextSource};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Presents app output on the console until cancelled
pub async fn ui_loop(
    app_to_ui_rx: AsyncReceiver<AppEvent>,
    config: Arc<RwLock<Config>>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            event = app_to_ui_rx.recv() => event?,
        };

        match event {
            AppEvent::OcrStatusUpdate { status, capturing } => {
                tracing::info!("[STATUS] {} (capturing: {})", status, capturing);
            }
            AppEvent::RawTextInput { text, source } => {
                let label = match source {
                    TextSource::Ocr => "OCR",
                    TextSource::Manual => "Input",
                };
                tracing::info!("[{}] {}", label, text);
            }
            AppEvent::ShowTranslation { text, source_text } => {
                let overlay = config.read().await.overlay.clone();
                if overlay.enabled {
                    tracing::info!(
                        "[OVERLAY {} {}pt] {}",
                        overlay.font_family,
                        overlay.font_size,
                        text
                    );
                } else {
                    tracing::debug!("Overlay disabled, translation of {:?} hidden", source_text);
                }
            }
            other => tracing::debug!("UI ignoring {:?}", other),
        }
    }
}
