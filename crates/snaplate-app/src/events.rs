use std::ops::ControlFlow;
use std::sync::Arc;

use kanal::{AsyncReceiver, AsyncSender};
use snaplate_types::AppEvent;
use tokio_util::sync::CancellationToken;

use crate::hotkey::HotkeyController;
use crate::state::AppState;

pub mod trigger_ocr;

use trigger_ocr::{handle_ocr_trigger, send_status};

/// App's main loop
pub async fn event_loop(
    state: Arc<AppState>,
    mut hotkeys: HotkeyController,
    events_rx: AsyncReceiver<AppEvent>,
    app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let hotkey_config = state.config.read().await.hotkey.clone();
    if let Err(e) = hotkeys.apply(&hotkey_config).await {
        report_hotkey_failure(&app_to_ui_tx, e).await;
    }

    tracing::info!("[EVENT_LOOP] Waiting for events");
    let result = loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break Ok(()),
            event = events_rx.recv() => event,
        };

        let event = match event {
            Ok(event) => event,
            Err(e) => break Err(e.into()),
        };

        tracing::debug!("[EVENT_LOOP] {:?}", event);
        match handle_event(&state, &mut hotkeys, &app_to_ui_tx, event).await {
            Ok(ControlFlow::Continue(())) => {}
            Ok(ControlFlow::Break(())) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    hotkeys.stop().await;
    tracing::info!("[EVENT_LOOP] Stopped");
    result
}

async fn handle_event(
    state: &Arc<AppState>,
    hotkeys: &mut HotkeyController,
    app_to_ui_tx: &AsyncSender<AppEvent>,
    event: AppEvent,
) -> anyhow::Result<ControlFlow<()>> {
    match event {
        AppEvent::HotkeyTriggered { id } => {
            let (expected_id, ocr_enabled) = {
                let config = state.config.read().await;
                (config.hotkey.id, config.ocr.enabled)
            };

            if id != expected_id {
                tracing::debug!("Ignoring stale hotkey {}", id);
            } else if !ocr_enabled {
                send_status(app_to_ui_tx, "OCR is disabled", false).await;
            } else {
                handle_ocr_trigger(state, None, app_to_ui_tx).await?;
            }
        }
        AppEvent::TriggerOcr(region) => {
            handle_ocr_trigger(state, region, app_to_ui_tx).await?;
        }
        AppEvent::ConfigChanged => match state.reload_config().await {
            Ok(config) => {
                if let Err(e) = hotkeys.apply(&config.hotkey).await {
                    report_hotkey_failure(app_to_ui_tx, e).await;
                }
            }
            Err(e) => {
                tracing::error!("Failed to reload settings: {}", e);
                send_status(app_to_ui_tx, &format!("Failed to reload settings: {e}"), false).await;
            }
        },
        AppEvent::Shutdown => return Ok(ControlFlow::Break(())),
        AppEvent::RawTextInput { .. }
        | AppEvent::OcrStatusUpdate { .. }
        | AppEvent::ShowTranslation { .. } => {
            // UI-only events
        }
    }

    Ok(ControlFlow::Continue(()))
}

async fn report_hotkey_failure(app_to_ui_tx: &AsyncSender<AppEvent>, error: anyhow::Error) {
    tracing::error!("Hotkey registration failed: {:#}", error);
    send_status(app_to_ui_tx, &format!("Hotkey registration failed: {error:#}"), false).await;
}
