use anyhow::Context;
use snaplate_config::hotkey::HotkeyConfig;
use snaplate_ocr::{HotkeyListener, ListenerHandle};
use snaplate_types::AppEvent;

struct ActiveHotkey {
    handle: ListenerHandle,
    no_repeat: bool,
}

/// Keeps at most one global hotkey registered and in sync with settings
pub struct HotkeyController {
    listener: HotkeyListener,
    events_tx: kanal::Sender<AppEvent>,
    active: Option<ActiveHotkey>,
}

impl HotkeyController {
    pub fn new(listener: HotkeyListener, events_tx: kanal::Sender<AppEvent>) -> Self {
        Self {
            listener,
            events_tx,
            active: None,
        }
    }

    /// Register `config`, replacing the current hotkey.
    ///
    /// Nothing is re-registered when the same combination is already live.
    /// Starting and stopping listeners blocks, so both run on the blocking
    /// pool.
    pub async fn apply(&mut self, config: &HotkeyConfig) -> anyhow::Result<()> {
        let combination = config.combination()?;

        if let Some(active) = &self.active
            && active.handle.is_listening()
            && active.handle.combination() == combination
            && active.handle.id() == config.id
            && active.no_repeat == config.no_repeat
        {
            tracing::debug!("Hotkey {} unchanged", combination);
            return Ok(());
        }

        let previous = self.active.take();
        let listener = self.listener.clone();
        let events_tx = self.events_tx.clone();
        let (id, no_repeat) = (config.id, config.no_repeat);

        let handle = tokio::task::spawn_blocking(move || {
            if let Some(previous) = previous {
                release(previous);
            }
            listener.start(
                combination,
                move |event| match events_tx.try_send(AppEvent::HotkeyTriggered { id: event.id }) {
                    Ok(true) => {}
                    Ok(false) => tracing::warn!("Event queue full, dropping hotkey {}", event.id),
                    Err(e) => tracing::warn!("Event queue closed: {}", e),
                },
                no_repeat,
                id,
            )
        })
        .await
        .context("hotkey registration task failed")??;

        tracing::info!("Hotkey {} active (id {})", combination, id);
        self.active = Some(ActiveHotkey { handle, no_repeat });
        Ok(())
    }

    pub async fn stop(&mut self) {
        if let Some(active) = self.active.take()
            && let Err(e) = tokio::task::spawn_blocking(move || release(active)).await
        {
            tracing::error!("Hotkey release task failed: {}", e);
        }
    }

    pub fn active(&self) -> Option<&ListenerHandle> {
        self.active.as_ref().map(|active| &active.handle)
    }
}

fn release(mut active: ActiveHotkey) {
    active.handle.stop();
    tracing::info!("Hotkey {} released", active.handle.combination());
}
