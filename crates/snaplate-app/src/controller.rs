use std::sync::Arc;
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender};
use snaplate_ocr::HotkeyListener;
use snaplate_types::AppEvent;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::events::event_loop;
use crate::hotkey::HotkeyController;
use crate::io::watch_settings;
use crate::state::AppState;
use crate::ui::ui_loop;

const SETTINGS_DEBOUNCE: Duration = Duration::from_millis(200);

/// Centralized channel management
pub struct ChannelSet {
    pub app_to_ui: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
    pub events: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            app_to_ui: kanal::bounded_async(256),
            events: kanal::bounded_async(64),
        }
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    state: Arc<AppState>,
    hotkeys: HotkeyListener,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(state: Arc<AppState>, hotkeys: HotkeyListener) -> Self {
        Self {
            channels: ChannelSet::new(),
            state,
            hotkeys,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn spawn_tasks(&self) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        let hotkeys =
            HotkeyController::new(self.hotkeys.clone(), self.channels.events.0.clone().to_sync());
        tasks.spawn(event_loop(
            self.state.clone(),
            hotkeys,
            self.channels.events.1.clone(),
            self.channels.app_to_ui.0.clone(),
            self.cancel_token.child_token(),
        ));

        tasks.spawn(ui_loop(
            self.channels.app_to_ui.1.clone(),
            self.state.config.clone(),
            self.cancel_token.child_token(),
        ));

        tasks.spawn(watch_settings(
            self.state.settings_path.clone(),
            SETTINGS_DEBOUNCE,
            self.cancel_token.child_token(),
            self.channels.events.0.clone(),
        ));

        tasks
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
