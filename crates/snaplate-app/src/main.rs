use std::sync::Arc;

use anyhow::Context;
use snaplate_config::Config;
use snaplate_ocr::{HotkeyListener, OcrBridge, platform_capture};
use tracing_subscriber::EnvFilter;

pub mod controller;
pub mod events;
pub mod hotkey;
pub mod io;
pub mod state;
pub mod ui;

#[cfg(test)]
mod tests;

use self::controller::AppController;
use self::state::AppState;

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("snaplate=debug,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let settings_path = snaplate_config::settings_path();
    let config = Config::load(&settings_path)
        .with_context(|| format!("failed to load settings from {}", settings_path.display()))?
        .with_env_overrides();
    if let Err(e) = config.validate() {
        tracing::warn!("{}", e);
    }

    let state = Arc::new(AppState::new(
        config,
        settings_path,
        OcrBridge::platform(),
        platform_capture(),
    ));
    let controller = AppController::new(state, HotkeyListener::platform());
    let mut tasks = controller.spawn_tasks();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for ctrl+c: {}", e);
            }
            tracing::info!("Shutdown requested");
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::warn!("Task exited early"),
                Ok(Err(e)) => tracing::error!("Task failed: {:#}", e),
                Err(e) => tracing::error!("Task panicked: {}", e),
            }
        }
    }

    controller.shutdown();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Task ended with error: {:#}", e),
            Err(e) => tracing::error!("Task panicked: {}", e),
        }
    }

    tracing::info!("Bye");
    Ok(())
}
