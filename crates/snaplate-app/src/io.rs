use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use kanal::AsyncSender;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use snaplate_types::AppEvent;
use tokio_util::sync::CancellationToken;

/// Watch the settings file and enqueue `ConfigChanged` once per burst of
/// writes.
///
/// Bursts are coalesced: after the first change the task waits `debounce`
/// and drops whatever else arrived meanwhile.
pub async fn watch_settings(
    path: PathBuf,
    debounce: Duration,
    cancel: CancellationToken,
    events_tx: AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    let (dirty_tx, dirty_rx) = kanal::bounded_async::<()>(1);

    let _watcher = match start_watcher(&path, dirty_tx.to_sync()) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::warn!("Settings reload disabled: {:#}", e);
            cancel.cancelled().await;
            return Ok(());
        }
    };

    tracing::debug!("Watching {}", path.display());
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            changed = dirty_rx.recv() => changed?,
        }

        // Editors emit several events per save
        tokio::time::sleep(debounce).await;
        while let Ok(Some(())) = dirty_rx.try_recv() {}

        tracing::info!("Settings file changed");
        events_tx.send(AppEvent::ConfigChanged).await?;
    }
}

/// Watch the parent directory so replaced files are seen too
fn start_watcher(path: &Path, dirty_tx: kanal::Sender<()>) -> anyhow::Result<RecommendedWatcher> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .context("settings path has no file name")?
        .to_os_string();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            if event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(file_name.as_os_str()))
            {
                // Full means a change is already pending
                let _ = dirty_tx.try_send(());
            }
        },
        notify::Config::default(),
    )
    .context("failed to create settings watcher")?;

    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", dir.display()))?;
    Ok(watcher)
}
