use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::combo::{KeyCombination, ParseError};

/// How long `start` waits for the listener thread to report its registration
pub const REGISTRATION_CONFIRM_TIMEOUT: Duration = Duration::from_secs(1);

/// Highest identifier an application may use for `RegisterHotKey`
pub const MAX_HOTKEY_ID: u32 = 0xBFFF;

/// Hotkey identifiers currently owned by a listener thread in this process.
///
/// Initialized on first use. An id is claimed before its listener thread is
/// spawned and released by that thread after the OS registration is gone.
static ACTIVE_IDS: LazyLock<Mutex<HashSet<u32>>> = LazyLock::new(|| Mutex::new(HashSet::new()));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeyError {
    #[error("invalid hotkey: {0}")]
    Parse(#[from] ParseError),

    #[error("hotkey id {0} is outside 1..={MAX_HOTKEY_ID}")]
    InvalidId(u32),

    #[error("failed to register hotkey {id}: {reason}")]
    Registration { id: u32, reason: String },
}

/// Delivered to the trigger callback once per qualifying key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyEvent {
    pub id: u32,
    pub combination: KeyCombination,
}

/// What a blocking wait on the listener thread's message queue produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpMessage {
    /// A hotkey with this id fired
    Hotkey(u32),
    /// The pump was woken to shut down
    Quit,
    /// Anything else; already dispatched by the backend
    Other,
}

/// Wakes a listener thread blocked in [`Registration::next_message`].
/// Callable from any thread.
pub type PumpWaker = Box<dyn Fn() + Send + Sync>;

/// One live OS registration, owned by the listener thread that created it.
/// Dropping it unregisters the hotkey.
pub trait Registration {
    fn waker(&self) -> PumpWaker;

    /// Block until the next message arrives on this thread's queue
    fn next_message(&mut self) -> PumpMessage;
}

/// OS seam for system-wide hotkeys.
pub trait HotkeyBackend: Send + Sync + 'static {
    /// Register `combination` under `id` for the calling thread.
    ///
    /// Always called on the listener thread. `Err` carries the OS reason.
    fn register(
        &self,
        id: u32,
        combination: &KeyCombination,
        no_repeat: bool,
    ) -> Result<Box<dyn Registration>, String>;
}

/// Backend for targets without global hotkey support
pub struct UnsupportedHotkeys;

impl HotkeyBackend for UnsupportedHotkeys {
    fn register(
        &self,
        _id: u32,
        _combination: &KeyCombination,
        _no_repeat: bool,
    ) -> Result<Box<dyn Registration>, String> {
        Err("global hotkeys are only supported on Windows".to_string())
    }
}

/// Starts hotkey listeners on a particular backend
#[derive(Clone)]
pub struct HotkeyListener {
    backend: Arc<dyn HotkeyBackend>,
    confirm_timeout: Duration,
}

impl HotkeyListener {
    pub fn new(backend: Arc<dyn HotkeyBackend>) -> Self {
        Self {
            backend,
            confirm_timeout: REGISTRATION_CONFIRM_TIMEOUT,
        }
    }

    /// Listener using the OS hotkey service of the current target
    pub fn platform() -> Self {
        #[cfg(windows)]
        let backend: Arc<dyn HotkeyBackend> = Arc::new(crate::win_hotkey::WindowsHotkeys);
        #[cfg(not(windows))]
        let backend: Arc<dyn HotkeyBackend> = Arc::new(UnsupportedHotkeys);

        Self::new(backend)
    }

    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    /// Parse `combo` and start listening for it.
    ///
    /// Malformed strings fail with [`HotkeyError::Parse`] before the backend
    /// is touched.
    pub fn start_str<F>(
        &self,
        combo: &str,
        on_trigger: F,
        no_repeat: bool,
        id: u32,
    ) -> Result<ListenerHandle, HotkeyError>
    where
        F: FnMut(HotkeyEvent) + Send + 'static,
    {
        let combination = KeyCombination::parse(combo)?;
        self.start(combination, on_trigger, no_repeat, id)
    }

    /// Spawn a listener thread for `combination`.
    ///
    /// Returns once the thread has reported whether the OS accepted the
    /// registration. `on_trigger` runs on the listener thread, one call at a
    /// time; a panic inside it is logged and swallowed.
    pub fn start<F>(
        &self,
        combination: KeyCombination,
        on_trigger: F,
        no_repeat: bool,
        id: u32,
    ) -> Result<ListenerHandle, HotkeyError>
    where
        F: FnMut(HotkeyEvent) + Send + 'static,
    {
        if id == 0 || id > MAX_HOTKEY_ID {
            return Err(HotkeyError::InvalidId(id));
        }

        let claim = IdClaim::acquire(id).ok_or_else(|| HotkeyError::Registration {
            id,
            reason: "id is already in use by another listener".to_string(),
        })?;

        let (ready_tx, ready_rx) = kanal::bounded::<Result<PumpWaker, String>>(1);
        let stopping = Arc::new(AtomicBool::new(false));

        let thread = {
            let backend = Arc::clone(&self.backend);
            let stopping = Arc::clone(&stopping);
            thread::Builder::new()
                .name(format!("hotkey-{id}"))
                .spawn(move || {
                    let _claim = claim;
                    pump(
                        backend.as_ref(),
                        HotkeyEvent { id, combination },
                        no_repeat,
                        ready_tx,
                        &stopping,
                        on_trigger,
                    );
                })
                .map_err(|e| HotkeyError::Registration {
                    id,
                    reason: format!("failed to spawn listener thread: {e}"),
                })?
        };

        match ready_rx.recv_timeout(self.confirm_timeout) {
            Ok(Ok(waker)) => {
                tracing::info!("Hotkey {} registered with id {}", combination, id);
                Ok(ListenerHandle {
                    id,
                    combination,
                    stopping,
                    waker: Some(waker),
                    thread: Some(thread),
                })
            }
            Ok(Err(reason)) => {
                // The thread is already on its way out without a pump
                let _ = thread.join();
                tracing::warn!("Hotkey {} rejected: {}", combination, reason);
                Err(HotkeyError::Registration { id, reason })
            }
            Err(kanal::ReceiveErrorTimeout::Timeout) => {
                stopping.store(true, Ordering::SeqCst);
                drop(ready_rx);
                tracing::warn!(
                    "Hotkey {} not confirmed within {:?}, abandoning listener thread",
                    combination,
                    self.confirm_timeout
                );
                Err(HotkeyError::Registration {
                    id,
                    reason: format!(
                        "listener thread did not confirm registration within {:?}",
                        self.confirm_timeout
                    ),
                })
            }
            Err(_) => {
                let _ = thread.join();
                Err(HotkeyError::Registration {
                    id,
                    reason: "listener thread exited before registering".to_string(),
                })
            }
        }
    }
}

/// Body of the listener thread
fn pump<F>(
    backend: &dyn HotkeyBackend,
    event: HotkeyEvent,
    no_repeat: bool,
    ready_tx: kanal::Sender<Result<PumpWaker, String>>,
    stopping: &AtomicBool,
    mut on_trigger: F,
) where
    F: FnMut(HotkeyEvent),
{
    let mut registration = match backend.register(event.id, &event.combination, no_repeat) {
        Ok(registration) => registration,
        Err(reason) => {
            let _ = ready_tx.send(Err(reason));
            return;
        }
    };

    if ready_tx.send(Ok(registration.waker())).is_err() || stopping.load(Ordering::SeqCst) {
        tracing::debug!("Nobody waiting for hotkey {}, releasing it", event.id);
        return;
    }
    drop(ready_tx);

    loop {
        if stopping.load(Ordering::SeqCst) {
            break;
        }

        match registration.next_message() {
            PumpMessage::Hotkey(id) if id == event.id => {
                if stopping.load(Ordering::SeqCst) {
                    break;
                }
                tracing::debug!("Hotkey {} triggered", event.combination);
                if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| on_trigger(event))) {
                    tracing::warn!(
                        "Hotkey {} callback panicked: {}",
                        event.id,
                        panic_message(panic.as_ref())
                    );
                }
            }
            PumpMessage::Hotkey(other) => {
                tracing::trace!("Ignoring hotkey id {} on listener {}", other, event.id);
            }
            PumpMessage::Quit => break,
            PumpMessage::Other => {}
        }
    }

    drop(registration);
    tracing::debug!("Hotkey {} unregistered", event.id);
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// RAII claim on a process-wide hotkey id
struct IdClaim(u32);

impl IdClaim {
    fn acquire(id: u32) -> Option<Self> {
        let mut ids = ACTIVE_IDS.lock().unwrap_or_else(|e| e.into_inner());
        ids.insert(id).then_some(IdClaim(id))
    }
}

impl Drop for IdClaim {
    fn drop(&mut self) {
        ACTIVE_IDS
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.0);
    }
}

/// An active global hotkey and the thread pumping its messages.
///
/// Dropping the handle stops the listener.
pub struct ListenerHandle {
    id: u32,
    combination: KeyCombination,
    stopping: Arc<AtomicBool>,
    waker: Option<PumpWaker>,
    thread: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn combination(&self) -> KeyCombination {
        self.combination
    }

    pub fn is_listening(&self) -> bool {
        self.thread.is_some()
    }

    /// Stop listening and wait for the listener thread to exit.
    ///
    /// The hotkey is unregistered before this returns. Calling it again is a
    /// no-op.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        self.stopping.store(true, Ordering::SeqCst);
        if let Some(wake) = self.waker.take() {
            wake();
        }

        if thread.thread().id() == thread::current().id() {
            tracing::warn!(
                "Hotkey {} stopped from its own callback, not joining",
                self.id
            );
            return;
        }

        if thread.join().is_err() {
            tracing::error!("Hotkey {} listener thread panicked", self.id);
        }
        tracing::info!("Hotkey {} stopped", self.combination);
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("combination", &self.combination.to_string())
            .field("listening", &self.is_listening())
            .finish()
    }
}
