//! Listener lifecycle against a simulated message queue

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::combo::KeyCombination;
use crate::hotkey::{
    HotkeyBackend, HotkeyError, HotkeyEvent, HotkeyListener, PumpMessage, PumpWaker, Registration,
};

#[derive(Default)]
struct FakeOs {
    registered: Mutex<HashSet<u32>>,
    queues: Mutex<HashMap<u32, kanal::Sender<PumpMessage>>>,
    register_calls: AtomicUsize,
    register_delay: Mutex<Option<Duration>>,
}

#[derive(Clone, Default)]
struct FakeBackend {
    os: Arc<FakeOs>,
}

impl FakeBackend {
    fn listener(&self) -> HotkeyListener {
        HotkeyListener::new(Arc::new(self.clone()))
    }

    /// Simulate the OS posting WM_HOTKEY for `id`
    fn press(&self, id: u32) {
        let queues = self.os.queues.lock().unwrap();
        queues[&id].send(PumpMessage::Hotkey(id)).unwrap();
    }

    /// Simulate an unrelated window message
    fn post_other(&self, id: u32) {
        let queues = self.os.queues.lock().unwrap();
        queues[&id].send(PumpMessage::Other).unwrap();
    }

    fn is_registered(&self, id: u32) -> bool {
        self.os.registered.lock().unwrap().contains(&id)
    }

    fn register_calls(&self) -> usize {
        self.os.register_calls.load(Ordering::SeqCst)
    }
}

impl HotkeyBackend for FakeBackend {
    fn register(
        &self,
        id: u32,
        _combination: &KeyCombination,
        _no_repeat: bool,
    ) -> Result<Box<dyn Registration>, String> {
        self.os.register_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = *self.os.register_delay.lock().unwrap() {
            thread::sleep(delay);
        }

        if !self.os.registered.lock().unwrap().insert(id) {
            return Err("Hot key is already registered.".to_string());
        }

        let (tx, rx) = kanal::unbounded();
        self.os.queues.lock().unwrap().insert(id, tx.clone());
        Ok(Box::new(FakeRegistration {
            id,
            os: Arc::clone(&self.os),
            tx,
            rx,
        }))
    }
}

struct FakeRegistration {
    id: u32,
    os: Arc<FakeOs>,
    tx: kanal::Sender<PumpMessage>,
    rx: kanal::Receiver<PumpMessage>,
}

impl Registration for FakeRegistration {
    fn waker(&self) -> PumpWaker {
        let tx = self.tx.clone();
        Box::new(move || {
            let _ = tx.send(PumpMessage::Quit);
        })
    }

    fn next_message(&mut self) -> PumpMessage {
        self.rx.recv().unwrap_or(PumpMessage::Quit)
    }
}

impl Drop for FakeRegistration {
    fn drop(&mut self) {
        self.os.queues.lock().unwrap().remove(&self.id);
        self.os.registered.lock().unwrap().remove(&self.id);
    }
}

fn combo() -> KeyCombination {
    KeyCombination::parse("ctrl+shift+c").unwrap()
}

#[test]
fn test_start_registers_and_stop_unregisters() {
    let backend = FakeBackend::default();
    let mut handle = backend
        .listener()
        .start(combo(), |_| {}, true, 101)
        .expect("start failed");

    assert!(handle.is_listening());
    assert!(backend.is_registered(101));

    handle.stop();
    assert!(!handle.is_listening());
    assert!(!backend.is_registered(101));
}

#[test]
fn test_malformed_combo_never_reaches_backend() {
    let backend = FakeBackend::default();
    let listener = backend.listener();

    for combo in ["ctrl+shift", "ctrl+a+b", "hyper+a", ""] {
        let result = listener.start_str(combo, |_| {}, true, 102);
        assert!(
            matches!(result, Err(HotkeyError::Parse(_))),
            "{combo:?} should fail to parse"
        );
    }
    assert_eq!(backend.register_calls(), 0);
}

#[test]
fn test_invalid_id_rejected() {
    let backend = FakeBackend::default();
    let result = backend.listener().start(combo(), |_| {}, true, 0);
    assert_eq!(result.unwrap_err(), HotkeyError::InvalidId(0));
    assert_eq!(backend.register_calls(), 0);
}

#[test]
fn test_duplicate_id_fails_until_stopped() {
    let backend = FakeBackend::default();
    let listener = backend.listener();

    let mut first = listener.start(combo(), |_| {}, true, 103).unwrap();
    let second = listener.start_str("alt+f12", |_| {}, true, 103);
    assert!(matches!(
        second,
        Err(HotkeyError::Registration { id: 103, .. })
    ));

    first.stop();
    let mut third = listener
        .start_str("alt+f12", |_| {}, true, 103)
        .expect("id should be reusable after stop");
    assert!(third.is_listening());
    third.stop();
}

#[test]
fn test_os_rejection_reports_reason() {
    let backend = FakeBackend::default();
    backend.os.registered.lock().unwrap().insert(104);

    let err = backend
        .listener()
        .start(combo(), |_| {}, true, 104)
        .unwrap_err();
    assert_eq!(
        err,
        HotkeyError::Registration {
            id: 104,
            reason: "Hot key is already registered.".to_string()
        }
    );

    // The failed listener released its id claim before start returned
    backend.os.registered.lock().unwrap().remove(&104);
    let mut handle = backend.listener().start(combo(), |_| {}, true, 104).unwrap();
    handle.stop();
}

#[test]
fn test_stop_is_idempotent() {
    let backend = FakeBackend::default();
    let mut handle = backend.listener().start(combo(), |_| {}, true, 105).unwrap();

    let started = Instant::now();
    handle.stop();
    handle.stop();
    drop(handle);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_trigger_delivered_once_per_event_on_listener_thread() {
    let backend = FakeBackend::default();
    let (tx, rx) = kanal::unbounded::<(HotkeyEvent, thread::ThreadId)>();

    let mut handle = backend
        .listener()
        .start(
            combo(),
            move |event| {
                tx.send((event, thread::current().id())).unwrap();
            },
            true,
            106,
        )
        .unwrap();

    backend.press(106);
    backend.post_other(106);
    backend.press(106);
    backend.press(106);

    let main_thread = thread::current().id();
    for _ in 0..3 {
        let (event, thread_id) = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(event.id, 106);
        assert_eq!(event.combination, combo());
        assert_ne!(thread_id, main_thread);
    }
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    handle.stop();
}

#[test]
fn test_panicking_callback_does_not_kill_listener() {
    let backend = FakeBackend::default();
    let (tx, rx) = kanal::unbounded::<u32>();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut handle = {
        let calls = Arc::clone(&calls);
        backend
            .listener()
            .start(
                combo(),
                move |event| {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        panic!("callback failure");
                    }
                    tx.send(event.id).unwrap();
                },
                true,
                107,
            )
            .unwrap()
    };

    backend.press(107);
    backend.press(107);

    assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), 107);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(backend.is_registered(107));

    handle.stop();
    assert!(!backend.is_registered(107));
}

#[test]
fn test_slow_registration_times_out_and_releases() {
    let backend = FakeBackend::default();
    *backend.os.register_delay.lock().unwrap() = Some(Duration::from_millis(300));

    let listener = backend
        .listener()
        .with_confirm_timeout(Duration::from_millis(50));
    let result = listener.start(combo(), |_| {}, true, 108);
    assert!(matches!(
        result,
        Err(HotkeyError::Registration { id: 108, .. })
    ));

    // The abandoned thread gives the id back once its late registration lands
    *backend.os.register_delay.lock().unwrap() = None;
    let listener = backend.listener();
    let deadline = Instant::now() + Duration::from_secs(2);
    let mut handle = loop {
        match listener.start(combo(), |_| {}, true, 108) {
            Ok(handle) => break handle,
            Err(_) => {
                assert!(Instant::now() < deadline, "id 108 was never released");
                thread::sleep(Duration::from_millis(20));
            }
        }
    };
    assert_eq!(backend.register_calls(), 2);
    handle.stop();
}

#[test]
fn test_drop_stops_listener() {
    let backend = FakeBackend::default();
    {
        let _handle = backend.listener().start(combo(), |_| {}, true, 109).unwrap();
        assert!(backend.is_registered(109));
    }
    assert!(!backend.is_registered(109));
}
