
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kanal::AsyncReceiver;
use snaplate_config::Config;
use snaplate_ocr::{
    Bitmap, EngineError, HotkeyBackend, HotkeyListener, KeyCombination, OcrBridge, PixelFormat,
    PumpMessage, PumpWaker, RecognitionEngine, RecognitionService, RecognizedPage, Registration,
    ScreenCapture,
};
use snaplate_translator::{ProviderMetadata, TranslateError, Translation, Translator};
use snaplate_types::{AppEvent, CaptureRegion};

use crate::state::AppState;

pub(crate) fn temp_settings(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("snaplate-app-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("settings.json")
}

/// Screen grabber returning a blank 4x4 frame
#[derive(Default)]
pub(crate) struct FakeCapture {
    pub fail: bool,
    pub calls: AtomicUsize,
    pub last_region: Mutex<Option<CaptureRegion>>,
}

impl ScreenCapture for FakeCapture {
    fn capture(&self, region: Option<CaptureRegion>) -> anyhow::Result<Bitmap> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_region.lock().unwrap() = region;
        if self.fail {
            anyhow::bail!("monitor went away");
        }
        Ok(Bitmap::new(4, 4, PixelFormat::Rgba8, vec![0; 64])?)
    }
}

/// Recognizer that knows `en-US` and always reads `lines`
pub(crate) struct FakeService {
    pub lines: Vec<String>,
}

impl FakeService {
    pub fn reading(lines: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
        })
    }
}

impl RecognitionService for FakeService {
    fn is_language_supported(&self, tag: &str) -> bool {
        tag == "en-US"
    }

    fn create_for_language(&self, _tag: &str) -> Option<Box<dyn RecognitionEngine>> {
        Some(Box::new(FakeEngine {
            lines: self.lines.clone(),
        }))
    }
}

struct FakeEngine {
    lines: Vec<String>,
}

#[async_trait::async_trait(?Send)]
impl RecognitionEngine for FakeEngine {
    async fn recognize(&self, _bitmap: &Bitmap) -> Result<RecognizedPage, EngineError> {
        Ok(RecognizedPage::from_lines(
            self.lines.iter().map(|line| line.split(' ')),
        ))
    }
}

/// Prefixes the text, or fails with a rate limit
pub(crate) struct FakeTranslator {
    pub fail: bool,
}

#[async_trait::async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str) -> Result<Translation, TranslateError> {
        if self.fail {
            return Err(TranslateError::RateLimitExceeded);
        }
        Ok(Translation {
            text: format!("[ko] {text}"),
            provider: "fake".to_string(),
            model: "fake-1".to_string(),
        })
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "fake".to_string(),
            requires_api_key: false,
            free_tier_available: true,
        }
    }
}

pub(crate) fn test_state(
    name: &str,
    config: Config,
    lines: &[&str],
    capture: Arc<FakeCapture>,
    translator: Option<Arc<dyn Translator>>,
) -> Arc<AppState> {
    let state = AppState::new(
        config,
        temp_settings(name),
        OcrBridge::new(FakeService::reading(lines)),
        capture,
    )
    .with_translator(translator);
    Arc::new(state)
}

/// Everything queued so far, without waiting
pub(crate) fn drain(rx: &AsyncReceiver<AppEvent>) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub(crate) fn statuses(events: &[AppEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            AppEvent::OcrStatusUpdate { status, .. } => Some(status.clone()),
            _ => None,
        })
        .collect()
}

/// Wait for the next status line, skipping other UI events
pub(crate) async fn next_status(rx: &AsyncReceiver<AppEvent>) -> String {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no UI event within 5s")
            .expect("UI channel closed");
        if let AppEvent::OcrStatusUpdate { status, .. } = event {
            return status;
        }
    }
}

/// Simulated OS hotkey table
#[derive(Default)]
pub(crate) struct FakeOs {
    registered: Mutex<HashSet<u32>>,
    queues: Mutex<HashMap<u32, kanal::Sender<PumpMessage>>>,
    register_calls: AtomicUsize,
    reject: Mutex<Option<String>>,
    register_delay: Mutex<Duration>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    os: Arc<FakeOs>,
}

impl FakeBackend {
    pub fn listener(&self) -> HotkeyListener {
        HotkeyListener::new(Arc::new(self.clone()))
    }

    pub fn press(&self, id: u32) {
        let queues = self.os.queues.lock().unwrap();
        queues[&id].send(PumpMessage::Hotkey(id)).unwrap();
    }

    pub fn reject_with(&self, reason: &str) {
        *self.os.reject.lock().unwrap() = Some(reason.to_string());
    }

    /// Make every registration block its listener thread for `delay`
    pub fn delay_registration(&self, delay: Duration) {
        *self.os.register_delay.lock().unwrap() = delay;
    }

    pub fn is_registered(&self, id: u32) -> bool {
        self.os.registered.lock().unwrap().contains(&id)
    }

    pub fn register_calls(&self) -> usize {
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
        std::thread::sleep(*self.os.register_delay.lock().unwrap());
        if let Some(reason) = self.os.reject.lock().unwrap().clone() {
            return Err(reason);
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
