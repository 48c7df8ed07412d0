mod bitmap;
mod bridge;
mod capture;
mod combo;
mod engine;
mod hotkey;

#[cfg(windows)]
mod com;
#[cfg(windows)]
mod ocr;
#[cfg(windows)]
mod win_hotkey;

#[cfg(test)]
mod tests;

pub use bitmap::{Bitmap, BitmapError, PixelFormat};
pub use bridge::{
    DEFAULT_GRACE, DEFAULT_TIMEOUT, MAX_TIMEOUT, OcrBridge, SchedulerGuard, scheduler_active,
};
pub use capture::{
    MonitorBounds, ScreenCapture, UnsupportedCapture, platform_capture, select_monitor,
};
pub use combo::{Key, KeyCombination, Modifiers, ParseError};
pub use engine::{
    EngineError, RecognitionEngine, RecognitionOutcome, RecognitionRequest, RecognitionService,
    RecognizedLine, RecognizedPage, UnsupportedRecognition,
};
pub use hotkey::{
    HotkeyBackend, HotkeyError, HotkeyEvent, HotkeyListener, ListenerHandle, MAX_HOTKEY_ID,
    PumpMessage, PumpWaker, REGISTRATION_CONFIRM_TIMEOUT, Registration, UnsupportedHotkeys,
};

#[cfg(windows)]
pub use capture::XcapCapture;
#[cfg(windows)]
pub use com::ComGuard;
#[cfg(windows)]
pub use ocr::{OcrEngine, WindowsOcr};
#[cfg(windows)]
pub use win_hotkey::WindowsHotkeys;
