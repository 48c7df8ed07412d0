use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    HOT_KEY_MODIFIERS, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT, MOD_SHIFT, MOD_WIN, RegisterHotKey,
    UnregisterHotKey,
};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, MSG, PM_NOREMOVE, PeekMessageW, PostThreadMessageW,
    TranslateMessage, WM_HOTKEY, WM_QUIT, WM_USER,
};

use crate::combo::{KeyCombination, Modifiers};
use crate::hotkey::{HotkeyBackend, PumpMessage, PumpWaker, Registration};

/// `RegisterHotKey` bound to the listener thread's message queue
pub struct WindowsHotkeys;

impl HotkeyBackend for WindowsHotkeys {
    fn register(
        &self,
        id: u32,
        combination: &KeyCombination,
        no_repeat: bool,
    ) -> Result<Box<dyn Registration>, String> {
        // Make sure this thread owns a message queue before anyone posts to it
        let mut msg = MSG::default();
        unsafe {
            let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);
        }

        let mut flags = modifier_flags(combination.modifiers());
        if no_repeat {
            flags |= MOD_NOREPEAT;
        }

        unsafe { RegisterHotKey(None, id as i32, flags, combination.key().virtual_key_code()) }
            .map_err(|e| e.message().to_string())?;

        Ok(Box::new(WindowsRegistration {
            id,
            thread_id: unsafe { GetCurrentThreadId() },
        }))
    }
}

fn modifier_flags(modifiers: Modifiers) -> HOT_KEY_MODIFIERS {
    let mut flags = HOT_KEY_MODIFIERS(0);
    if modifiers.contains(Modifiers::CONTROL) {
        flags |= MOD_CONTROL;
    }
    if modifiers.contains(Modifiers::SHIFT) {
        flags |= MOD_SHIFT;
    }
    if modifiers.contains(Modifiers::ALT) {
        flags |= MOD_ALT;
    }
    if modifiers.contains(Modifiers::WIN) {
        flags |= MOD_WIN;
    }
    flags
}

struct WindowsRegistration {
    id: u32,
    thread_id: u32,
}

impl Registration for WindowsRegistration {
    fn waker(&self) -> PumpWaker {
        let thread_id = self.thread_id;
        Box::new(move || {
            if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
                tracing::warn!("Failed to wake hotkey thread {}: {}", thread_id, e);
            }
        })
    }

    fn next_message(&mut self) -> PumpMessage {
        let mut msg = MSG::default();
        let ret = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        match ret.0 {
            0 => PumpMessage::Quit,
            -1 => {
                tracing::error!("GetMessageW failed on hotkey thread {}", self.thread_id);
                PumpMessage::Quit
            }
            _ if msg.message == WM_HOTKEY => PumpMessage::Hotkey(msg.wParam.0 as u32),
            _ => {
                unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
                PumpMessage::Other
            }
        }
    }
}

impl Drop for WindowsRegistration {
    fn drop(&mut self) {
        if let Err(e) = unsafe { UnregisterHotKey(None, self.id as i32) } {
            tracing::warn!("Failed to unregister hotkey {}: {}", self.id, e);
        }
    }
}
