use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::System::Com::{COINIT_MULTITHREADED, CoInitializeEx, CoUninitialize};

/// RAII guard for COM initialization
///
/// Calls CoUninitialize on drop only if this guard's CoInitializeEx call
/// succeeded. A thread that already joined a single-threaded apartment keeps
/// it; WinRT calls made there still work.
pub struct ComGuard {
    owned: bool,
}

impl ComGuard {
    /// Join the multithreaded apartment on the current thread
    pub fn initialize() -> windows::core::Result<Self> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            tracing::trace!("Thread already in a single-threaded apartment");
            return Ok(ComGuard { owned: false });
        }
        hr.ok()?;
        Ok(ComGuard { owned: true })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.owned {
            unsafe { CoUninitialize() };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_com_guard_initialize() {
        let guard = ComGuard::initialize();
        assert!(guard.is_ok());
    }

    #[test]
    fn test_com_guard_nested() {
        let outer = ComGuard::initialize().unwrap();
        {
            let _inner = ComGuard::initialize().unwrap();
        }
        drop(outer);
        let guard = ComGuard::initialize();
        assert!(guard.is_ok());
    }
}
