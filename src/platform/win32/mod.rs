//! Win32 implementation of the platform seam
//!
//! Split by concern: `display` enumerates adapters and switches display
//! modes, `window` owns the window class, native windows and the message
//! pump, `wgl` handles pixel formats and OpenGL contexts.

mod display;
mod wgl;
mod window;

use windows::Win32::Foundation::{GetLastError, HINSTANCE, RECT};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::HiDpi::{
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, SetProcessDpiAwarenessContext,
};

use crate::domain::core::Rect;
use crate::platform::backend::OsError;

/// The real platform
#[derive(Debug)]
pub struct Win32Platform {
    instance: HINSTANCE,
}

impl Win32Platform {
    /// Opts into per-monitor DPI awareness and resolves the module instance
    ///
    /// DPI awareness has to be set before any window exists so rectangles
    /// are reported in real pixels.
    pub fn new() -> Result<Self, OsError> {
        unsafe {
            if SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2).is_err() {
                // Already set by a manifest or an earlier call
                log::debug!("[platform::win32] DPI awareness was already configured");
            }

            let module = GetModuleHandleW(None).map_err(|error| os_error("GetModuleHandleW", &error))?;
            Ok(Self {
                instance: module.into(),
            })
        }
    }
}

/// Builds an [`OsError`] from the calling thread's last-error value
fn last_error(function: &'static str) -> OsError {
    let code = unsafe { GetLastError() };
    OsError::new(function, code.0)
}

fn os_error(function: &'static str, error: &windows::core::Error) -> OsError {
    OsError::new(function, error.code().0 as u32)
}

fn to_win32_rect(rect: &Rect) -> RECT {
    RECT {
        left: rect.x,
        top: rect.y,
        right: rect.right(),
        bottom: rect.bottom(),
    }
}

fn from_win32_rect(rect: &RECT) -> Rect {
    Rect::from_edges(rect.left, rect.top, rect.right, rect.bottom)
}

/// Decodes a NUL-terminated UTF-16 buffer
fn from_wide(buffer: &[u16]) -> String {
    let length = buffer.iter().position(|&unit| unit == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..length])
}
