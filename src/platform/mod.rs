//! Operating system access
//!
//! `backend` defines the seam every other module talks through. `win32` is
//! the real implementation, `headless` an in-memory one for tests and for
//! hosts without Win32.

pub mod backend;
pub mod headless;
#[cfg(windows)]
pub mod win32;

pub use backend::{
    AdapterInfo, ContextAttributes, DeviceContext, DisplayBackend, ExtensionFunctions, GlBackend,
    NativeContext, NativeIcon, NativeWindow, OsError, Platform, ProcAddress, WindowBackend,
    WindowMessage, WindowStyle,
};
pub use headless::{FailPoint, HeadlessAdapter, HeadlessPlatform};
#[cfg(windows)]
pub use win32::Win32Platform;
