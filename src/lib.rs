//! Windows display, window and OpenGL context bootstrap
//!
//! Enumerates display adapters and their modes, owns native windows through
//! a [`WindowManager`], and creates WGL rendering contexts in two steps: a
//! temporary context resolves the extension functions, which then select the
//! pixel format and create the real context.
//!
//! All OS access goes through [`platform::Platform`]. `platform::win32` is
//! the real implementation on Windows; [`platform::HeadlessPlatform`] is an
//! in-memory one used by the tests and on other hosts.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod graphics;
pub mod platform;
pub mod ui;
pub mod window;

pub use app::{AppError, Application};
pub use config::PlatformConfig;
pub use error::ErrorCode;
pub use window::{Window, WindowId, WindowManager};
