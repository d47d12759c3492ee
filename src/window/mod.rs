//! Native windows and the manager that owns them

pub mod manager;
pub mod window;

pub use manager::{WindowId, WindowManager, WindowManagerError};
pub use window::{Window, WindowError};
