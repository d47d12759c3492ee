//! Domain value types
//!
//! Pure data independent of Win32: geometry, display modes, decoded images
//! and pixel format ranking.

pub mod core;
pub mod display_mode;
pub mod image;
pub mod pixel_format;
