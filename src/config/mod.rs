//! Platform configuration
//!
//! Window defaults and graphics context settings, read from an optional TOML
//! file. Every field has a default, so a partial file or no file at all is
//! a valid configuration.

pub mod settings;

pub use settings::{ConfigError, ContextConfig, DEFAULT_CONFIG_FILE, PlatformConfig, WindowConfig};
