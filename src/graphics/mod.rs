//! Display adapters and the WGL graphics bootstrap
//!
//! Adapters and their display modes are enumerated up front. Rendering
//! contexts come in two steps: a temporary context resolves the extension
//! functions, then the config chooser and the real context use them.

pub mod adapter;
pub mod adapter_manager;
pub mod config_chooser;
pub mod context;
pub mod extensions;

pub use adapter::{AdapterError, GraphicsAdapter};
pub use adapter_manager::GraphicsAdapterManager;
pub use config_chooser::{ConfigChooserError, GraphicsConfig, GraphicsConfigChooser};
pub use context::{ContextError, GraphicsContext, GraphicsContextBase, TemporaryGraphicsContext};
pub use extensions::{ExtensionError, GraphicsExtensionManager, GraphicsExtensions};
