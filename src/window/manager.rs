//! Window class ownership, window registry and message routing
//!
//! Initialising the manager registers the window class and resolves the WGL
//! extension functions once, through a temporary context on a hidden scratch
//! window. Every window created afterwards is kept in an arena keyed by
//! [`WindowId`], and messages pumped from the OS are routed to it by native
//! handle.

use std::collections::HashMap;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::app::state::{LifecycleEvent, ManagerState, StateMachine};
use crate::config::WindowConfig;
use crate::domain::core::Rect;
use crate::error::{ErrorCode, fatal};
use crate::graphics::{
    ContextError, ExtensionError, GraphicsAdapterManager, GraphicsExtensionManager,
    GraphicsExtensions, TemporaryGraphicsContext,
};
use crate::platform::{NativeWindow, OsError, Platform, WindowMessage, WindowStyle};
use crate::window::window::{Window, WindowError};

const COMPONENT: &str = "[window::manager]";

/// Bootstrap windows only need a device context
const BOOTSTRAP_RECTANGLE: Rect = Rect {
    x: 0,
    y: 0,
    w: 1,
    h: 1,
};

new_key_type! {
    /// Key of a window owned by a [`WindowManager`]
    pub struct WindowId;
}

#[derive(Debug, Error)]
pub enum WindowManagerError {
    #[error("Failed to unregister window class {class_name}")]
    DeregisterClassFailed {
        class_name: String,
        #[source]
        source: OsError,
    },

    #[error("Failed to create a window")]
    CreateWindowFailed(#[source] OsError),

    #[error("Failed to destroy a window")]
    DestroyWindowFailed(#[source] OsError),

    #[error("Failed to register window class {class_name}")]
    RegisterClassFailed {
        class_name: String,
        #[source]
        source: OsError,
    },

    #[error("Failed to adjust the window rectangle for its frame")]
    AdjustRectFailed(#[source] OsError),

    #[error("Window {id:?} is not owned by this window manager")]
    UnknownWindow { id: WindowId },

    #[error("Cannot {operation} a window manager that is {state}")]
    InvalidState {
        operation: &'static str,
        state: ManagerState,
    },

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Extension(#[from] ExtensionError),
}

impl ErrorCode for WindowManagerError {
    fn code(&self) -> u32 {
        match self {
            WindowManagerError::DeregisterClassFailed { .. } => 0x000400,
            WindowManagerError::CreateWindowFailed(_) => 0x000401,
            WindowManagerError::DestroyWindowFailed(_) => 0x000402,
            WindowManagerError::RegisterClassFailed { .. } => 0x000403,
            WindowManagerError::AdjustRectFailed(_) => 0x000404,
            WindowManagerError::UnknownWindow { .. } => 0x000405,
            WindowManagerError::InvalidState { .. } => 0x000406,
            WindowManagerError::Window(error) => error.code(),
            WindowManagerError::Context(error) => error.code(),
            WindowManagerError::Extension(error) => error.code(),
        }
    }
}

/// Owns the window class and every window created through it
pub struct WindowManager {
    platform: Rc<dyn Platform>,
    config: WindowConfig,
    state: ManagerState,
    windows: SlotMap<WindowId, Window>,
    routes: HashMap<NativeWindow, WindowId>,
    extensions: Option<GraphicsExtensions>,
}

impl WindowManager {
    pub fn new(platform: Rc<dyn Platform>, config: WindowConfig) -> Self {
        Self {
            platform,
            config,
            state: ManagerState::default(),
            windows: SlotMap::with_key(),
            routes: HashMap::new(),
            extensions: None,
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn platform(&self) -> &Rc<dyn Platform> {
        &self.platform
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Extension functions resolved by [`initialise`](Self::initialise)
    pub fn extensions(&self) -> Option<&GraphicsExtensions> {
        self.extensions.as_ref()
    }

    pub fn windows(&self) -> impl Iterator<Item = (WindowId, &Window)> {
        self.windows.iter()
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(id)
    }

    /// Registers the window class and bootstraps the extension functions
    ///
    /// On failure the class is unregistered again and the manager stays
    /// uninitialised.
    pub fn initialise(&mut self) -> Result<(), WindowManagerError> {
        let next = self.transition("initialise", LifecycleEvent::Initialise)?;
        let class_name = self.config.class_name.as_str();

        self.platform
            .register_window_class(class_name)
            .map_err(|source| {
                fatal(
                    COMPONENT,
                    WindowManagerError::RegisterClassFailed {
                        class_name: class_name.to_string(),
                        source,
                    },
                )
            })?;

        let extensions = match self.bootstrap_extensions() {
            Ok(extensions) => extensions,
            Err(error) => {
                if let Err(source) = self.platform.unregister_window_class(class_name) {
                    log::warn!("{COMPONENT} Failed to unregister {class_name}: {source}");
                }
                return Err(error);
            }
        };

        log::info!(
            "{COMPONENT} Registered window class {class_name}, swap control {}",
            if extensions.has_swap_control() { "available" } else { "unavailable" }
        );

        self.extensions = Some(extensions);
        self.state = next;
        Ok(())
    }

    /// Runs the extension bootstrap on a hidden scratch window, which is always
    /// destroyed afterwards
    fn bootstrap_extensions(&self) -> Result<GraphicsExtensions, WindowManagerError> {
        let scratch = self
            .platform
            .create_window(
                &self.config.class_name,
                &self.config.title,
                WindowStyle::DEFAULT,
                BOOTSTRAP_RECTANGLE,
            )
            .map_err(|source| fatal(COMPONENT, WindowManagerError::CreateWindowFailed(source)))?;

        let discovered = Self::discover_extensions(self.platform.clone(), scratch);

        let destroyed = self
            .platform
            .destroy_window(scratch)
            .map_err(|source| fatal(COMPONENT, WindowManagerError::DestroyWindowFailed(source)));

        let extensions = discovered?;
        destroyed?;
        Ok(extensions)
    }

    fn discover_extensions(
        platform: Rc<dyn Platform>,
        scratch: NativeWindow,
    ) -> Result<GraphicsExtensions, WindowManagerError> {
        let mut context = TemporaryGraphicsContext::new(platform, scratch);
        context.initialise()?;

        let extensions = GraphicsExtensionManager::initialise_extensions(&context)?;

        context.deinitialise()?;
        Ok(extensions)
    }

    /// Creates a window whose client area has the configured size, centred
    /// on the primary adapter's current display mode
    ///
    /// # Arguments
    /// * `adapters` - Enumerated adapters; without a primary one the window
    ///   is placed at the origin
    ///
    /// # Returns
    /// Key of the new window, or the OS failure that prevented it
    pub fn create_window(
        &mut self,
        adapters: &GraphicsAdapterManager,
    ) -> Result<WindowId, WindowManagerError> {
        self.require_initialised("create a window in")?;

        // Validated configs always fit; anything larger saturates
        let width = i32::try_from(self.config.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.config.height).unwrap_or(i32::MAX);
        let client = match adapters.primary().map(|adapter| adapter.current_display_mode()) {
            Some(mode) => Rect::centered(width, height, mode.width() as i32, mode.height() as i32),
            None => {
                log::warn!("{COMPONENT} No display adapter, placing window at the origin");
                Rect::new(0, 0, width, height)
            }
        };

        let outer = self
            .platform
            .adjust_window_rect(client, WindowStyle::DEFAULT)
            .map_err(|source| fatal(COMPONENT, WindowManagerError::AdjustRectFailed(source)))?;

        let handle = self
            .platform
            .create_window(
                &self.config.class_name,
                &self.config.title,
                WindowStyle::DEFAULT,
                outer,
            )
            .map_err(|source| fatal(COMPONENT, WindowManagerError::CreateWindowFailed(source)))?;

        // The OS may clamp the requested geometry
        let rectangle = match self.platform.window_rect(handle) {
            Ok(rectangle) => rectangle,
            Err(source) => {
                if let Err(error) = self.platform.destroy_window(handle) {
                    log::warn!("{COMPONENT} Failed to destroy {handle:?}: {error}");
                }
                let error = fatal(COMPONENT, WindowError::GetRectangleFailed(source));
                return Err(error.into());
            }
        };

        let id = self
            .windows
            .insert(Window::new(self.platform.clone(), handle, rectangle));
        self.routes.insert(handle, id);

        log::info!("{COMPONENT} Created window {id:?} ({handle:?}) at {rectangle:?}");
        Ok(id)
    }

    /// Destroys a window created by this manager
    ///
    /// A [`GraphicsContext`](crate::graphics::GraphicsContext) does not keep
    /// its window alive; destroy the context first. If the OS refuses, the
    /// window stays registered so a later call or `shutdown` can retry.
    ///
    /// # Arguments
    /// * `id` - Key returned by [`create_window`](Self::create_window)
    ///
    /// # Returns
    /// `UnknownWindow` for keys this manager does not hold, `DestroyWindowFailed`
    /// when the OS refuses
    pub fn destroy_window(&mut self, id: WindowId) -> Result<(), WindowManagerError> {
        let Some(window) = self.windows.get(id) else {
            return Err(fatal(COMPONENT, WindowManagerError::UnknownWindow { id }));
        };

        let handle = window.handle();
        self.platform
            .destroy_window(handle)
            .map_err(|source| fatal(COMPONENT, WindowManagerError::DestroyWindowFailed(source)))?;

        self.windows.remove(id);
        self.routes.remove(&handle);

        log::debug!("{COMPONENT} Destroyed window {id:?} ({handle:?})");
        Ok(())
    }

    /// Drains pending OS messages without blocking and routes each one to
    /// its window. Messages for unknown windows get default handling.
    pub fn process_messages(&mut self) {
        let Self {
            platform,
            windows,
            routes,
            ..
        } = self;

        platform.pump_messages(&mut |handle, message| {
            match routes.get(&handle).and_then(|id| windows.get_mut(*id)) {
                Some(window) => window.handle_message(message),
                None => {
                    if message == WindowMessage::Close {
                        log::debug!("{COMPONENT} Close request for unmanaged window {handle:?}");
                    }
                    false
                }
            }
        });
    }

    /// Destroys every window and unregisters the window class
    ///
    /// The manager is destroyed even when a step fails; the first failure is
    /// returned after all steps ran.
    pub fn shutdown(&mut self) -> Result<(), WindowManagerError> {
        let next = self.transition("shut down", LifecycleEvent::Shutdown)?;
        let registered = self.state == ManagerState::Initialised;
        self.state = next;
        self.routes.clear();
        self.extensions = None;

        let mut result = Ok(());
        for (id, window) in self.windows.drain() {
            if let Err(source) = self.platform.destroy_window(window.handle()) {
                let error = fatal(COMPONENT, WindowManagerError::DestroyWindowFailed(source));
                log::debug!("{COMPONENT} Window {id:?} was not destroyed");
                result = result.and(Err(error));
            }
        }

        if registered {
            let class_name = self.config.class_name.as_str();
            if let Err(source) = self.platform.unregister_window_class(class_name) {
                let error = fatal(
                    COMPONENT,
                    WindowManagerError::DeregisterClassFailed {
                        class_name: class_name.to_string(),
                        source,
                    },
                );
                result = result.and(Err(error));
            }
        }

        log::info!("{COMPONENT} Window manager shut down");
        result
    }

    fn transition(
        &self,
        operation: &'static str,
        event: LifecycleEvent,
    ) -> Result<ManagerState, WindowManagerError> {
        StateMachine::process_lifecycle_event(self.state, event).ok_or_else(|| {
            fatal(
                COMPONENT,
                WindowManagerError::InvalidState {
                    operation,
                    state: self.state,
                },
            )
        })
    }

    fn require_initialised(&self, operation: &'static str) -> Result<(), WindowManagerError> {
        if self.state == ManagerState::Initialised {
            Ok(())
        } else {
            Err(fatal(
                COMPONENT,
                WindowManagerError::InvalidState {
                    operation,
                    state: self.state,
                },
            ))
        }
    }
}

impl Drop for WindowManager {
    fn drop(&mut self) {
        if self.state == ManagerState::Initialised {
            // Failures were already logged
            let _ = self.shutdown();
        }
    }
}
