//! Rendering contexts
//!
//! Two variants share one native core. [`TemporaryGraphicsContext`] lives on
//! a scratch window with a default pixel format and only exists to resolve
//! extension functions. [`GraphicsContext`] is the real context, created
//! through the extension entry point on a window whose pixel format was
//! picked by the config chooser.
//!
//! Both hold an `Rc` to the platform and are therefore `!Send`: a context
//! can only ever be used by the thread that created it. Only one context may
//! be current per thread; making another current implicitly unbinds the
//! previous one at the OS level.

use std::rc::Rc;

use thiserror::Error;

use crate::app::state::{ContextEvent, ContextState, StateMachine};
use crate::error::{ErrorCode, fatal};
use crate::graphics::config_chooser::GraphicsConfig;
use crate::graphics::extensions::GraphicsExtensions;
use crate::platform::{
    ContextAttributes, DeviceContext, NativeContext, NativeWindow, OsError, Platform, ProcAddress,
};
use crate::window::Window;

const COMPONENT: &str = "[graphics::context]";

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Cannot {operation} a context that is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: ContextState,
    },

    #[error("Failed to get the device context of the window")]
    DeviceContextFailed(#[source] OsError),

    #[error("Failed to choose a default pixel format")]
    DefaultPixelFormatFailed(#[source] OsError),

    #[error("Failed to apply pixel format {format}")]
    PixelFormatFailed {
        format: i32,
        #[source]
        source: OsError,
    },

    #[error("Failed to create the rendering context")]
    CreationFailed(#[source] OsError),

    #[error("Failed to make the context current")]
    MakeCurrentFailed(#[source] OsError),

    #[error("Failed to make the context non-current")]
    MakeNonCurrentFailed(#[source] OsError),

    #[error("Cannot {operation} while the context is not current")]
    NotCurrent { operation: &'static str },

    #[error("Failed to swap buffers")]
    SwapFailed(#[source] OsError),

    #[error("Failed to set swap interval {interval}")]
    SwapIntervalFailed {
        interval: i32,
        #[source]
        source: OsError,
    },

    #[error("Failed to delete the rendering context")]
    DeletionFailed(#[source] OsError),

    #[error("Temporary context used before initialise")]
    NotInitialised,
}

impl ErrorCode for ContextError {
    fn code(&self) -> u32 {
        match self {
            ContextError::InvalidTransition { .. } => 0x000700,
            ContextError::DeviceContextFailed(_) => 0x000701,
            ContextError::PixelFormatFailed { .. } => 0x000702,
            ContextError::CreationFailed(_) => 0x000703,
            ContextError::MakeCurrentFailed(_) => 0x000704,
            ContextError::MakeNonCurrentFailed(_) => 0x000705,
            ContextError::NotCurrent { .. } => 0x000706,
            ContextError::SwapFailed(_) => 0x000707,
            ContextError::SwapIntervalFailed { .. } => 0x000708,
            ContextError::DeletionFailed(_) => 0x000709,
            ContextError::DefaultPixelFormatFailed(_) => 0x00070A,
            ContextError::NotInitialised => 0x00070B,
        }
    }
}

/// Operations shared by both context variants
pub trait GraphicsContextBase {
    fn platform(&self) -> &dyn Platform;

    fn device_context(&self) -> Option<DeviceContext>;

    fn native_context(&self) -> Option<NativeContext>;

    fn state(&self) -> ContextState;

    fn make_current(&mut self) -> Result<(), ContextError>;

    fn make_non_current(&mut self) -> Result<(), ContextError>;

    /// Whether this context is bound to the calling thread right now
    fn is_current(&self) -> bool {
        self.native_context()
            .is_some_and(|context| self.platform().current_context() == Some(context))
    }
}

/// A live native context on a window's device context
struct NativeBinding {
    platform: Rc<dyn Platform>,
    window: NativeWindow,
    device_context: DeviceContext,
    context: NativeContext,
    state: ContextState,
}

impl NativeBinding {
    fn advance(&self, operation: &'static str, event: ContextEvent) -> Result<ContextState, ContextError> {
        StateMachine::process_context_event(self.state, event).ok_or_else(|| {
            fatal(
                COMPONENT,
                ContextError::InvalidTransition {
                    operation,
                    state: self.state,
                },
            )
        })
    }

    fn is_current(&self) -> bool {
        self.platform.current_context() == Some(self.context)
    }

    fn make_current(&mut self) -> Result<(), ContextError> {
        let next = self.advance("make current", ContextEvent::MakeCurrent)?;

        self.platform
            .make_current(Some((self.device_context, self.context)))
            .map_err(|source| fatal(COMPONENT, ContextError::MakeCurrentFailed(source)))?;

        self.state = next;
        Ok(())
    }

    fn make_non_current(&mut self) -> Result<(), ContextError> {
        let next = self.advance("make non-current", ContextEvent::MakeNonCurrent)?;

        if self.is_current() {
            self.platform
                .make_current(None)
                .map_err(|source| fatal(COMPONENT, ContextError::MakeNonCurrentFailed(source)))?;
        }

        self.state = next;
        Ok(())
    }

    fn swap_buffers(&self) -> Result<(), ContextError> {
        if !self.is_current() {
            return Err(fatal(
                COMPONENT,
                ContextError::NotCurrent {
                    operation: "swap buffers",
                },
            ));
        }

        self.platform
            .swap_buffers(self.device_context)
            .map_err(|source| fatal(COMPONENT, ContextError::SwapFailed(source)))
    }

    fn destroy(&mut self) -> Result<(), ContextError> {
        let next = self.advance("destroy", ContextEvent::Destroy)?;

        if self.is_current() {
            self.platform
                .make_current(None)
                .map_err(|source| fatal(COMPONENT, ContextError::MakeNonCurrentFailed(source)))?;
        }

        // Terminal even if deletion fails, the handle is not retried
        self.state = next;
        let deleted = self
            .platform
            .delete_context(self.context)
            .map_err(|source| fatal(COMPONENT, ContextError::DeletionFailed(source)));
        self.platform
            .release_device_context(self.window, self.device_context);

        deleted
    }
}

impl Drop for NativeBinding {
    fn drop(&mut self) {
        if self.state != ContextState::Destroyed {
            // Failures are already reported by destroy
            let _ = self.destroy();
        }
    }
}

/// Short-lived context used to bootstrap extension discovery
///
/// Construct, [`initialise`](Self::initialise), resolve extensions, then
/// [`deinitialise`](Self::deinitialise) within one scope. Dropping an
/// initialised context deinitialises it.
pub struct TemporaryGraphicsContext {
    platform: Rc<dyn Platform>,
    window: NativeWindow,
    binding: Option<NativeBinding>,
}

impl TemporaryGraphicsContext {
    pub fn new(platform: Rc<dyn Platform>, window: NativeWindow) -> Self {
        Self {
            platform,
            window,
            binding: None,
        }
    }

    /// Applies a default pixel format to the scratch window, creates a basic
    /// context on it and makes that context current
    pub fn initialise(&mut self) -> Result<(), ContextError> {
        if let Some(binding) = &self.binding {
            return Err(fatal(
                COMPONENT,
                ContextError::InvalidTransition {
                    operation: "initialise",
                    state: binding.state,
                },
            ));
        }

        let device_context = self
            .platform
            .device_context(self.window)
            .map_err(|source| fatal(COMPONENT, ContextError::DeviceContextFailed(source)))?;

        let context = self.create_basic_context(device_context).inspect_err(|_| {
            self.platform
                .release_device_context(self.window, device_context);
        })?;

        let mut binding = NativeBinding {
            platform: self.platform.clone(),
            window: self.window,
            device_context,
            context,
            state: ContextState::Created,
        };
        binding.make_current()?;

        log::debug!("{COMPONENT} Temporary context {:?} is current", context);
        self.binding = Some(binding);
        Ok(())
    }

    fn create_basic_context(&self, device_context: DeviceContext) -> Result<NativeContext, ContextError> {
        let format = self
            .platform
            .choose_default_pixel_format(device_context)
            .map_err(|source| fatal(COMPONENT, ContextError::DefaultPixelFormatFailed(source)))?;

        self.platform
            .set_pixel_format(device_context, format)
            .map_err(|source| fatal(COMPONENT, ContextError::PixelFormatFailed { format, source }))?;

        self.platform
            .create_basic_context(device_context)
            .map_err(|source| fatal(COMPONENT, ContextError::CreationFailed(source)))
    }

    /// Unbinds and deletes the context; a no-op when not initialised
    pub fn deinitialise(&mut self) -> Result<(), ContextError> {
        match self.binding.take() {
            Some(mut binding) => binding.destroy(),
            None => Ok(()),
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.binding.is_some()
    }

    fn binding_mut(&mut self) -> Result<&mut NativeBinding, ContextError> {
        self.binding
            .as_mut()
            .ok_or_else(|| fatal(COMPONENT, ContextError::NotInitialised))
    }
}

impl GraphicsContextBase for TemporaryGraphicsContext {
    fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    fn device_context(&self) -> Option<DeviceContext> {
        self.binding.as_ref().map(|binding| binding.device_context)
    }

    fn native_context(&self) -> Option<NativeContext> {
        self.binding.as_ref().map(|binding| binding.context)
    }

    fn state(&self) -> ContextState {
        self.binding
            .as_ref()
            .map_or(ContextState::Destroyed, |binding| binding.state)
    }

    fn make_current(&mut self) -> Result<(), ContextError> {
        self.binding_mut()?.make_current()
    }

    fn make_non_current(&mut self) -> Result<(), ContextError> {
        self.binding_mut()?.make_non_current()
    }
}

/// The rendering context of a window
///
/// The window must outlive the context. The context starts out non-bound;
/// call [`make_current`](GraphicsContextBase::make_current) before drawing.
pub struct GraphicsContext {
    binding: NativeBinding,
    swap_interval: Option<ProcAddress>,
}

impl GraphicsContext {
    /// Applies `config` to the window's device context and creates a context
    /// with the requested version and profile
    pub fn new(
        window: &Window,
        config: &GraphicsConfig,
        extensions: &GraphicsExtensions,
        attributes: &ContextAttributes,
    ) -> Result<Self, ContextError> {
        let platform = window.platform().clone();
        let handle = window.handle();

        let device_context = platform
            .device_context(handle)
            .map_err(|source| fatal(COMPONENT, ContextError::DeviceContextFailed(source)))?;

        let created = platform
            .set_pixel_format(device_context, config.pixel_format())
            .map_err(|source| {
                fatal(
                    COMPONENT,
                    ContextError::PixelFormatFailed {
                        format: config.pixel_format(),
                        source,
                    },
                )
            })
            .and_then(|()| {
                platform
                    .create_context(extensions.functions(), device_context, attributes)
                    .map_err(|source| fatal(COMPONENT, ContextError::CreationFailed(source)))
            });

        let context = match created {
            Ok(context) => context,
            Err(error) => {
                platform.release_device_context(handle, device_context);
                return Err(error);
            }
        };

        log::info!(
            "{COMPONENT} Created {}.{} {} context{} with pixel format {}",
            attributes.major_version,
            attributes.minor_version,
            if attributes.core_profile { "core" } else { "compatibility" },
            if attributes.debug { " (debug)" } else { "" },
            config.pixel_format()
        );

        Ok(Self {
            binding: NativeBinding {
                platform,
                window: handle,
                device_context,
                context,
                state: ContextState::Created,
            },
            swap_interval: extensions.functions().swap_interval,
        })
    }

    /// Window the context renders to
    pub fn window(&self) -> NativeWindow {
        self.binding.window
    }

    /// Presents the back buffer; the context must be current
    pub fn swap_buffers(&self) -> Result<(), ContextError> {
        self.binding.swap_buffers()
    }

    /// Sets the number of vertical blanks per swap (0 disables vsync)
    ///
    /// Without swap control support this only logs a warning.
    pub fn set_swap_interval(&self, interval: i32) -> Result<(), ContextError> {
        if !self.binding.is_current() {
            return Err(fatal(
                COMPONENT,
                ContextError::NotCurrent {
                    operation: "set the swap interval",
                },
            ));
        }

        let Some(function) = self.swap_interval else {
            log::warn!("{COMPONENT} Swap control is unavailable, ignoring interval {interval}");
            return Ok(());
        };

        self.binding
            .platform
            .set_swap_interval(function, interval)
            .map_err(|source| fatal(COMPONENT, ContextError::SwapIntervalFailed { interval, source }))
    }

    /// Unbinds if current and deletes the native context
    pub fn destroy(&mut self) -> Result<(), ContextError> {
        self.binding.destroy()
    }
}

impl GraphicsContextBase for GraphicsContext {
    fn platform(&self) -> &dyn Platform {
        self.binding.platform.as_ref()
    }

    fn device_context(&self) -> Option<DeviceContext> {
        Some(self.binding.device_context)
    }

    fn native_context(&self) -> Option<NativeContext> {
        (self.binding.state != ContextState::Destroyed).then_some(self.binding.context)
    }

    fn state(&self) -> ContextState {
        self.binding.state
    }

    fn make_current(&mut self) -> Result<(), ContextError> {
        self.binding.make_current()
    }

    fn make_non_current(&mut self) -> Result<(), ContextError> {
        self.binding.make_non_current()
    }
}
