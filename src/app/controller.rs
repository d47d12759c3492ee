//! Application controller
//!
//! [`Application`] is the process-scoped owner of the platform layer: the
//! adapter manager and the window manager. It wires configuration into both
//! and builds persistent graphics contexts for managed windows.

use std::rc::Rc;

use thiserror::Error;

use crate::app::state::ManagerState;
use crate::config::{ConfigError, PlatformConfig};
use crate::domain::image::ImageError;
use crate::error::{ErrorCode, fatal};
use crate::graphics::{
    AdapterError, ConfigChooserError, ContextError, ExtensionError, GraphicsAdapterManager,
    GraphicsConfigChooser, GraphicsContext, GraphicsContextBase,
};
use crate::platform::{OsError, Platform};
use crate::window::{Window, WindowError, WindowId, WindowManager, WindowManagerError};

const COMPONENT: &str = "[app]";

/// Every failure the platform layer can end the process with
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to set up the platform")]
    Platform(#[source] OsError),

    #[error("Invalid image")]
    Image(#[from] ImageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    WindowManager(#[from] WindowManagerError),

    #[error(transparent)]
    ConfigChooser(#[from] ConfigChooserError),

    #[error(transparent)]
    Extension(#[from] ExtensionError),

    #[error(transparent)]
    Context(#[from] ContextError),
}

impl ErrorCode for AppError {
    fn code(&self) -> u32 {
        match self {
            AppError::Platform(_) => 0x000001,
            AppError::Image(_) => 0x000002,
            AppError::Config(error) => error.code(),
            AppError::Adapter(error) => error.code(),
            AppError::Window(error) => error.code(),
            AppError::WindowManager(error) => error.code(),
            AppError::ConfigChooser(error) => error.code(),
            AppError::Extension(error) => error.code(),
            AppError::Context(error) => error.code(),
        }
    }
}

/// Owns the adapters and the window manager for the lifetime of the process
pub struct Application {
    config: PlatformConfig,
    // Declared first so windows go away before display modes are restored
    window_manager: WindowManager,
    adapters: GraphicsAdapterManager,
}

impl Application {
    /// Validates `config` and enumerates the display adapters
    pub fn new(platform: Rc<dyn Platform>, config: PlatformConfig) -> Result<Self, AppError> {
        config
            .validate()
            .map_err(|error| fatal(COMPONENT, error))?;

        let adapters = GraphicsAdapterManager::new(platform.clone());
        let window_manager = WindowManager::new(platform, config.window.clone());

        Ok(Self {
            config,
            window_manager,
            adapters,
        })
    }

    /// Registers the window class and bootstraps the graphics extensions
    pub fn initialise(&mut self) -> Result<(), AppError> {
        self.window_manager.initialise()?;
        Ok(())
    }

    pub fn state(&self) -> ManagerState {
        self.window_manager.state()
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn adapters(&self) -> &GraphicsAdapterManager {
        &self.adapters
    }

    pub fn adapters_mut(&mut self) -> &mut GraphicsAdapterManager {
        &mut self.adapters
    }

    pub fn window_manager(&self) -> &WindowManager {
        &self.window_manager
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.window_manager.window(id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.window_manager.window_mut(id)
    }

    /// Creates a window centred on the primary adapter
    pub fn create_window(&mut self) -> Result<WindowId, AppError> {
        Ok(self.window_manager.create_window(&self.adapters)?)
    }

    /// Destroys a managed window
    ///
    /// Contexts do not keep their window alive: destroy any context created
    /// by [`create_graphics_context`](Self::create_graphics_context) for this
    /// window first, or its swaps start failing.
    pub fn destroy_window(&mut self, id: WindowId) -> Result<(), AppError> {
        Ok(self.window_manager.destroy_window(id)?)
    }

    /// Routes pending OS messages to their windows
    pub fn process_messages(&mut self) {
        self.window_manager.process_messages();
    }

    /// True while at least one window has not been asked to close
    pub fn has_open_windows(&self) -> bool {
        self.window_manager.windows().any(|(_, window)| window.is_open())
    }

    /// Chooses a pixel format for the window and creates a context with the
    /// configured version and profile
    ///
    /// The context is returned current with the configured swap interval.
    /// Destroy it before its window.
    pub fn create_graphics_context(&self, id: WindowId) -> Result<GraphicsContext, AppError> {
        let Some(extensions) = self.window_manager.extensions() else {
            let error = WindowManagerError::InvalidState {
                operation: "create a graphics context in",
                state: self.window_manager.state(),
            };
            return Err(fatal(COMPONENT, error).into());
        };

        let Some(window) = self.window_manager.window(id) else {
            return Err(fatal(COMPONENT, WindowManagerError::UnknownWindow { id }).into());
        };

        let platform = window.platform();
        let device_context = window.device_context()?;
        let chosen =
            GraphicsConfigChooser::new(platform.as_ref(), extensions, device_context).choose_config();
        platform.release_device_context(window.handle(), device_context);

        let config = chosen?;
        let context = &self.config.context;
        let mut graphics_context =
            GraphicsContext::new(window, &config, extensions, &context.attributes())?;

        graphics_context.make_current()?;
        graphics_context.set_swap_interval(context.swap_interval)?;
        Ok(graphics_context)
    }

    /// Destroys every window and unregisters the window class. Display
    /// modes are restored when the application is dropped.
    pub fn shutdown(&mut self) -> Result<(), AppError> {
        self.window_manager.shutdown()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::core::Rect;
    use crate::domain::display_mode::DisplayMode;
    use crate::platform::{FailPoint, HeadlessPlatform, WindowMessage};

    fn application(platform: &Rc<HeadlessPlatform>) -> Application {
        let mut app = Application::new(platform.clone(), PlatformConfig::default()).unwrap();
        app.initialise().unwrap();
        app
    }

    #[test]
    fn window_lifecycle_end_to_end() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut app = application(&platform);

        let id = app.create_window().unwrap();
        let windowed = Rect::from_edges(552, 209, 1368, 848);
        assert_eq!(app.window(id).unwrap().rectangle(), windowed);

        let mut context = app.create_graphics_context(id).unwrap();
        assert!(context.is_current());
        assert_eq!(platform.swap_interval(), Some(1));
        context.swap_buffers().unwrap();
        assert_eq!(platform.swap_count(), 1);

        let window = app.window_mut(id).unwrap();
        window.set_fullscreen(true).unwrap();
        assert_eq!(window.rectangle(), Rect::new(0, 0, 1920, 1080));
        window.set_fullscreen(false).unwrap();
        assert_eq!(window.rectangle(), windowed);

        context.destroy().unwrap();
        app.destroy_window(id).unwrap();
        app.shutdown().unwrap();

        assert_eq!(app.state(), ManagerState::Destroyed);
        assert_eq!(platform.window_count(), 0);
        assert_eq!(platform.context_count(), 0);
        assert!(!platform.is_class_registered("ember"));
    }

    #[test]
    fn context_outliving_its_window_can_no_longer_swap() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut app = application(&platform);
        let id = app.create_window().unwrap();
        let mut context = app.create_graphics_context(id).unwrap();

        app.destroy_window(id).unwrap();

        let error = context.swap_buffers().unwrap_err();
        assert_eq!(error.code(), 0x000707);
        assert_eq!(platform.swap_count(), 0);

        context.destroy().unwrap();
        assert_eq!(platform.context_count(), 0);
    }

    #[test]
    fn invalid_config_is_rejected_before_touching_the_os() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut config = PlatformConfig::default();
        config.window.width = 0;

        let error = Application::new(platform.clone(), config).err().unwrap();

        assert_eq!(error.code(), 0x000802);
        assert!(platform.display_changes().is_empty());
    }

    #[test]
    fn graphics_context_needs_initialised_manager() {
        let platform = Rc::new(HeadlessPlatform::new());
        let app = Application::new(platform.clone(), PlatformConfig::default()).unwrap();

        let error = app.create_graphics_context(WindowId::default()).err().unwrap();

        assert_eq!(error.code(), 0x000406);
    }

    #[test]
    fn graphics_context_for_unknown_window_fails() {
        let platform = Rc::new(HeadlessPlatform::new());
        let app = application(&platform);

        let error = app.create_graphics_context(WindowId::default()).err().unwrap();

        assert_eq!(error.code(), 0x000405);
    }

    #[test]
    fn second_context_on_a_window_fails() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut app = application(&platform);
        let id = app.create_window().unwrap();
        let _context = app.create_graphics_context(id).unwrap();

        let error = app.create_graphics_context(id).err().unwrap();

        assert!(matches!(
            error,
            AppError::Context(ContextError::PixelFormatFailed { format: 3, .. })
        ));
        assert_eq!(platform.context_count(), 1);
    }

    #[test]
    fn chooser_failure_creates_no_context() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut app = application(&platform);
        let id = app.create_window().unwrap();
        platform.fail(FailPoint::PixelFormatCount);

        let error = app.create_graphics_context(id).err().unwrap();

        assert!(matches!(error, AppError::ConfigChooser(_)));
        assert_eq!(platform.context_count(), 0);
    }

    #[test]
    fn closing_every_window_ends_the_frame_loop() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut app = application(&platform);
        let first = app.create_window().unwrap();
        let second = app.create_window().unwrap();
        assert!(app.has_open_windows());

        for id in [first, second] {
            let handle = app.window(id).unwrap().handle();
            platform.post_message(handle, WindowMessage::Close);
        }
        app.process_messages();

        assert!(!app.has_open_windows());
    }

    #[test]
    fn dropping_application_restores_display_mode() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut app = application(&platform);
        app.adapters_mut().graphics_adapters_mut()[0]
            .set_display_mode(&DisplayMode::new(800, 600, 32, 60))
            .unwrap();
        app.create_window().unwrap();

        drop(app);

        assert_eq!(platform.restore_count(), 1);
        assert_eq!(platform.window_count(), 0);
        assert_eq!(
            platform.active_mode(r"\\.\DISPLAY1"),
            Some(DisplayMode::new(1920, 1080, 32, 60))
        );
    }
}
