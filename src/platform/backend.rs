//! The OS seam
//!
//! Everything above this module talks to the operating system through the
//! [`Platform`] trait: display adapter enumeration and mode switching, native
//! windows and their message queue, and WGL pixel formats and contexts.
//! Handles cross the seam as opaque integer newtypes.

use bitflags::bitflags;
use thiserror::Error;

use crate::domain::core::Rect;
use crate::domain::display_mode::DisplayMode;
use crate::domain::pixel_format::PixelFormatAttributeList;

/// Native window handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeWindow(pub isize);

/// Device context of a native window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceContext(pub isize);

/// Native rendering context handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeContext(pub isize);

/// Native icon handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeIcon(pub isize);

/// Address of a resolved extension function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcAddress(pub usize);

/// A failed OS call: the function name and the OS last-error value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{function} failed with OS error {code}")]
pub struct OsError {
    pub function: &'static str,
    pub code: u32,
}

impl OsError {
    pub fn new(function: &'static str, code: u32) -> Self {
        Self { function, code }
    }
}

bitflags! {
    /// Window chrome style, using the Win32 bit values
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WindowStyle: u32 {
        const BORDER = 0x0080_0000;
        const DLG_FRAME = 0x0040_0000;
        const CAPTION = Self::BORDER.bits() | Self::DLG_FRAME.bits();
        const SYSMENU = 0x0008_0000;
        const MINIMIZE_BOX = 0x0002_0000;
        const VISIBLE = 0x1000_0000;
    }
}

impl WindowStyle {
    /// Style of every window this crate creates
    pub const DEFAULT: WindowStyle = WindowStyle::CAPTION
        .union(WindowStyle::MINIMIZE_BOX)
        .union(WindowStyle::SYSMENU);
}

/// One display adapter as reported by the OS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub name: String,
    pub attached_to_desktop: bool,
    pub primary: bool,
}

/// Messages the window manager reacts to; everything else gets default handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMessage {
    /// The user asked for the window to close
    Close,
    /// The OS asks which cursor to show over the window
    SetCursor { in_client_area: bool },
}

/// Version and profile requested for a persistent context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAttributes {
    pub major_version: u32,
    pub minor_version: u32,
    pub core_profile: bool,
    pub debug: bool,
}

/// Extension entry points a context was bootstrapped with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionFunctions {
    pub get_extensions_string: ProcAddress,
    pub get_pixel_format_attribiv: ProcAddress,
    pub create_context_attribs: ProcAddress,
    pub swap_interval: Option<ProcAddress>,
}

/// Display adapters and display modes
pub trait DisplayBackend {
    /// Adapter at `index`, `None` once the OS has no more adapters
    fn adapter(&self, index: u32) -> Option<AdapterInfo>;

    /// Mode at `index` for `adapter`; the zero sentinel marks the end of the list
    fn display_mode(&self, adapter: &str, index: u32) -> DisplayMode;

    /// Mode the adapter is currently running, the zero sentinel if unknown
    fn current_display_mode(&self, adapter: &str) -> DisplayMode;

    /// Switches `adapter` to `mode` for fullscreen use; `None` restores the
    /// registry default
    fn change_display_mode(&self, adapter: &str, mode: Option<&DisplayMode>)
    -> Result<(), OsError>;
}

/// Native windows, their class and the message queue
pub trait WindowBackend {
    fn register_window_class(&self, class_name: &str) -> Result<(), OsError>;

    fn unregister_window_class(&self, class_name: &str) -> Result<(), OsError>;

    /// Outer window rectangle needed for a client area of `client`
    fn adjust_window_rect(&self, client: Rect, style: WindowStyle) -> Result<Rect, OsError>;

    fn create_window(
        &self,
        class_name: &str,
        title: &str,
        style: WindowStyle,
        rect: Rect,
    ) -> Result<NativeWindow, OsError>;

    fn destroy_window(&self, window: NativeWindow) -> Result<(), OsError>;

    fn window_rect(&self, window: NativeWindow) -> Result<Rect, OsError>;

    fn set_window_rect(&self, window: NativeWindow, rect: Rect) -> Result<(), OsError>;

    fn window_style(&self, window: NativeWindow) -> Result<WindowStyle, OsError>;

    fn set_window_style(&self, window: NativeWindow, style: WindowStyle) -> Result<(), OsError>;

    /// Full rectangle of the monitor nearest to the window
    fn monitor_rect(&self, window: NativeWindow) -> Result<Rect, OsError>;

    fn set_window_title(&self, window: NativeWindow, title: &str) -> Result<(), OsError>;

    fn show_window(&self, window: NativeWindow, visible: bool);

    /// System icon size in pixels
    fn icon_size(&self) -> (u32, u32);

    /// Creates an icon from straight-alpha BGRA rows
    fn create_icon(&self, width: u32, height: u32, bgra: &[u8]) -> Result<NativeIcon, OsError>;

    fn destroy_icon(&self, icon: NativeIcon) -> Result<(), OsError>;

    fn set_window_icon(&self, window: NativeWindow, icon: Option<NativeIcon>);

    fn hide_cursor(&self);

    /// Drains queued messages without blocking. `handler` returns true when it
    /// handled the message; false falls back to default processing.
    fn pump_messages(&self, handler: &mut dyn FnMut(NativeWindow, WindowMessage) -> bool);
}

/// WGL pixel formats and rendering contexts
pub trait GlBackend {
    fn device_context(&self, window: NativeWindow) -> Result<DeviceContext, OsError>;

    fn release_device_context(&self, window: NativeWindow, device_context: DeviceContext);

    /// Picks a basic RGBA double-buffered format without extensions
    fn choose_default_pixel_format(&self, device_context: DeviceContext) -> Result<i32, OsError>;

    fn set_pixel_format(&self, device_context: DeviceContext, format: i32) -> Result<(), OsError>;

    fn pixel_format_count(
        &self,
        functions: &ExtensionFunctions,
        device_context: DeviceContext,
    ) -> Result<u32, OsError>;

    fn pixel_format_attributes(
        &self,
        functions: &ExtensionFunctions,
        device_context: DeviceContext,
        format: i32,
        attribute_ids: &PixelFormatAttributeList,
    ) -> Result<PixelFormatAttributeList, OsError>;

    /// Creates a context without extensions
    fn create_basic_context(&self, device_context: DeviceContext)
    -> Result<NativeContext, OsError>;

    fn create_context(
        &self,
        functions: &ExtensionFunctions,
        device_context: DeviceContext,
        attributes: &ContextAttributes,
    ) -> Result<NativeContext, OsError>;

    fn delete_context(&self, context: NativeContext) -> Result<(), OsError>;

    /// Binds `context` to the calling thread; `None` unbinds the current one
    fn make_current(
        &self,
        binding: Option<(DeviceContext, NativeContext)>,
    ) -> Result<(), OsError>;

    fn current_context(&self) -> Option<NativeContext>;

    fn proc_address(&self, name: &str) -> Option<ProcAddress>;

    /// Space separated extension names reported by the current context
    fn extensions_string(
        &self,
        get_extensions_string: ProcAddress,
        device_context: DeviceContext,
    ) -> Result<String, OsError>;

    fn swap_buffers(&self, device_context: DeviceContext) -> Result<(), OsError>;

    fn set_swap_interval(&self, swap_interval: ProcAddress, interval: i32)
    -> Result<(), OsError>;
}

/// Everything the engine needs from the operating system
pub trait Platform: DisplayBackend + WindowBackend + GlBackend {}

impl<T: DisplayBackend + WindowBackend + GlBackend> Platform for T {}
