//! In-memory platform
//!
//! Simulates adapters, windows, a message queue and WGL contexts without
//! touching the OS. Used by the test suite and by the demo binary on hosts
//! without Win32. Any OS call can be made to fail through [`FailPoint`], and
//! the simulation records the side effects tests need to observe (display
//! restores, destroyed windows, hidden cursors, the current context).
//!
//! The simulation keeps the WGL rules that shape the bootstrap: a pixel
//! format can be set on a device context only once, contexts need a pixel
//! format, and extension functions only resolve while a context is current.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::core::Rect;
use crate::domain::display_mode::DisplayMode;
use crate::domain::pixel_format::{
    Acceleration, PixelFormatAttributeList, PixelFormatAttributes,
};
use crate::platform::backend::{
    AdapterInfo, ContextAttributes, DeviceContext, DisplayBackend, ExtensionFunctions, GlBackend,
    NativeContext, NativeIcon, NativeWindow, OsError, ProcAddress, WindowBackend, WindowMessage,
    WindowStyle,
};

/// OS error value reported by injected failures (ERROR_GEN_FAILURE)
pub const INJECTED_ERROR_CODE: u32 = 31;

/// Extension string reported by default
pub const DEFAULT_EXTENSIONS: &str = "WGL_ARB_extensions_string WGL_ARB_pixel_format \
     WGL_ARB_create_context WGL_ARB_create_context_profile WGL_EXT_swap_control";

const KNOWN_FUNCTIONS: [&str; 4] = [
    "wglGetExtensionsStringARB",
    "wglGetPixelFormatAttribivARB",
    "wglCreateContextAttribsARB",
    "wglSwapIntervalEXT",
];

/// Frame added around the client area of captioned windows (left, top, right, bottom)
const FRAME_INSETS: (i32, i32, i32, i32) = (8, 31, 8, 8);

/// OS calls that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    RegisterClass,
    UnregisterClass,
    AdjustWindowRect,
    CreateWindow,
    DestroyWindow,
    WindowRect,
    SetWindowRect,
    SetWindowStyle,
    MonitorRect,
    SetWindowTitle,
    CreateIcon,
    ChangeDisplayMode,
    DeviceContext,
    ChoosePixelFormat,
    SetPixelFormat,
    PixelFormatCount,
    PixelFormatAttributes,
    CreateBasicContext,
    CreateContext,
    DeleteContext,
    MakeCurrent,
    SwapBuffers,
}

/// Simulated display adapter
#[derive(Debug, Clone)]
pub struct HeadlessAdapter {
    pub info: AdapterInfo,
    /// Modes in OS enumeration order, duplicates allowed
    pub modes: Vec<DisplayMode>,
    /// Mode active at startup
    pub current: DisplayMode,
}

impl HeadlessAdapter {
    pub fn new(name: &str, primary: bool, modes: Vec<DisplayMode>, current: DisplayMode) -> Self {
        Self {
            info: AdapterInfo {
                name: name.to_string(),
                attached_to_desktop: true,
                primary,
            },
            modes,
            current,
        }
    }

    /// Adapter present in the system but not part of the desktop
    pub fn detached(mut self) -> Self {
        self.info.attached_to_desktop = false;
        self
    }
}

#[derive(Debug, Clone)]
struct WindowRecord {
    class_name: String,
    title: String,
    style: WindowStyle,
    rect: Rect,
    visible: bool,
    icon: Option<NativeIcon>,
}

#[derive(Debug, Clone, Copy)]
struct ContextRecord {
    extended: bool,
}

#[derive(Debug)]
struct State {
    adapters: Vec<HeadlessAdapter>,
    active_modes: HashMap<String, DisplayMode>,
    display_changes: Vec<(String, Option<DisplayMode>)>,
    monitor: Rect,
    pixel_formats: Vec<PixelFormatAttributes>,
    extensions: String,
    missing_functions: HashSet<String>,
    failures: HashSet<FailPoint>,
    classes: HashSet<String>,
    windows: HashMap<NativeWindow, WindowRecord>,
    destroyed_windows: Vec<NativeWindow>,
    icons: HashSet<NativeIcon>,
    next_handle: isize,
    queue: VecDeque<(NativeWindow, WindowMessage)>,
    default_handled: Vec<(NativeWindow, WindowMessage)>,
    cursor_hides: u32,
    pixel_format_of: HashMap<DeviceContext, i32>,
    contexts: HashMap<NativeContext, ContextRecord>,
    current: Option<NativeContext>,
    swaps: u32,
    swap_interval: Option<i32>,
}

impl State {
    fn check(&self, point: FailPoint, function: &'static str) -> Result<(), OsError> {
        if self.failures.contains(&point) {
            Err(OsError::new(function, INJECTED_ERROR_CODE))
        } else {
            Ok(())
        }
    }

    fn next_handle(&mut self) -> isize {
        self.next_handle += 1;
        self.next_handle
    }

    fn window(&self, window: NativeWindow, function: &'static str) -> Result<&WindowRecord, OsError> {
        self.windows
            .get(&window)
            .ok_or(OsError::new(function, ERROR_INVALID_WINDOW_HANDLE))
    }

    fn window_mut(
        &mut self,
        window: NativeWindow,
        function: &'static str,
    ) -> Result<&mut WindowRecord, OsError> {
        self.windows
            .get_mut(&window)
            .ok_or(OsError::new(function, ERROR_INVALID_WINDOW_HANDLE))
    }
}

const ERROR_INVALID_WINDOW_HANDLE: u32 = 1400;
const ERROR_INVALID_PIXEL_FORMAT: u32 = 2000;
const ERROR_CLASS_ALREADY_EXISTS: u32 = 1410;
const ERROR_CLASS_DOES_NOT_EXIST: u32 = 1411;
const ERROR_CLASS_HAS_WINDOWS: u32 = 1412;
const ERROR_INVALID_HANDLE: u32 = 6;

/// Platform simulation; see the module docs
#[derive(Debug)]
pub struct HeadlessPlatform {
    state: RefCell<State>,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlatform {
    /// One primary 1920x1080 adapter, three pixel formats of which only the
    /// last is acceptable, and the full extension set
    pub fn new() -> Self {
        let current = DisplayMode::new(1920, 1080, 32, 60);
        let adapter = HeadlessAdapter::new(
            r"\\.\DISPLAY1",
            true,
            vec![
                DisplayMode::new(1920, 1080, 32, 60),
                DisplayMode::new(800, 600, 32, 60),
                DisplayMode::new(1280, 720, 32, 60),
                DisplayMode::new(800, 600, 32, 60),
                DisplayMode::new(1920, 1080, 32, 144),
            ],
            current,
        );

        let software = PixelFormatAttributes {
            acceleration: Acceleration::Generic,
            ..PixelFormatAttributes::accelerated(32, 24)
        };
        let single_buffered = PixelFormatAttributes {
            double_buffered: false,
            ..PixelFormatAttributes::accelerated(32, 24)
        };

        Self {
            state: RefCell::new(State {
                adapters: Vec::new(),
                active_modes: HashMap::new(),
                display_changes: Vec::new(),
                monitor: Rect::new(0, 0, 1920, 1080),
                pixel_formats: vec![
                    software,
                    single_buffered,
                    PixelFormatAttributes::accelerated(32, 24),
                ],
                extensions: DEFAULT_EXTENSIONS.to_string(),
                missing_functions: HashSet::new(),
                failures: HashSet::new(),
                classes: HashSet::new(),
                windows: HashMap::new(),
                destroyed_windows: Vec::new(),
                icons: HashSet::new(),
                next_handle: 0x100,
                queue: VecDeque::new(),
                default_handled: Vec::new(),
                cursor_hides: 0,
                pixel_format_of: HashMap::new(),
                contexts: HashMap::new(),
                current: None,
                swaps: 0,
                swap_interval: None,
            }),
        }
        .with_adapters(vec![adapter])
    }

    pub fn with_adapters(self, adapters: Vec<HeadlessAdapter>) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.active_modes = adapters
                .iter()
                .map(|adapter| (adapter.info.name.clone(), adapter.current))
                .collect();
            state.adapters = adapters;
        }
        self
    }

    pub fn with_monitor(self, monitor: Rect) -> Self {
        self.state.borrow_mut().monitor = monitor;
        self
    }

    pub fn with_pixel_formats(self, formats: Vec<PixelFormatAttributes>) -> Self {
        self.state.borrow_mut().pixel_formats = formats;
        self
    }

    pub fn with_extensions(self, extensions: &str) -> Self {
        self.state.borrow_mut().extensions = extensions.to_string();
        self
    }

    /// Makes `name` unresolvable through the proc address lookup
    pub fn without_function(self, name: &str) -> Self {
        self.state.borrow_mut().missing_functions.insert(name.to_string());
        self
    }

    /// Makes every following call of `point` fail
    pub fn fail(&self, point: FailPoint) {
        self.state.borrow_mut().failures.insert(point);
    }

    pub fn recover(&self, point: FailPoint) {
        self.state.borrow_mut().failures.remove(&point);
    }

    /// Queues a message for the next pump
    pub fn post_message(&self, window: NativeWindow, message: WindowMessage) {
        self.state.borrow_mut().queue.push_back((window, message));
    }

    /// Every display change request, `None` entries being restores
    pub fn display_changes(&self) -> Vec<(String, Option<DisplayMode>)> {
        self.state.borrow().display_changes.clone()
    }

    pub fn restore_count(&self) -> usize {
        self.state
            .borrow()
            .display_changes
            .iter()
            .filter(|(_, mode)| mode.is_none())
            .count()
    }

    pub fn active_mode(&self, adapter: &str) -> Option<DisplayMode> {
        self.state.borrow().active_modes.get(adapter).copied()
    }

    pub fn is_class_registered(&self, class_name: &str) -> bool {
        self.state.borrow().classes.contains(class_name)
    }

    pub fn window_count(&self) -> usize {
        self.state.borrow().windows.len()
    }

    pub fn is_window(&self, window: NativeWindow) -> bool {
        self.state.borrow().windows.contains_key(&window)
    }

    pub fn destroyed_windows(&self) -> Vec<NativeWindow> {
        self.state.borrow().destroyed_windows.clone()
    }

    pub fn window_title(&self, window: NativeWindow) -> Option<String> {
        self.state.borrow().windows.get(&window).map(|record| record.title.clone())
    }

    pub fn window_class(&self, window: NativeWindow) -> Option<String> {
        self.state
            .borrow()
            .windows
            .get(&window)
            .map(|record| record.class_name.clone())
    }

    pub fn is_visible(&self, window: NativeWindow) -> bool {
        self.state
            .borrow()
            .windows
            .get(&window)
            .is_some_and(|record| record.visible)
    }

    pub fn window_icon(&self, window: NativeWindow) -> Option<NativeIcon> {
        self.state.borrow().windows.get(&window).and_then(|record| record.icon)
    }

    pub fn live_icon_count(&self) -> usize {
        self.state.borrow().icons.len()
    }

    pub fn cursor_hides(&self) -> u32 {
        self.state.borrow().cursor_hides
    }

    /// Messages the handler declined, in delivery order
    pub fn default_handled(&self) -> Vec<(NativeWindow, WindowMessage)> {
        self.state.borrow().default_handled.clone()
    }

    pub fn context_count(&self) -> usize {
        self.state.borrow().contexts.len()
    }

    pub fn is_extended_context(&self, context: NativeContext) -> bool {
        self.state
            .borrow()
            .contexts
            .get(&context)
            .is_some_and(|record| record.extended)
    }

    pub fn pixel_format_of(&self, device_context: DeviceContext) -> Option<i32> {
        self.state.borrow().pixel_format_of.get(&device_context).copied()
    }

    pub fn swap_count(&self) -> u32 {
        self.state.borrow().swaps
    }

    pub fn swap_interval(&self) -> Option<i32> {
        self.state.borrow().swap_interval
    }

    fn proc_address_of(name: &str) -> Option<ProcAddress> {
        KNOWN_FUNCTIONS
            .iter()
            .position(|known| *known == name)
            .map(|index| ProcAddress(0x7000 + index * 0x10))
    }
}

impl DisplayBackend for HeadlessPlatform {
    fn adapter(&self, index: u32) -> Option<AdapterInfo> {
        self.state
            .borrow()
            .adapters
            .get(index as usize)
            .map(|adapter| adapter.info.clone())
    }

    fn display_mode(&self, adapter: &str, index: u32) -> DisplayMode {
        self.state
            .borrow()
            .adapters
            .iter()
            .find(|candidate| candidate.info.name == adapter)
            .and_then(|candidate| candidate.modes.get(index as usize).copied())
            .unwrap_or_default()
    }

    fn current_display_mode(&self, adapter: &str) -> DisplayMode {
        self.active_mode(adapter).unwrap_or_default()
    }

    fn change_display_mode(
        &self,
        adapter: &str,
        mode: Option<&DisplayMode>,
    ) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::ChangeDisplayMode, "ChangeDisplaySettingsExW")?;
        state
            .display_changes
            .push((adapter.to_string(), mode.copied()));

        let restored = state
            .adapters
            .iter()
            .find(|candidate| candidate.info.name == adapter)
            .map(|candidate| candidate.current)
            .ok_or(OsError::new("ChangeDisplaySettingsExW", ERROR_INVALID_HANDLE))?;

        state
            .active_modes
            .insert(adapter.to_string(), mode.copied().unwrap_or(restored));
        Ok(())
    }
}

impl WindowBackend for HeadlessPlatform {
    fn register_window_class(&self, class_name: &str) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::RegisterClass, "RegisterClassExW")?;

        if !state.classes.insert(class_name.to_string()) {
            return Err(OsError::new("RegisterClassExW", ERROR_CLASS_ALREADY_EXISTS));
        }

        Ok(())
    }

    fn unregister_window_class(&self, class_name: &str) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::UnregisterClass, "UnregisterClassW")?;

        if !state.classes.contains(class_name) {
            return Err(OsError::new("UnregisterClassW", ERROR_CLASS_DOES_NOT_EXIST));
        }

        if state
            .windows
            .values()
            .any(|record| record.class_name == class_name)
        {
            return Err(OsError::new("UnregisterClassW", ERROR_CLASS_HAS_WINDOWS));
        }

        state.classes.remove(class_name);

        Ok(())
    }

    fn adjust_window_rect(&self, client: Rect, style: WindowStyle) -> Result<Rect, OsError> {
        self.state
            .borrow()
            .check(FailPoint::AdjustWindowRect, "AdjustWindowRectEx")?;

        if !style.contains(WindowStyle::CAPTION) {
            return Ok(client);
        }

        let (left, top, right, bottom) = FRAME_INSETS;
        Ok(Rect::from_edges(
            client.x - left,
            client.y - top,
            client.right() + right,
            client.bottom() + bottom,
        ))
    }

    fn create_window(
        &self,
        class_name: &str,
        title: &str,
        style: WindowStyle,
        rect: Rect,
    ) -> Result<NativeWindow, OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::CreateWindow, "CreateWindowExW")?;

        if !state.classes.contains(class_name) {
            return Err(OsError::new("CreateWindowExW", ERROR_CLASS_DOES_NOT_EXIST));
        }

        let window = NativeWindow(state.next_handle());
        state.windows.insert(
            window,
            WindowRecord {
                class_name: class_name.to_string(),
                title: title.to_string(),
                style,
                rect,
                visible: style.contains(WindowStyle::VISIBLE),
                icon: None,
            },
        );

        Ok(window)
    }

    fn destroy_window(&self, window: NativeWindow) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::DestroyWindow, "DestroyWindow")?;

        if state.windows.remove(&window).is_none() {
            return Err(OsError::new("DestroyWindow", ERROR_INVALID_WINDOW_HANDLE));
        }

        state.pixel_format_of.remove(&DeviceContext(window.0));
        state.queue.retain(|(target, _)| *target != window);
        state.destroyed_windows.push(window);
        Ok(())
    }

    fn window_rect(&self, window: NativeWindow) -> Result<Rect, OsError> {
        let state = self.state.borrow();
        state.check(FailPoint::WindowRect, "GetWindowRect")?;
        Ok(state.window(window, "GetWindowRect")?.rect)
    }

    fn set_window_rect(&self, window: NativeWindow, rect: Rect) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::SetWindowRect, "SetWindowPos")?;
        state.window_mut(window, "SetWindowPos")?.rect = rect;
        Ok(())
    }

    fn window_style(&self, window: NativeWindow) -> Result<WindowStyle, OsError> {
        Ok(self.state.borrow().window(window, "GetWindowLongPtrW")?.style)
    }

    fn set_window_style(&self, window: NativeWindow, style: WindowStyle) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::SetWindowStyle, "SetWindowLongPtrW")?;
        state.window_mut(window, "SetWindowLongPtrW")?.style = style;
        Ok(())
    }

    fn monitor_rect(&self, window: NativeWindow) -> Result<Rect, OsError> {
        let state = self.state.borrow();
        state.check(FailPoint::MonitorRect, "GetMonitorInfoW")?;
        state.window(window, "MonitorFromWindow")?;
        Ok(state.monitor)
    }

    fn set_window_title(&self, window: NativeWindow, title: &str) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::SetWindowTitle, "SetWindowTextW")?;
        state.window_mut(window, "SetWindowTextW")?.title = title.to_string();
        Ok(())
    }

    fn show_window(&self, window: NativeWindow, visible: bool) {
        if let Some(record) = self.state.borrow_mut().windows.get_mut(&window) {
            record.visible = visible;
        }
    }

    fn icon_size(&self) -> (u32, u32) {
        (32, 32)
    }

    fn create_icon(&self, width: u32, height: u32, bgra: &[u8]) -> Result<NativeIcon, OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::CreateIcon, "CreateIcon")?;

        if bgra.len() != width as usize * height as usize * 4 {
            return Err(OsError::new("CreateIcon", ERROR_INVALID_HANDLE));
        }

        let icon = NativeIcon(state.next_handle());
        state.icons.insert(icon);
        Ok(icon)
    }

    fn destroy_icon(&self, icon: NativeIcon) -> Result<(), OsError> {
        if self.state.borrow_mut().icons.remove(&icon) {
            Ok(())
        } else {
            Err(OsError::new("DestroyIcon", ERROR_INVALID_HANDLE))
        }
    }

    fn set_window_icon(&self, window: NativeWindow, icon: Option<NativeIcon>) {
        if let Some(record) = self.state.borrow_mut().windows.get_mut(&window) {
            record.icon = icon;
        }
    }

    fn hide_cursor(&self) {
        self.state.borrow_mut().cursor_hides += 1;
    }

    fn pump_messages(&self, handler: &mut dyn FnMut(NativeWindow, WindowMessage) -> bool) {
        loop {
            // The borrow must end before the handler runs, it may call back in
            let next = self.state.borrow_mut().queue.pop_front();
            let Some((window, message)) = next else {
                break;
            };

            if !handler(window, message) {
                self.state
                    .borrow_mut()
                    .default_handled
                    .push((window, message));
            }
        }
    }
}

impl GlBackend for HeadlessPlatform {
    fn device_context(&self, window: NativeWindow) -> Result<DeviceContext, OsError> {
        let state = self.state.borrow();
        state.check(FailPoint::DeviceContext, "GetDC")?;
        state.window(window, "GetDC")?;
        Ok(DeviceContext(window.0))
    }

    fn release_device_context(&self, _window: NativeWindow, _device_context: DeviceContext) {}

    fn choose_default_pixel_format(&self, _device_context: DeviceContext) -> Result<i32, OsError> {
        let state = self.state.borrow();
        state.check(FailPoint::ChoosePixelFormat, "ChoosePixelFormat")?;

        state
            .pixel_formats
            .iter()
            .position(|format| format.double_buffered && format.supports_opengl)
            .map(|index| index as i32 + 1)
            .ok_or(OsError::new("ChoosePixelFormat", ERROR_INVALID_PIXEL_FORMAT))
    }

    fn set_pixel_format(&self, device_context: DeviceContext, format: i32) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::SetPixelFormat, "SetPixelFormat")?;

        let in_range = format >= 1 && format as usize <= state.pixel_formats.len();
        if !in_range || state.pixel_format_of.contains_key(&device_context) {
            return Err(OsError::new("SetPixelFormat", ERROR_INVALID_PIXEL_FORMAT));
        }

        state.pixel_format_of.insert(device_context, format);
        Ok(())
    }

    fn pixel_format_count(
        &self,
        _functions: &ExtensionFunctions,
        _device_context: DeviceContext,
    ) -> Result<u32, OsError> {
        let state = self.state.borrow();
        state.check(FailPoint::PixelFormatCount, "wglGetPixelFormatAttribivARB")?;
        Ok(state.pixel_formats.len() as u32)
    }

    fn pixel_format_attributes(
        &self,
        _functions: &ExtensionFunctions,
        _device_context: DeviceContext,
        format: i32,
        attribute_ids: &PixelFormatAttributeList,
    ) -> Result<PixelFormatAttributeList, OsError> {
        let state = self.state.borrow();
        state.check(FailPoint::PixelFormatAttributes, "wglGetPixelFormatAttribivARB")?;

        let attributes = usize::try_from(format - 1)
            .ok()
            .and_then(|index| state.pixel_formats.get(index))
            .ok_or(OsError::new("wglGetPixelFormatAttribivARB", ERROR_INVALID_PIXEL_FORMAT))?;

        Ok(attribute_ids.map(|id| attributes.value_of(id).unwrap_or(0)))
    }

    fn create_basic_context(
        &self,
        device_context: DeviceContext,
    ) -> Result<NativeContext, OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::CreateBasicContext, "wglCreateContext")?;

        if !state.pixel_format_of.contains_key(&device_context) {
            return Err(OsError::new("wglCreateContext", ERROR_INVALID_PIXEL_FORMAT));
        }

        let context = NativeContext(state.next_handle());
        state.contexts.insert(context, ContextRecord { extended: false });
        Ok(context)
    }

    fn create_context(
        &self,
        _functions: &ExtensionFunctions,
        device_context: DeviceContext,
        _attributes: &ContextAttributes,
    ) -> Result<NativeContext, OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::CreateContext, "wglCreateContextAttribsARB")?;

        if !state.pixel_format_of.contains_key(&device_context) {
            return Err(OsError::new(
                "wglCreateContextAttribsARB",
                ERROR_INVALID_PIXEL_FORMAT,
            ));
        }

        let context = NativeContext(state.next_handle());
        state.contexts.insert(context, ContextRecord { extended: true });
        Ok(context)
    }

    fn delete_context(&self, context: NativeContext) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::DeleteContext, "wglDeleteContext")?;

        if state.contexts.remove(&context).is_none() {
            return Err(OsError::new("wglDeleteContext", ERROR_INVALID_HANDLE));
        }

        if state.current == Some(context) {
            state.current = None;
        }

        Ok(())
    }

    fn make_current(
        &self,
        binding: Option<(DeviceContext, NativeContext)>,
    ) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::MakeCurrent, "wglMakeCurrent")?;

        match binding {
            Some((_, context)) if !state.contexts.contains_key(&context) => {
                Err(OsError::new("wglMakeCurrent", ERROR_INVALID_HANDLE))
            }
            Some((_, context)) => {
                state.current = Some(context);
                Ok(())
            }
            None => {
                state.current = None;
                Ok(())
            }
        }
    }

    fn current_context(&self) -> Option<NativeContext> {
        self.state.borrow().current
    }

    fn proc_address(&self, name: &str) -> Option<ProcAddress> {
        let state = self.state.borrow();

        if state.current.is_none() || state.missing_functions.contains(name) {
            return None;
        }

        Self::proc_address_of(name)
    }

    fn extensions_string(
        &self,
        _get_extensions_string: ProcAddress,
        _device_context: DeviceContext,
    ) -> Result<String, OsError> {
        let state = self.state.borrow();

        if state.current.is_none() {
            return Err(OsError::new("wglGetExtensionsStringARB", ERROR_INVALID_HANDLE));
        }

        Ok(state.extensions.clone())
    }

    fn swap_buffers(&self, device_context: DeviceContext) -> Result<(), OsError> {
        let mut state = self.state.borrow_mut();
        state.check(FailPoint::SwapBuffers, "SwapBuffers")?;

        if !state.pixel_format_of.contains_key(&device_context) {
            return Err(OsError::new("SwapBuffers", ERROR_INVALID_PIXEL_FORMAT));
        }

        state.swaps += 1;
        Ok(())
    }

    fn set_swap_interval(&self, _swap_interval: ProcAddress, interval: i32) -> Result<(), OsError> {
        self.state.borrow_mut().swap_interval = Some(interval);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapters_enumerate_until_none() {
        let platform = HeadlessPlatform::new();
        assert!(platform.adapter(0).is_some_and(|info| info.primary));
        assert_eq!(platform.adapter(1), None);
    }

    #[test]
    fn mode_list_ends_with_sentinel() {
        let platform = HeadlessPlatform::new();
        assert_eq!(platform.display_mode(r"\\.\DISPLAY1", 0).width(), 1920);
        assert!(platform.display_mode(r"\\.\DISPLAY1", 5).is_sentinel());
        assert!(platform.display_mode("missing", 0).is_sentinel());
    }

    #[test]
    fn pixel_format_can_only_be_set_once() {
        let platform = HeadlessPlatform::new();
        platform.register_window_class("test").unwrap();
        let window = platform
            .create_window("test", "t", WindowStyle::DEFAULT, Rect::new(0, 0, 10, 10))
            .unwrap();
        let dc = platform.device_context(window).unwrap();

        assert!(platform.set_pixel_format(dc, 3).is_ok());
        assert!(platform.set_pixel_format(dc, 3).is_err());
        assert_eq!(platform.pixel_format_of(dc), Some(3));
    }

    #[test]
    fn functions_resolve_only_while_current() {
        let platform = HeadlessPlatform::new();
        assert_eq!(platform.proc_address("wglCreateContextAttribsARB"), None);

        platform.register_window_class("test").unwrap();
        let window = platform
            .create_window("test", "t", WindowStyle::DEFAULT, Rect::new(0, 0, 10, 10))
            .unwrap();
        let dc = platform.device_context(window).unwrap();
        platform.set_pixel_format(dc, 3).unwrap();
        let context = platform.create_basic_context(dc).unwrap();
        platform.make_current(Some((dc, context))).unwrap();

        assert!(platform.proc_address("wglCreateContextAttribsARB").is_some());
        assert_eq!(platform.proc_address("glNotAFunction"), None);
    }

    #[test]
    fn injected_failures_report_the_function() {
        let platform = HeadlessPlatform::new();
        platform.fail(FailPoint::RegisterClass);

        let error = platform.register_window_class("test").unwrap_err();
        assert_eq!(error, OsError::new("RegisterClassExW", INJECTED_ERROR_CODE));

        platform.recover(FailPoint::RegisterClass);
        assert!(platform.register_window_class("test").is_ok());
    }

    #[test]
    fn class_with_live_windows_cannot_be_unregistered() {
        let platform = HeadlessPlatform::new();
        platform.register_window_class("test").unwrap();
        let window = platform
            .create_window("test", "t", WindowStyle::DEFAULT, Rect::new(0, 0, 10, 10))
            .unwrap();

        let error = platform.unregister_window_class("test").unwrap_err();
        assert_eq!(error, OsError::new("UnregisterClassW", ERROR_CLASS_HAS_WINDOWS));
        assert!(platform.is_class_registered("test"));

        platform.destroy_window(window).unwrap();
        assert!(platform.unregister_window_class("test").is_ok());
    }

    #[test]
    fn declined_messages_get_default_handling() {
        let platform = HeadlessPlatform::new();
        let window = NativeWindow(7);
        platform.post_message(window, WindowMessage::Close);
        platform.post_message(window, WindowMessage::SetCursor { in_client_area: false });

        let mut seen = Vec::new();
        platform.pump_messages(&mut |target, message| {
            seen.push((target, message));
            message == WindowMessage::Close
        });

        assert_eq!(seen.len(), 2);
        assert_eq!(
            platform.default_handled(),
            vec![(window, WindowMessage::SetCursor { in_client_area: false })]
        );
    }
}
