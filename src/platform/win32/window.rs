//! Window class, native windows and the message pump
//!
//! One window procedure serves every window of the class. It translates the
//! few messages the engine cares about and hands them to the handler the
//! current `pump_messages` call installed for this thread; the handler looks
//! the window up in the manager's registry. Messages arriving outside a pump
//! get default processing, except `WM_CLOSE`, which never destroys a window
//! on its own and is only logged.

use std::cell::Cell;

use windows::Win32::Foundation::{FALSE, HWND, LPARAM, LRESULT, WIN32_ERROR, WPARAM, SetLastError};
use windows::Win32::Graphics::Gdi::{
    GetMonitorInfoW, MONITOR_DEFAULTTONEAREST, MONITORINFO, MonitorFromWindow,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AdjustWindowRectEx, CS_OWNDC, CreateIcon, CreateWindowExW, DefWindowProcW, DestroyIcon,
    DestroyWindow, DispatchMessageW, GWL_STYLE, GetSystemMetrics, GetWindowLongPtrW,
    GetWindowRect, HICON, HWND_TOP, ICON_BIG, ICON_SMALL, IDC_ARROW, LoadCursorW, MSG,
    PM_REMOVE, PeekMessageW, RegisterClassExW, SM_CXICON, SM_CYICON, SW_HIDE, SW_SHOW,
    SWP_FRAMECHANGED, SWP_NOACTIVATE, SWP_NOZORDER, SendMessageW, SetCursor,
    SetWindowLongPtrW, SetWindowPos, SetWindowTextW, ShowWindow, TranslateMessage,
    UnregisterClassW, WINDOW_EX_STYLE, WINDOW_STYLE, WM_CLOSE, WM_SETCURSOR, WM_SETICON,
    WNDCLASSEXW,
};
use windows::core::{HSTRING, PCWSTR};

use super::{Win32Platform, from_win32_rect, last_error, os_error, to_win32_rect};
use crate::domain::core::Rect;
use crate::platform::backend::{
    NativeIcon, NativeWindow, OsError, WindowBackend, WindowMessage, WindowStyle,
};

/// Hit-test code of the client area (`HTCLIENT`)
const HIT_TEST_CLIENT: isize = 1;

type MessageHandler = dyn FnMut(NativeWindow, WindowMessage) -> bool;

thread_local! {
    static MESSAGE_HANDLER: Cell<Option<*mut MessageHandler>> = const { Cell::new(None) };
}

/// Runs the installed handler; false when none is installed
fn dispatch(window: NativeWindow, message: WindowMessage) -> bool {
    // Taken out of the slot while it runs so a nested message cannot alias it
    let Some(handler) = MESSAGE_HANDLER.with(Cell::take) else {
        return false;
    };

    let handled = unsafe { (*handler)(window, message) };
    MESSAGE_HANDLER.with(|slot| slot.set(Some(handler)));
    handled
}

unsafe extern "system" fn window_procedure(
    hwnd: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let window = NativeWindow(hwnd.0);

    match message {
        WM_CLOSE => {
            if !dispatch(window, WindowMessage::Close) {
                log::debug!(
                    "[platform::win32] Close request for {window:?} arrived outside a message pump"
                );
            }
            LRESULT(0)
        }
        WM_SETCURSOR => {
            let in_client_area = (lparam.0 & 0xFFFF) == HIT_TEST_CLIENT;

            if dispatch(window, WindowMessage::SetCursor { in_client_area }) {
                LRESULT(1)
            } else {
                unsafe { DefWindowProcW(hwnd, message, wparam, lparam) }
            }
        }
        _ => unsafe { DefWindowProcW(hwnd, message, wparam, lparam) },
    }
}

fn hwnd(window: NativeWindow) -> HWND {
    HWND(window.0)
}

impl WindowBackend for Win32Platform {
    fn register_window_class(&self, class_name: &str) -> Result<(), OsError> {
        let class_name = HSTRING::from(class_name);
        let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }.unwrap_or_default();

        let class = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_OWNDC,
            lpfnWndProc: Some(window_procedure),
            hInstance: self.instance,
            hCursor: cursor,
            lpszClassName: PCWSTR(class_name.as_ptr()),
            ..Default::default()
        };

        if unsafe { RegisterClassExW(&class) } == 0 {
            return Err(last_error("RegisterClassExW"));
        }

        Ok(())
    }

    fn unregister_window_class(&self, class_name: &str) -> Result<(), OsError> {
        let class_name = HSTRING::from(class_name);
        unsafe { UnregisterClassW(&class_name, self.instance) }
            .map_err(|error| os_error("UnregisterClassW", &error))
    }

    fn adjust_window_rect(&self, client: Rect, style: WindowStyle) -> Result<Rect, OsError> {
        let mut rect = to_win32_rect(&client);

        unsafe {
            AdjustWindowRectEx(&mut rect, WINDOW_STYLE(style.bits()), FALSE, WINDOW_EX_STYLE(0))
        }
        .map_err(|error| os_error("AdjustWindowRectEx", &error))?;

        Ok(from_win32_rect(&rect))
    }

    fn create_window(
        &self,
        class_name: &str,
        title: &str,
        style: WindowStyle,
        rect: Rect,
    ) -> Result<NativeWindow, OsError> {
        let class_name = HSTRING::from(class_name);
        let title = HSTRING::from(title);

        let handle = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                &class_name,
                &title,
                WINDOW_STYLE(style.bits()),
                rect.x,
                rect.y,
                rect.w,
                rect.h,
                None,
                None,
                self.instance,
                None,
            )
        };

        if handle.0 == 0 {
            return Err(last_error("CreateWindowExW"));
        }

        Ok(NativeWindow(handle.0))
    }

    fn destroy_window(&self, window: NativeWindow) -> Result<(), OsError> {
        unsafe { DestroyWindow(hwnd(window)) }.map_err(|error| os_error("DestroyWindow", &error))
    }

    fn window_rect(&self, window: NativeWindow) -> Result<Rect, OsError> {
        let mut rect = Default::default();
        unsafe { GetWindowRect(hwnd(window), &mut rect) }
            .map_err(|error| os_error("GetWindowRect", &error))?;

        Ok(from_win32_rect(&rect))
    }

    fn set_window_rect(&self, window: NativeWindow, rect: Rect) -> Result<(), OsError> {
        unsafe {
            SetWindowPos(
                hwnd(window),
                HWND_TOP,
                rect.x,
                rect.y,
                rect.w,
                rect.h,
                SWP_FRAMECHANGED | SWP_NOACTIVATE | SWP_NOZORDER,
            )
        }
        .map_err(|error| os_error("SetWindowPos", &error))
    }

    fn window_style(&self, window: NativeWindow) -> Result<WindowStyle, OsError> {
        // Zero is a valid style, only the last error tells failures apart
        let style = unsafe {
            SetLastError(WIN32_ERROR(0));
            GetWindowLongPtrW(hwnd(window), GWL_STYLE)
        };

        if style == 0 {
            let error = last_error("GetWindowLongPtrW");
            if error.code != 0 {
                return Err(error);
            }
        }

        Ok(WindowStyle::from_bits_retain(style as u32))
    }

    fn set_window_style(&self, window: NativeWindow, style: WindowStyle) -> Result<(), OsError> {
        let previous = unsafe {
            SetLastError(WIN32_ERROR(0));
            SetWindowLongPtrW(hwnd(window), GWL_STYLE, style.bits() as isize)
        };

        if previous == 0 {
            let error = last_error("SetWindowLongPtrW");
            if error.code != 0 {
                return Err(error);
            }
        }

        Ok(())
    }

    fn monitor_rect(&self, window: NativeWindow) -> Result<Rect, OsError> {
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };

        let found = unsafe {
            let monitor = MonitorFromWindow(hwnd(window), MONITOR_DEFAULTTONEAREST);
            GetMonitorInfoW(monitor, &mut info)
        };

        if !found.as_bool() {
            return Err(last_error("GetMonitorInfoW"));
        }

        Ok(from_win32_rect(&info.rcMonitor))
    }

    fn set_window_title(&self, window: NativeWindow, title: &str) -> Result<(), OsError> {
        let title = HSTRING::from(title);
        unsafe { SetWindowTextW(hwnd(window), &title) }
            .map_err(|error| os_error("SetWindowTextW", &error))
    }

    fn show_window(&self, window: NativeWindow, visible: bool) {
        let command = if visible { SW_SHOW } else { SW_HIDE };
        // The return value is the previous visibility, not an error
        let _ = unsafe { ShowWindow(hwnd(window), command) };
    }

    fn icon_size(&self) -> (u32, u32) {
        let (width, height) = unsafe { (GetSystemMetrics(SM_CXICON), GetSystemMetrics(SM_CYICON)) };
        (width.max(1) as u32, height.max(1) as u32)
    }

    fn create_icon(&self, width: u32, height: u32, bgra: &[u8]) -> Result<NativeIcon, OsError> {
        // Word-aligned 1bpp AND mask, all zero: the alpha channel decides
        let mask_stride = (width as usize).div_ceil(16) * 2;
        let and_mask = vec![0u8; mask_stride * height as usize];

        let icon = unsafe {
            CreateIcon(
                self.instance,
                width as i32,
                height as i32,
                1,
                32,
                and_mask.as_ptr(),
                bgra.as_ptr(),
            )
        }
        .map_err(|error| os_error("CreateIcon", &error))?;

        Ok(NativeIcon(icon.0))
    }

    fn destroy_icon(&self, icon: NativeIcon) -> Result<(), OsError> {
        unsafe { DestroyIcon(HICON(icon.0)) }.map_err(|error| os_error("DestroyIcon", &error))
    }

    fn set_window_icon(&self, window: NativeWindow, icon: Option<NativeIcon>) {
        let handle = LPARAM(icon.map_or(0, |icon| icon.0));

        unsafe {
            SendMessageW(hwnd(window), WM_SETICON, WPARAM(ICON_BIG as usize), handle);
            SendMessageW(hwnd(window), WM_SETICON, WPARAM(ICON_SMALL as usize), handle);
        }
    }

    fn hide_cursor(&self) {
        unsafe {
            SetCursor(None);
        }
    }

    fn pump_messages(&self, handler: &mut dyn FnMut(NativeWindow, WindowMessage) -> bool) {
        let handler: *mut (dyn FnMut(NativeWindow, WindowMessage) -> bool + '_) = handler;
        // SAFETY: the pointer leaves the slot before this frame returns, so
        // the procedure never sees it outlive the borrow
        let handler: *mut MessageHandler = unsafe { std::mem::transmute(handler) };
        let previous = MESSAGE_HANDLER.with(|slot| slot.replace(Some(handler)));

        let mut message = MSG::default();
        unsafe {
            while PeekMessageW(&mut message, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&message);
                DispatchMessageW(&message);
            }
        }

        MESSAGE_HANDLER.with(|slot| slot.set(previous));
    }
}
