//! A native window and the state derived from it
//!
//! The window caches its rectangle. While fullscreen the rectangle is the
//! monitor's and a separate restore rectangle keeps the windowed geometry,
//! so leaving fullscreen puts the window back exactly where it was.

use std::rc::Rc;

use thiserror::Error;

use crate::domain::core::Rect;
use crate::domain::image::Image;
use crate::error::{ErrorCode, fatal};
use crate::platform::{
    DeviceContext, NativeIcon, NativeWindow, OsError, Platform, WindowMessage, WindowStyle,
};
use crate::ui::icon::{IconError, rasterise_icon};

const COMPONENT: &str = "[window]";

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("Failed to set the window rectangle")]
    SetRectangleFailed(#[source] OsError),

    #[error("Failed to set the window title")]
    SetTitleFailed(#[source] OsError),

    #[error("Failed to get the window rectangle")]
    GetRectangleFailed(#[source] OsError),

    #[error("Failed to set the window style")]
    SetStyleFailed(#[source] OsError),

    #[error("Failed to get the monitor information of the window")]
    MonitorInfoFailed(#[source] OsError),

    #[error("Failed to create the window icon")]
    IconCreationFailed(#[source] OsError),

    #[error("Failed to get the window style")]
    GetStyleFailed(#[source] OsError),

    #[error("Image cannot be used as an icon")]
    InvalidIcon(#[source] IconError),

    #[error("Failed to release the previous window icon")]
    IconReleaseFailed(#[source] OsError),

    #[error("Failed to get the device context of the window")]
    DeviceContextFailed(#[source] OsError),
}

impl ErrorCode for WindowError {
    fn code(&self) -> u32 {
        match self {
            WindowError::SetRectangleFailed(_) => 0x000300,
            WindowError::SetTitleFailed(_) => 0x000301,
            WindowError::GetRectangleFailed(_) => 0x000302,
            WindowError::SetStyleFailed(_) => 0x000303,
            WindowError::MonitorInfoFailed(_) => 0x000304,
            WindowError::IconCreationFailed(_) => 0x000305,
            WindowError::GetStyleFailed(_) => 0x000306,
            WindowError::InvalidIcon(_) => 0x000307,
            WindowError::IconReleaseFailed(_) => 0x000308,
            WindowError::DeviceContextFailed(_) => 0x000309,
        }
    }
}

/// A window owned by the [`WindowManager`](super::WindowManager)
pub struct Window {
    platform: Rc<dyn Platform>,
    handle: NativeWindow,
    rectangle: Rect,
    restore_rectangle: Rect,
    fullscreen: bool,
    open: bool,
    cursor_visible: bool,
    icon: Option<NativeIcon>,
}

impl Window {
    pub(crate) fn new(platform: Rc<dyn Platform>, handle: NativeWindow, rectangle: Rect) -> Self {
        Self {
            platform,
            handle,
            rectangle,
            restore_rectangle: rectangle,
            fullscreen: false,
            open: true,
            cursor_visible: true,
            icon: None,
        }
    }

    pub(crate) fn platform(&self) -> &Rc<dyn Platform> {
        &self.platform
    }

    pub fn handle(&self) -> NativeWindow {
        self.handle
    }

    /// Outer window rectangle; the monitor's while fullscreen
    pub fn rectangle(&self) -> Rect {
        self.rectangle
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// True once the user asked to close the window or [`close`](Self::close) ran
    pub fn should_close(&self) -> bool {
        !self.open
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Device context of the client area. Windows of the class own their
    /// device context; release it through the platform once done.
    pub fn device_context(&self) -> Result<DeviceContext, WindowError> {
        self.platform
            .device_context(self.handle)
            .map_err(|source| fatal(COMPONENT, WindowError::DeviceContextFailed(source)))
    }

    /// Marks the window closed. The native window stays alive until the
    /// manager destroys it.
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn show(&self) {
        self.platform.show_window(self.handle, true);
    }

    pub fn hide(&self) {
        self.platform.show_window(self.handle, false);
    }

    /// Hides or shows the cursor while it is over the client area
    pub fn set_cursor_visibility(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), WindowError> {
        self.platform
            .set_window_title(self.handle, title)
            .map_err(|source| fatal(COMPONENT, WindowError::SetTitleFailed(source)))
    }

    /// Moves and resizes the window; ignored while fullscreen
    pub fn set_rectangle(&mut self, rectangle: Rect) -> Result<(), WindowError> {
        if self.fullscreen {
            log::debug!("{COMPONENT} Ignoring rectangle {rectangle:?} while fullscreen");
            return Ok(());
        }

        self.platform
            .set_window_rect(self.handle, rectangle)
            .map_err(|source| fatal(COMPONENT, WindowError::SetRectangleFailed(source)))?;

        self.rectangle = rectangle;
        self.restore_rectangle = rectangle;
        Ok(())
    }

    /// Switches between a borderless window covering the nearest monitor and
    /// the captioned window at its previous geometry
    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), WindowError> {
        if fullscreen == self.fullscreen {
            return Ok(());
        }

        let previous = self
            .platform
            .window_style(self.handle)
            .map_err(|source| fatal(COMPONENT, WindowError::GetStyleFailed(source)))?;

        let (style, rectangle) = if fullscreen {
            let monitor = self
                .platform
                .monitor_rect(self.handle)
                .map_err(|source| fatal(COMPONENT, WindowError::MonitorInfoFailed(source)))?;
            (previous.difference(WindowStyle::CAPTION), monitor)
        } else {
            (previous.union(WindowStyle::CAPTION), self.restore_rectangle)
        };

        self.platform
            .set_window_style(self.handle, style)
            .map_err(|source| fatal(COMPONENT, WindowError::SetStyleFailed(source)))?;

        if let Err(source) = self.platform.set_window_rect(self.handle, rectangle) {
            // Keep the OS window matching the cached mode
            if let Err(error) = self.platform.set_window_style(self.handle, previous) {
                log::warn!("{COMPONENT} Failed to restore style of {:?}: {error}", self.handle);
            }
            return Err(fatal(COMPONENT, WindowError::SetRectangleFailed(source)));
        }

        log::debug!(
            "{COMPONENT} Window {:?} {} fullscreen at {rectangle:?}",
            self.handle,
            if fullscreen { "entered" } else { "left" }
        );

        self.rectangle = rectangle;
        self.fullscreen = fullscreen;
        Ok(())
    }

    /// Replaces the window icon; `None` removes it
    ///
    /// The image is rescaled to the system icon size. The previous icon is
    /// released once the window no longer uses it.
    pub fn set_icon(&mut self, image: Option<&Image>) -> Result<(), WindowError> {
        let icon = match image {
            Some(image) => {
                let bitmap = rasterise_icon(image, self.platform.icon_size())
                    .map_err(|source| fatal(COMPONENT, WindowError::InvalidIcon(source)))?;

                let icon = self
                    .platform
                    .create_icon(bitmap.width, bitmap.height, &bitmap.bgra)
                    .map_err(|source| fatal(COMPONENT, WindowError::IconCreationFailed(source)))?;
                Some(icon)
            }
            None => None,
        };

        self.platform.set_window_icon(self.handle, icon);

        match std::mem::replace(&mut self.icon, icon) {
            Some(previous) => self
                .platform
                .destroy_icon(previous)
                .map_err(|source| fatal(COMPONENT, WindowError::IconReleaseFailed(source))),
            None => Ok(()),
        }
    }

    /// Reacts to a routed message; false requests default processing
    pub(crate) fn handle_message(&mut self, message: WindowMessage) -> bool {
        match message {
            WindowMessage::Close => {
                self.close();
                true
            }
            WindowMessage::SetCursor { in_client_area } if in_client_area && !self.cursor_visible => {
                self.platform.hide_cursor();
                true
            }
            WindowMessage::SetCursor { .. } => false,
        }
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("handle", &self.handle)
            .field("rectangle", &self.rectangle)
            .field("fullscreen", &self.fullscreen)
            .field("open", &self.open)
            .finish()
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if let Some(icon) = self.icon.take() {
            if let Err(error) = self.platform.destroy_icon(icon) {
                log::warn!("{COMPONENT} Failed to release icon of {:?}: {error}", self.handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::ImageFormat;
    use crate::graphics::test_support::test_window;
    use crate::platform::{FailPoint, HeadlessPlatform, WindowBackend};

    const MONITOR: Rect = Rect {
        x: 0,
        y: 0,
        w: 2560,
        h: 1440,
    };

    fn platform() -> Rc<HeadlessPlatform> {
        Rc::new(HeadlessPlatform::new().with_monitor(MONITOR))
    }

    fn icon_image() -> Image {
        Image::new(2, 2, ImageFormat::RGBA8, vec![255; 16]).unwrap()
    }

    #[test]
    fn set_rectangle_applies_when_windowed() {
        let platform = platform();
        let mut window = test_window(&platform);
        let target = Rect::new(100, 50, 640, 480);

        window.set_rectangle(target).unwrap();

        assert_eq!(window.rectangle(), target);
        assert_eq!(platform.window_rect(window.handle()).unwrap(), target);
    }

    #[test]
    fn fullscreen_round_trip_restores_rectangle() {
        let rectangles = [
            Rect::new(0, 0, 800, 600),
            Rect::new(-20, 35, 1024, 768),
            Rect::new(300, 200, 1, 1),
            Rect::new(1000, 900, 3000, 2000),
        ];

        for initial in rectangles {
            let platform = platform();
            let mut window = test_window(&platform);
            window.set_rectangle(initial).unwrap();

            window.set_fullscreen(true).unwrap();
            assert!(window.is_fullscreen());
            assert_eq!(window.rectangle(), MONITOR);

            window.set_fullscreen(false).unwrap();
            assert!(!window.is_fullscreen());
            assert_eq!(window.rectangle(), initial);
            assert_eq!(platform.window_rect(window.handle()).unwrap(), initial);
        }
    }

    #[test]
    fn set_rectangle_is_ignored_while_fullscreen() {
        let platform = platform();
        let mut window = test_window(&platform);
        let before = window.rectangle();
        window.set_fullscreen(true).unwrap();

        window.set_rectangle(Rect::new(5, 5, 10, 10)).unwrap();
        assert_eq!(window.rectangle(), MONITOR);

        window.set_fullscreen(false).unwrap();
        assert_eq!(window.rectangle(), before);
    }

    #[test]
    fn fullscreen_drops_caption_only() {
        let platform = platform();
        let mut window = test_window(&platform);

        window.set_fullscreen(true).unwrap();
        let style = platform.window_style(window.handle()).unwrap();
        assert!(!style.intersects(WindowStyle::CAPTION));
        assert!(style.contains(WindowStyle::SYSMENU | WindowStyle::MINIMIZE_BOX));

        window.set_fullscreen(false).unwrap();
        assert_eq!(platform.window_style(window.handle()).unwrap(), WindowStyle::DEFAULT);
    }

    #[test]
    fn requesting_current_mode_is_a_no_op() {
        let platform = platform();
        let mut window = test_window(&platform);
        platform.fail(FailPoint::SetWindowStyle);

        assert!(window.set_fullscreen(false).is_ok());
        assert!(!window.is_fullscreen());
    }

    #[test]
    fn style_failure_leaves_window_windowed() {
        let platform = platform();
        let mut window = test_window(&platform);
        let before = window.rectangle();
        platform.fail(FailPoint::SetWindowStyle);

        let error = window.set_fullscreen(true).unwrap_err();

        assert_eq!(error.code(), 0x000303);
        assert!(!window.is_fullscreen());
        assert_eq!(window.rectangle(), before);
    }

    #[test]
    fn rectangle_failure_restores_previous_style() {
        let platform = platform();
        let mut window = test_window(&platform);
        let before = window.rectangle();
        platform.fail(FailPoint::SetWindowRect);

        let error = window.set_fullscreen(true).unwrap_err();

        assert_eq!(error.code(), 0x000300);
        assert!(!window.is_fullscreen());
        assert_eq!(window.rectangle(), before);
        assert_eq!(platform.window_style(window.handle()).unwrap(), WindowStyle::DEFAULT);

        platform.recover(FailPoint::SetWindowRect);
        window.set_fullscreen(true).unwrap();
        window.set_fullscreen(false).unwrap();
        assert_eq!(platform.window_style(window.handle()).unwrap(), WindowStyle::DEFAULT);
        assert_eq!(window.rectangle(), before);
    }

    #[test]
    fn monitor_failure_is_reported() {
        let platform = platform();
        let mut window = test_window(&platform);
        platform.fail(FailPoint::MonitorRect);

        let error = window.set_fullscreen(true).unwrap_err();
        assert!(matches!(error, WindowError::MonitorInfoFailed(_)));
    }

    #[test]
    fn close_is_idempotent() {
        let platform = platform();
        let mut window = test_window(&platform);
        assert!(!window.should_close());

        window.close();
        window.close();

        assert!(window.should_close());
        assert!(!window.is_open());
        assert!(platform.is_window(window.handle()));
    }

    #[test]
    fn device_context_failure_is_reported() {
        let platform = platform();
        let window = test_window(&platform);
        assert!(window.device_context().is_ok());

        platform.fail(FailPoint::DeviceContext);

        assert_eq!(window.device_context().unwrap_err().code(), 0x000309);
    }

    #[test]
    fn title_and_visibility_reach_the_platform() {
        let platform = platform();
        let mut window = test_window(&platform);

        window.set_title("Ember").unwrap();
        window.show();
        assert_eq!(platform.window_title(window.handle()).as_deref(), Some("Ember"));
        assert!(platform.is_visible(window.handle()));

        window.hide();
        assert!(!platform.is_visible(window.handle()));
    }

    #[test]
    fn replacing_icon_releases_the_previous_one() {
        let platform = platform();
        let mut window = test_window(&platform);

        window.set_icon(Some(&icon_image())).unwrap();
        let first = platform.window_icon(window.handle());
        window.set_icon(Some(&icon_image())).unwrap();

        assert_eq!(platform.live_icon_count(), 1);
        assert_ne!(platform.window_icon(window.handle()), first);

        window.set_icon(None).unwrap();
        assert_eq!(platform.live_icon_count(), 0);
        assert_eq!(platform.window_icon(window.handle()), None);
    }

    #[test]
    fn icon_creation_failure_keeps_previous_icon() {
        let platform = platform();
        let mut window = test_window(&platform);
        window.set_icon(Some(&icon_image())).unwrap();
        let previous = platform.window_icon(window.handle());
        platform.fail(FailPoint::CreateIcon);

        let error = window.set_icon(Some(&icon_image())).unwrap_err();

        assert_eq!(error.code(), 0x000305);
        assert_eq!(platform.window_icon(window.handle()), previous);
        assert_eq!(platform.live_icon_count(), 1);
    }

    #[test]
    fn dropping_window_releases_icon() {
        let platform = platform();
        let mut window = test_window(&platform);
        window.set_icon(Some(&icon_image())).unwrap();

        drop(window);

        assert_eq!(platform.live_icon_count(), 0);
    }

    #[test]
    fn hidden_cursor_is_suppressed_in_client_area_only() {
        let platform = platform();
        let mut window = test_window(&platform);

        let visible = window.handle_message(WindowMessage::SetCursor { in_client_area: true });
        assert!(!visible);

        window.set_cursor_visibility(false);
        assert!(!window.handle_message(WindowMessage::SetCursor { in_client_area: false }));
        assert!(window.handle_message(WindowMessage::SetCursor { in_client_area: true }));
        assert_eq!(platform.cursor_hides(), 1);
    }
}
