//! Display adapter enumeration and display mode switching

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    CDS_FULLSCREEN, CDS_TYPE, ChangeDisplaySettingsExW, DEVMODEW, DISP_CHANGE_SUCCESSFUL,
    DISPLAY_DEVICE_ATTACHED_TO_DESKTOP, DISPLAY_DEVICE_PRIMARY_DEVICE, DISPLAY_DEVICEW,
    DM_BITSPERPEL, DM_DISPLAYFREQUENCY, DM_PELSHEIGHT, DM_PELSWIDTH, ENUM_CURRENT_SETTINGS,
    ENUM_DISPLAY_SETTINGS_MODE, EnumDisplayDevicesW, EnumDisplaySettingsW,
};
use windows::core::{HSTRING, PCWSTR};

use super::{Win32Platform, from_wide};
use crate::domain::display_mode::DisplayMode;
use crate::platform::backend::{AdapterInfo, DisplayBackend, OsError};

fn empty_devmode() -> DEVMODEW {
    DEVMODEW {
        dmSize: std::mem::size_of::<DEVMODEW>() as u16,
        ..Default::default()
    }
}

fn query_mode(adapter: &str, mode_index: ENUM_DISPLAY_SETTINGS_MODE) -> DisplayMode {
    let name = HSTRING::from(adapter);
    let mut info = empty_devmode();

    let found = unsafe { EnumDisplaySettingsW(&name, mode_index, &mut info) };
    if !found.as_bool() {
        return DisplayMode::default();
    }

    DisplayMode::new(
        info.dmPelsWidth,
        info.dmPelsHeight,
        info.dmBitsPerPel,
        info.dmDisplayFrequency,
    )
}

impl DisplayBackend for Win32Platform {
    fn adapter(&self, index: u32) -> Option<AdapterInfo> {
        let mut device = DISPLAY_DEVICEW {
            cb: std::mem::size_of::<DISPLAY_DEVICEW>() as u32,
            ..Default::default()
        };

        let found = unsafe { EnumDisplayDevicesW(PCWSTR::null(), index, &mut device, 0) };
        if !found.as_bool() {
            return None;
        }

        Some(AdapterInfo {
            name: from_wide(&device.DeviceName),
            attached_to_desktop: (device.StateFlags & DISPLAY_DEVICE_ATTACHED_TO_DESKTOP) != 0,
            primary: (device.StateFlags & DISPLAY_DEVICE_PRIMARY_DEVICE) != 0,
        })
    }

    fn display_mode(&self, adapter: &str, index: u32) -> DisplayMode {
        query_mode(adapter, ENUM_DISPLAY_SETTINGS_MODE(index))
    }

    fn current_display_mode(&self, adapter: &str) -> DisplayMode {
        query_mode(adapter, ENUM_CURRENT_SETTINGS)
    }

    fn change_display_mode(
        &self,
        adapter: &str,
        mode: Option<&DisplayMode>,
    ) -> Result<(), OsError> {
        let name = HSTRING::from(adapter);

        let result = match mode {
            Some(mode) => {
                let info = DEVMODEW {
                    dmBitsPerPel: mode.colour_depth(),
                    dmPelsWidth: mode.width(),
                    dmPelsHeight: mode.height(),
                    dmDisplayFrequency: mode.frequency(),
                    dmFields: DM_BITSPERPEL | DM_DISPLAYFREQUENCY | DM_PELSHEIGHT | DM_PELSWIDTH,
                    ..empty_devmode()
                };

                unsafe {
                    ChangeDisplaySettingsExW(&name, Some(&info), HWND(0), CDS_FULLSCREEN, None)
                }
            }
            // A null mode resets the adapter to its registry settings
            None => unsafe { ChangeDisplaySettingsExW(&name, None, HWND(0), CDS_TYPE(0), None) },
        };

        if result != DISP_CHANGE_SUCCESSFUL {
            return Err(OsError::new("ChangeDisplaySettingsExW", result.0 as u32));
        }

        Ok(())
    }
}
