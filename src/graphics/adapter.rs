//! A display adapter and the display modes it supports
//!
//! Display modes are global OS state. An adapter whose mode was changed
//! through it puts the OS back to the default settings when dropped, so a
//! fullscreen switch never outlives the process objects that made it.

use std::rc::Rc;

use thiserror::Error;

use crate::domain::display_mode::{DisplayMode, normalize_modes};
use crate::error::{ErrorCode, fatal};
use crate::platform::{OsError, Platform};

const COMPONENT: &str = "[graphics::adapter]";

/// Errors raised by a [`GraphicsAdapter`]
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Display mode {mode} is not supported by adapter {adapter}")]
    UnsupportedMode { adapter: String, mode: DisplayMode },

    #[error("Failed to switch adapter {adapter} to display mode {mode}")]
    ModeChangeFailed {
        adapter: String,
        mode: DisplayMode,
        #[source]
        source: OsError,
    },
}

impl ErrorCode for AdapterError {
    fn code(&self) -> u32 {
        match self {
            AdapterError::UnsupportedMode { .. } => 0x000100,
            AdapterError::ModeChangeFailed { .. } => 0x000101,
        }
    }
}

/// One display adapter attached to the desktop
pub struct GraphicsAdapter {
    platform: Rc<dyn Platform>,
    name: String,
    modes: Vec<DisplayMode>,
    initial: usize,
    current: usize,
}

impl GraphicsAdapter {
    /// Builds an adapter from raw OS enumeration results
    ///
    /// `modes` may be unsorted and contain duplicates or sentinels. When
    /// `active` cannot be found among them the adapter starts at index 0;
    /// when no usable mode was enumerated `active` becomes the only mode.
    pub(crate) fn from_enumeration(
        platform: Rc<dyn Platform>,
        name: String,
        mut modes: Vec<DisplayMode>,
        active: DisplayMode,
    ) -> Self {
        normalize_modes(&mut modes);

        if modes.is_empty() {
            log::warn!("{COMPONENT} Adapter {name} reported no display modes, using {active}");
            modes.push(active);
        }

        let initial = match modes.binary_search(&active) {
            Ok(index) => index,
            Err(_) => {
                log::warn!(
                    "{COMPONENT} Active mode {active} of adapter {name} is not in its mode list, \
                     assuming {}",
                    modes[0]
                );
                0
            }
        };

        Self {
            platform,
            name,
            modes,
            initial,
            current: initial,
        }
    }

    /// OS device name the adapter was enumerated under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_display_mode(&self) -> DisplayMode {
        self.modes[self.current]
    }

    /// Mode that was active when the adapter was enumerated
    pub fn initial_display_mode(&self) -> DisplayMode {
        self.modes[self.initial]
    }

    /// Supported modes, sorted ascending without duplicates
    pub fn supported_display_modes(&self) -> &[DisplayMode] {
        &self.modes
    }

    /// Switches the adapter to `mode`, which must be one of
    /// [`supported_display_modes`](Self::supported_display_modes)
    ///
    /// # Arguments
    /// * `mode` - Target resolution, depth and refresh rate
    ///
    /// # Returns
    /// `UnsupportedMode` for modes outside the list, or the OS refusal
    pub fn set_display_mode(&mut self, mode: &DisplayMode) -> Result<(), AdapterError> {
        let Ok(index) = self.modes.binary_search(mode) else {
            return Err(fatal(
                COMPONENT,
                AdapterError::UnsupportedMode {
                    adapter: self.name.clone(),
                    mode: *mode,
                },
            ));
        };

        self.platform
            .change_display_mode(&self.name, Some(mode))
            .map_err(|source| {
                fatal(
                    COMPONENT,
                    AdapterError::ModeChangeFailed {
                        adapter: self.name.clone(),
                        mode: *mode,
                        source,
                    },
                )
            })?;

        log::info!("{COMPONENT} Adapter {} switched to {mode}", self.name);
        self.current = index;
        Ok(())
    }
}

impl std::fmt::Debug for GraphicsAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsAdapter")
            .field("name", &self.name)
            .field("modes", &self.modes.len())
            .field("current", &self.current_display_mode())
            .finish()
    }
}

impl Drop for GraphicsAdapter {
    fn drop(&mut self) {
        if self.current == self.initial {
            return;
        }

        match self.platform.change_display_mode(&self.name, None) {
            Ok(()) => log::info!("{COMPONENT} Restored display settings of {}", self.name),
            Err(error) => log::error!(
                "{COMPONENT} Failed to restore display settings of {}: {error}",
                self.name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{FailPoint, HeadlessPlatform};

    const NAME: &str = r"\\.\DISPLAY1";

    fn adapter(platform: &Rc<HeadlessPlatform>) -> GraphicsAdapter {
        GraphicsAdapter::from_enumeration(
            platform.clone(),
            NAME.to_string(),
            vec![
                DisplayMode::new(1920, 1080, 32, 60),
                DisplayMode::new(800, 600, 32, 60),
                DisplayMode::new(800, 600, 32, 60),
                DisplayMode::new(1280, 720, 32, 60),
            ],
            DisplayMode::new(1920, 1080, 32, 60),
        )
    }

    #[test]
    fn modes_are_sorted_and_unique() {
        let platform = Rc::new(HeadlessPlatform::new());
        let adapter = adapter(&platform);

        let modes = adapter.supported_display_modes();
        assert_eq!(modes.len(), 3);
        assert!(modes.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(adapter.current_display_mode(), DisplayMode::new(1920, 1080, 32, 60));
    }

    #[test]
    fn setting_supported_mode_updates_current() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut adapter = adapter(&platform);
        let target = DisplayMode::new(1280, 720, 32, 60);

        adapter.set_display_mode(&target).unwrap();

        assert_eq!(adapter.current_display_mode(), target);
        assert_eq!(platform.active_mode(NAME), Some(target));
    }

    #[test]
    fn unsupported_mode_is_rejected_without_state_change() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut adapter = adapter(&platform);
        let before = adapter.current_display_mode();

        let error = adapter
            .set_display_mode(&DisplayMode::new(640, 480, 16, 60))
            .unwrap_err();

        assert!(matches!(error, AdapterError::UnsupportedMode { .. }));
        assert_eq!(error.code(), 0x000100);
        assert_eq!(adapter.current_display_mode(), before);
        assert!(platform.display_changes().is_empty());
    }

    #[test]
    fn os_refusal_keeps_current_mode() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut adapter = adapter(&platform);
        platform.fail(FailPoint::ChangeDisplayMode);

        let error = adapter
            .set_display_mode(&DisplayMode::new(800, 600, 32, 60))
            .unwrap_err();

        assert_eq!(error.code(), 0x000101);
        assert_eq!(adapter.current_display_mode(), DisplayMode::new(1920, 1080, 32, 60));
    }

    #[test]
    fn drop_restores_once_after_change() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut adapter = adapter(&platform);
        adapter.set_display_mode(&DisplayMode::new(800, 600, 32, 60)).unwrap();

        drop(adapter);

        assert_eq!(platform.restore_count(), 1);
        assert_eq!(platform.active_mode(NAME), Some(DisplayMode::new(1920, 1080, 32, 60)));
    }

    #[test]
    fn drop_without_change_does_not_restore() {
        let platform = Rc::new(HeadlessPlatform::new());
        drop(adapter(&platform));
        assert_eq!(platform.restore_count(), 0);
    }

    #[test]
    fn switching_back_to_initial_mode_skips_restore() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut adapter = adapter(&platform);
        let initial = adapter.initial_display_mode();

        adapter.set_display_mode(&DisplayMode::new(800, 600, 32, 60)).unwrap();
        adapter.set_display_mode(&initial).unwrap();
        drop(adapter);

        assert_eq!(platform.restore_count(), 0);
    }

    #[test]
    fn unknown_active_mode_falls_back_to_first() {
        let platform = Rc::new(HeadlessPlatform::new());
        let adapter = GraphicsAdapter::from_enumeration(
            platform,
            NAME.to_string(),
            vec![DisplayMode::new(1280, 720, 32, 60), DisplayMode::new(800, 600, 32, 60)],
            DisplayMode::new(2560, 1440, 32, 60),
        );

        assert_eq!(adapter.current_display_mode(), DisplayMode::new(800, 600, 32, 60));
        assert_eq!(adapter.initial_display_mode(), adapter.current_display_mode());
    }

    #[test]
    fn empty_mode_list_uses_active_mode() {
        let platform = Rc::new(HeadlessPlatform::new());
        let active = DisplayMode::new(1024, 768, 32, 75);
        let adapter = GraphicsAdapter::from_enumeration(
            platform,
            NAME.to_string(),
            vec![DisplayMode::default()],
            active,
        );

        assert_eq!(adapter.supported_display_modes(), &[active]);
        assert_eq!(adapter.current_display_mode(), active);
    }
}
