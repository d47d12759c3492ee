//! Enumeration of the display adapters attached to the desktop
//!
//! Adapters are enumerated once at construction; hot-plugged adapters are
//! not picked up later. The OS-reported primary adapter is always first,
//! which window placement relies on.

use std::rc::Rc;

use crate::domain::display_mode::DisplayMode;
use crate::graphics::adapter::GraphicsAdapter;
use crate::platform::{AdapterInfo, Platform};

const COMPONENT: &str = "[graphics::adapter_manager]";

/// Owner of every attached [`GraphicsAdapter`]
#[derive(Debug)]
pub struct GraphicsAdapterManager {
    adapters: Vec<GraphicsAdapter>,
}

impl GraphicsAdapterManager {
    /// Enumerates adapters and their display modes
    pub fn new(platform: Rc<dyn Platform>) -> Self {
        let mut adapters = Vec::new();

        for info in (0..).map_while(|index| platform.adapter(index)) {
            if !info.attached_to_desktop {
                log::debug!("{COMPONENT} Skipping detached adapter {}", info.name);
                continue;
            }

            let adapter = Self::enumerate_adapter(&platform, &info);
            if info.primary {
                adapters.insert(0, adapter);
            } else {
                adapters.push(adapter);
            }
        }

        if adapters.is_empty() {
            log::warn!("{COMPONENT} No display adapter is attached to the desktop");
        }

        for adapter in &adapters {
            log::info!(
                "{COMPONENT} Adapter {}: {} modes, current {}",
                adapter.name(),
                adapter.supported_display_modes().len(),
                adapter.current_display_mode()
            );
        }

        Self { adapters }
    }

    fn enumerate_adapter(platform: &Rc<dyn Platform>, info: &AdapterInfo) -> GraphicsAdapter {
        let modes: Vec<DisplayMode> = (0..)
            .map(|index| platform.display_mode(&info.name, index))
            .take_while(|mode| !mode.is_sentinel())
            .collect();

        for mode in &modes {
            log::debug!("{COMPONENT} {} supports {mode}", info.name);
        }

        let active = platform.current_display_mode(&info.name);
        GraphicsAdapter::from_enumeration(platform.clone(), info.name.clone(), modes, active)
    }

    /// Adapters with the primary one first
    pub fn graphics_adapters(&self) -> &[GraphicsAdapter] {
        &self.adapters
    }

    pub fn graphics_adapters_mut(&mut self) -> &mut [GraphicsAdapter] {
        &mut self.adapters
    }

    /// The primary adapter, `None` only when no adapter is attached
    pub fn primary(&self) -> Option<&GraphicsAdapter> {
        self.adapters.first()
    }
}
