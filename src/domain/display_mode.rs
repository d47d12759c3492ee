//! Display mode value type
//!
//! A display mode is a (resolution, colour depth, refresh rate) combination
//! an adapter can present. Modes order by width, then height, then colour
//! depth, then frequency, which gives adapters a deterministic ascending list.

use std::fmt;

/// Immutable display mode. The all-zero default is the "no mode" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DisplayMode {
    width: u32,
    height: u32,
    colour_depth: u32,
    frequency: u32,
}

impl DisplayMode {
    pub const fn new(width: u32, height: u32, colour_depth: u32, frequency: u32) -> Self {
        Self {
            width,
            height,
            colour_depth,
            frequency,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bits per pixel
    pub fn colour_depth(&self) -> u32 {
        self.colour_depth
    }

    /// Refresh rate in hertz
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Returns true for the end-of-list sentinel
    pub fn is_sentinel(&self) -> bool {
        self.width == 0
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} {}bpp @ {}Hz",
            self.width, self.height, self.colour_depth, self.frequency
        )
    }
}

/// Sorts modes ascending and removes duplicates and sentinels
pub fn normalize_modes(modes: &mut Vec<DisplayMode>) {
    modes.retain(|mode| !mode.is_sentinel());
    modes.sort();
    modes.dedup();
    modes.shrink_to_fit();
}
