//! Pixel format attributes and the ranking used to pick a graphics config
//!
//! Formats are described by a fixed vector of seven integer attributes,
//! queried by WGL attribute id. Ranking prefers full hardware acceleration,
//! then double buffering, then colour depth, then depth-buffer precision.
//! Only accelerated, double-buffered formats are acceptable at all.

use std::cmp::Ordering;

pub const WGL_NUMBER_PIXEL_FORMATS_ARB: i32 = 0x2000;
pub const WGL_DRAW_TO_WINDOW_ARB: i32 = 0x2001;
pub const WGL_ACCELERATION_ARB: i32 = 0x2003;
pub const WGL_SUPPORT_OPENGL_ARB: i32 = 0x2010;
pub const WGL_DOUBLE_BUFFER_ARB: i32 = 0x2011;
pub const WGL_COLOR_BITS_ARB: i32 = 0x2014;
pub const WGL_DEPTH_BITS_ARB: i32 = 0x2022;
pub const WGL_STENCIL_BITS_ARB: i32 = 0x2023;

pub const WGL_NO_ACCELERATION_ARB: i32 = 0x2025;
pub const WGL_GENERIC_ACCELERATION_ARB: i32 = 0x2026;
pub const WGL_FULL_ACCELERATION_ARB: i32 = 0x2027;

/// Number of attributes queried per format
pub const PIXEL_FORMAT_ATTRIBUTE_COUNT: usize = 7;

/// Attribute ids in the order they appear in a raw attribute vector
pub const PIXEL_FORMAT_ATTRIBUTE_IDS: [i32; PIXEL_FORMAT_ATTRIBUTE_COUNT] = [
    WGL_SUPPORT_OPENGL_ARB,
    WGL_DRAW_TO_WINDOW_ARB,
    WGL_ACCELERATION_ARB,
    WGL_DOUBLE_BUFFER_ARB,
    WGL_COLOR_BITS_ARB,
    WGL_DEPTH_BITS_ARB,
    WGL_STENCIL_BITS_ARB,
];

pub type PixelFormatAttributeList = [i32; PIXEL_FORMAT_ATTRIBUTE_COUNT];

/// Acceleration type reported for a pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Acceleration {
    None,
    /// Generic (software-emulated) implementation
    Generic,
    Full,
}

impl Acceleration {
    pub fn from_raw(value: i32) -> Self {
        match value {
            WGL_FULL_ACCELERATION_ARB => Acceleration::Full,
            WGL_GENERIC_ACCELERATION_ARB => Acceleration::Generic,
            _ => Acceleration::None,
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            Acceleration::None => WGL_NO_ACCELERATION_ARB,
            Acceleration::Generic => WGL_GENERIC_ACCELERATION_ARB,
            Acceleration::Full => WGL_FULL_ACCELERATION_ARB,
        }
    }
}

/// Decoded attribute vector of one pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatAttributes {
    pub supports_opengl: bool,
    pub draws_to_window: bool,
    pub acceleration: Acceleration,
    pub double_buffered: bool,
    pub colour_bits: u32,
    pub depth_bits: u32,
    pub stencil_bits: u32,
}

impl PixelFormatAttributes {
    /// Typical accelerated 32-bit colour, 24-bit depth, 8-bit stencil format
    pub fn accelerated(colour_bits: u32, depth_bits: u32) -> Self {
        Self {
            supports_opengl: true,
            draws_to_window: true,
            acceleration: Acceleration::Full,
            double_buffered: true,
            colour_bits,
            depth_bits,
            stencil_bits: 8,
        }
    }

    /// Decodes a raw vector ordered as [`PIXEL_FORMAT_ATTRIBUTE_IDS`]
    pub fn from_raw(values: &PixelFormatAttributeList) -> Self {
        Self {
            supports_opengl: values[0] != 0,
            draws_to_window: values[1] != 0,
            acceleration: Acceleration::from_raw(values[2]),
            double_buffered: values[3] != 0,
            colour_bits: values[4].max(0) as u32,
            depth_bits: values[5].max(0) as u32,
            stencil_bits: values[6].max(0) as u32,
        }
    }

    /// Value of a single attribute by WGL id, `None` for ids outside the vector
    pub fn value_of(&self, attribute_id: i32) -> Option<i32> {
        let value = match attribute_id {
            WGL_SUPPORT_OPENGL_ARB => self.supports_opengl as i32,
            WGL_DRAW_TO_WINDOW_ARB => self.draws_to_window as i32,
            WGL_ACCELERATION_ARB => self.acceleration.to_raw(),
            WGL_DOUBLE_BUFFER_ARB => self.double_buffered as i32,
            WGL_COLOR_BITS_ARB => self.colour_bits as i32,
            WGL_DEPTH_BITS_ARB => self.depth_bits as i32,
            WGL_STENCIL_BITS_ARB => self.stencil_bits as i32,
            _ => return None,
        };

        Some(value)
    }

    /// Whether the engine can render with this format at all
    pub fn is_acceptable(&self) -> bool {
        self.supports_opengl
            && self.draws_to_window
            && self.acceleration == Acceleration::Full
            && self.double_buffered
    }

    /// Compares two formats by preference; `Greater` means `self` is better
    pub fn rank(&self, other: &Self) -> Ordering {
        self.rank_key().cmp(&other.rank_key())
    }

    fn rank_key(&self) -> (bool, bool, bool, u32, u32) {
        (
            self.supports_opengl && self.draws_to_window,
            self.acceleration == Acceleration::Full,
            self.double_buffered,
            self.colour_bits,
            self.depth_bits,
        )
    }
}

/// Picks the best-ranked candidate; the first discovered wins ties.
/// Returns `None` for an empty candidate list.
pub fn choose_best<I>(candidates: I) -> Option<(i32, PixelFormatAttributes)>
where
    I: IntoIterator<Item = (i32, PixelFormatAttributes)>,
{
    let mut best: Option<(i32, PixelFormatAttributes)> = None;

    for candidate in candidates {
        match &best {
            Some((_, current)) if candidate.1.rank(current) != Ordering::Greater => {}
            _ => best = Some(candidate),
        }
    }

    best
}
