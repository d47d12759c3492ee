pub mod icon;

pub use icon::{IconBitmap, IconError, rasterise_icon};
