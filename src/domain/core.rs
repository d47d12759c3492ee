//! Core geometry types
//!
//! Rectangles are kept in screen coordinates (real pixels). Secondary
//! monitors can sit at negative coordinates, so all fields are signed.

/// Rectangle in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Creates a new rectangle
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Creates a rectangle from its left/top/right/bottom edges
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Creates a `w` x `h` rectangle centred inside an area of
    /// `area_w` x `area_h` anchored at the origin
    pub fn centered(w: i32, h: i32, area_w: i32, area_h: i32) -> Self {
        Self::new(area_w / 2 - w / 2, area_h / 2 - h / 2, w, h)
    }

    /// Returns the right edge coordinate
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Returns the bottom edge coordinate
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_basic_properties() {
        let rect = Rect::new(10, 20, 100, 50);
        assert_eq!(rect.right(), 110);
        assert_eq!(rect.bottom(), 70);
    }

    #[test]
    fn rect_from_edges() {
        assert_eq!(Rect::from_edges(-8, -31, 808, 608), Rect::new(-8, -31, 816, 639));
    }

    #[test]
    fn centered_rect_on_full_hd() {
        let rect = Rect::centered(800, 600, 1920, 1080);
        assert_eq!(rect, Rect::new(560, 240, 800, 600));
    }

    #[test]
    fn centered_rect_larger_than_area_goes_negative() {
        assert_eq!(Rect::centered(1000, 800, 800, 600), Rect::new(-100, -100, 1000, 800));
    }
}
