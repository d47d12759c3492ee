//! Window icon rasterisation
//!
//! Converts a decoded [`Image`] into the straight-alpha BGRA rows the
//! platform builds icons from. Images that do not match the system icon
//! size are rescaled with bilinear filtering.

use tiny_skia::{ColorU8, FilterQuality, IntSize, Pixmap, PixmapPaint, Transform};

use crate::domain::image::Image;

/// Icon rasterisation errors
#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("Invalid icon dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Icon pixels in the platform's layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBitmap {
    pub width: u32,
    pub height: u32,
    /// Top-down rows of straight-alpha BGRA pixels
    pub bgra: Vec<u8>,
}

/// Rasterises `image` at `size` (width, height)
pub fn rasterise_icon(image: &Image, size: (u32, u32)) -> Result<IconBitmap, IconError> {
    let (width, height) = size;
    let source = image_to_pixmap(image)?;

    let pixmap = if source.width() == width && source.height() == height {
        source
    } else {
        let mut target =
            Pixmap::new(width, height).ok_or(IconError::InvalidDimensions { width, height })?;

        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        let transform = Transform::from_scale(
            width as f32 / source.width() as f32,
            height as f32 / source.height() as f32,
        );

        target.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
        target
    };

    let bgra = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let color = pixel.demultiply();
            [color.blue(), color.green(), color.red(), color.alpha()]
        })
        .collect();

    Ok(IconBitmap {
        width,
        height,
        bgra,
    })
}

/// tiny-skia stores premultiplied RGBA
fn image_to_pixmap(image: &Image) -> Result<Pixmap, IconError> {
    let invalid = IconError::InvalidDimensions {
        width: image.width(),
        height: image.height(),
    };

    let Some(size) = IntSize::from_wh(image.width(), image.height()) else {
        return Err(invalid);
    };

    let data = image
        .rgba_pixels()
        .flat_map(|[r, g, b, a]| {
            let color = ColorU8::from_rgba(r, g, b, a).premultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
        .collect();

    Pixmap::from_vec(data, size).ok_or(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::ImageFormat;

    fn pixel_at(icon: &IconBitmap, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * icon.width + x) * 4) as usize;
        let mut pixel = [0; 4];
        pixel.copy_from_slice(&icon.bgra[offset..offset + 4]);
        pixel
    }

    #[test]
    fn same_size_image_only_swaps_channels() {
        let data = vec![
            255, 0, 0, 255, //
            0, 255, 0, 255, //
            0, 0, 255, 255, //
            10, 20, 30, 255,
        ];
        let image = Image::new(2, 2, ImageFormat::RGBA8, data).unwrap();

        let icon = rasterise_icon(&image, (2, 2)).unwrap();

        assert_eq!(pixel_at(&icon, 0, 0), [0, 0, 255, 255]);
        assert_eq!(pixel_at(&icon, 1, 0), [0, 255, 0, 255]);
        assert_eq!(pixel_at(&icon, 0, 1), [255, 0, 0, 255]);
        assert_eq!(pixel_at(&icon, 1, 1), [30, 20, 10, 255]);
    }

    #[test]
    fn small_image_is_scaled_to_icon_size() {
        let image = Image::new(1, 1, ImageFormat::RGB8, vec![200, 100, 50]).unwrap();

        let icon = rasterise_icon(&image, (32, 32)).unwrap();

        assert_eq!((icon.width, icon.height), (32, 32));
        assert_eq!(icon.bgra.len(), 32 * 32 * 4);
        let centre = pixel_at(&icon, 16, 16);
        for (actual, expected) in centre.iter().zip([50u8, 100, 200, 255]) {
            assert!(actual.abs_diff(expected) <= 1, "{centre:?}");
        }
    }

    #[test]
    fn grey_alpha_keeps_transparency() {
        let image = Image::new(1, 1, ImageFormat::RA8, vec![128, 0]).unwrap();

        let icon = rasterise_icon(&image, (1, 1)).unwrap();

        assert_eq!(pixel_at(&icon, 0, 0)[3], 0);
    }

    #[test]
    fn zero_target_size_is_rejected() {
        let image = Image::new(1, 1, ImageFormat::R8, vec![255]).unwrap();

        let error = rasterise_icon(&image, (0, 16)).unwrap_err();

        assert!(matches!(
            error,
            IconError::InvalidDimensions { width: 0, height: 16 }
        ));
    }
}
