use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// A decoded picture, already scaled to its on-screen logical size.
#[derive(Debug, Clone)]
pub struct Sprite {
    pixels: RgbaImage,
}

impl Sprite {
    /// Missing or undecodable pictures are not errors; the caller falls back
    /// to an invisible hit box.
    pub fn load(path: &Path, scale: f32) -> Option<Self> {
        match image::open(path) {
            Ok(img) => Some(Self::scaled(img.to_rgba8(), scale)),
            Err(e) => {
                log::debug!("could not load picture {}: {e}", path.display());
                None
            }
        }
    }

    /// Loads a picture stretched to exactly `width x height`.
    pub fn load_stretched(path: &Path, width: u32, height: u32) -> Option<Self> {
        let img = image::open(path)
            .map_err(|e| log::debug!("could not load picture {}: {e}", path.display()))
            .ok()?;
        let pixels = imageops::resize(&img.to_rgba8(), width.max(1), height.max(1), FilterType::Triangle);
        Some(Sprite { pixels })
    }

    pub fn scaled(pixels: RgbaImage, scale: f32) -> Self {
        if (scale - 1.0).abs() <= 1e-6 {
            return Sprite { pixels };
        }
        let w = ((pixels.width() as f32 * scale) as u32).max(1);
        let h = ((pixels.height() as f32 * scale) as u32).max(1);
        Sprite {
            pixels: imageops::resize(&pixels, w, h, FilterType::Triangle),
        }
    }

    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let [r, g, b] = rgb;
        Sprite {
            pixels: RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([r, g, b, 255])),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Opaque colour at a sprite-local position; `None` outside the sprite
    /// or where the picture is mostly transparent.
    pub fn opaque_at(&self, x: i32, y: i32) -> Option<[u8; 3]> {
        if x < 0 || y < 0 {
            return None;
        }
        let pixel = self.pixels.get_pixel_checked(x as u32, y as u32)?;
        let Rgba([r, g, b, a]) = *pixel;
        (a >= 128).then_some([r, g, b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_applied_once() {
        let sprite = Sprite::scaled(RgbaImage::new(200, 100), 0.5);
        assert_eq!((sprite.width(), sprite.height()), (100, 50));
    }

    #[test]
    fn tiny_scale_keeps_one_pixel() {
        let sprite = Sprite::scaled(RgbaImage::new(10, 10), 0.01);
        assert_eq!((sprite.width(), sprite.height()), (1, 1));
    }

    #[test]
    fn transparent_pixels_are_not_opaque() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        let sprite = Sprite::scaled(img, 1.0);
        assert_eq!(sprite.opaque_at(0, 0), Some([10, 20, 30]));
        assert_eq!(sprite.opaque_at(1, 0), None);
        assert_eq!(sprite.opaque_at(2, 0), None);
        assert_eq!(sprite.opaque_at(-1, 0), None);
    }

    #[test]
    fn missing_picture_loads_as_none() {
        assert!(Sprite::load(Path::new("definitely/not/here.png"), 1.0).is_none());
    }
}
