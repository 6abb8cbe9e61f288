//! Profile photo decoding for embedding as an RGB image XObject.

use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Longest edge of the embedded photo, in pixels.
pub const PHOTO_PIXELS: u32 = 256;

/// A decoded, square-cropped photo ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileImage {
    pub width: u32,
    pub height: u32,
    /// Packed 8-bit RGB samples, row-major.
    pub rgb: Vec<u8>,
}

impl ProfileImage {
    /// Decodes any supported format, centre-crops to a square and downscales.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::from_dynamic(&decoded))
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        let side = width.min(height).max(1);
        let x = (width - side.min(width)) / 2;
        let y = (height - side.min(height)) / 2;
        let square = image.crop_imm(x, y, side, side);
        let target = side.min(PHOTO_PIXELS);
        let resized = if target == side {
            square
        } else {
            square.resize_exact(target, target, FilterType::Lanczos3)
        };
        let rgb = resized.to_rgb8();
        Self {
            width: rgb.width(),
            height: rgb.height(),
            rgb: rgb.into_raw(),
        }
    }
}
