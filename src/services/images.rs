use std::io::Cursor;

use anyhow::{anyhow, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder};

pub const MAX_DIMENSION: u32 = 1200;
pub const JPEG_QUALITY: u8 = 80;
pub const MAX_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Re-encodes an uploaded photo for the website: RGB, at most
/// 1200x1200 with the aspect ratio kept, JPEG at quality 80.
pub fn process_image(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() > MAX_INPUT_BYTES {
        return Err(anyhow!("image too large: {} bytes", bytes.len()));
    }

    let decoded = image::load_from_memory(bytes).map_err(|e| anyhow!("invalid image: {}", e))?;

    let resized = if decoded.width() > MAX_DIMENSION || decoded.height() > MAX_DIMENSION {
        decoded.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        decoded
    };
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut output = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY).write_image(
        rgb.as_bytes(),
        rgb.width(),
        rgb.height(),
        rgb.color().into(),
    )?;

    Ok(output.into_inner())
}
