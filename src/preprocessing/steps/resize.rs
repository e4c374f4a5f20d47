use crate::error::OcrError;
use image::{imageops::FilterType, DynamicImage};

/// 44 MRZ characters need roughly 25px each to recognize reliably
const MIN_WIDTH: u32 = 1100;
/// Maximum dimension to avoid memory issues
const MAX_DIMENSION: u32 = 4000;

/// Scale so an MRZ line spanning the width has enough pixels per character,
/// without letting large phone photos blow up memory.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Ok(image);
    }

    let mut scale = 1.0f32;
    if width < MIN_WIDTH {
        scale = MIN_WIDTH as f32 / width as f32;
    }

    let longest = (width.max(height) as f32 * scale).round();
    if longest > MAX_DIMENSION as f32 {
        scale *= MAX_DIMENSION as f32 / longest;
    }

    // Skip resize if dimensions are similar (within 5%)
    if (0.95..=1.05).contains(&scale) {
        return Ok(image);
    }

    let new_width = ((width as f32 * scale).round() as u32).max(1);
    let new_height = ((height as f32 * scale).round() as u32).max(1);

    Ok(image.resize_exact(new_width, new_height, FilterType::CatmullRom))
}
