use crate::error::OcrError;
use image::DynamicImage;

/// Convert to 8-bit luma; every later step assumes a single channel
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    if image.as_luma8().is_some() {
        return Ok(image);
    }
    Ok(DynamicImage::ImageLuma8(image.to_luma8()))
}
