use crate::error::OcrError;
use image::{DynamicImage, Luma};
use imageproc::contrast::otsu_level;

/// Binarize with a global Otsu threshold
///
/// The MRZ band is small and evenly lit once cropped, so a global level
/// separates the OCR-B glyphs from the background well enough.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let mut gray = image.into_luma8();
    let level = otsu_level(&gray);

    for pixel in gray.pixels_mut() {
        *pixel = if pixel.0[0] > level { Luma([255]) } else { Luma([0]) };
    }

    Ok(DynamicImage::ImageLuma8(gray))
}
