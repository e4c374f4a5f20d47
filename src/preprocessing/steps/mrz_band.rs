use crate::error::OcrError;
use image::DynamicImage;

/// Share of the page height, measured from the bottom, kept for the MRZ.
/// The two TD3 lines sit in roughly the lowest quarter of the data page.
const BAND_FRACTION: f32 = 0.35;
/// Width/height ratio above which the upload is taken to be an MRZ crop
const STRIP_ASPECT: f32 = 3.0;
/// Below this height there is nothing sensible to crop
const MIN_HEIGHT: u32 = 120;

/// Crop a full data-page photo down to the band holding the MRZ
///
/// Uploads that already look like a tight strip are left untouched.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(OcrError::PreprocessingError("Image has no pixels".to_string()));
    }

    if height < MIN_HEIGHT || width as f32 / height as f32 >= STRIP_ASPECT {
        return Ok(image);
    }

    let band_height = ((height as f32 * BAND_FRACTION).round() as u32).max(1);
    let top = height - band_height;

    tracing::debug!(width, height, top, band_height, "Cropping to MRZ band");

    Ok(image.crop_imm(0, top, width, band_height))
}
