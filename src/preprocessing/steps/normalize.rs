use crate::error::OcrError;
use image::{DynamicImage, GrayImage, Luma};

/// Share of darkest and brightest pixels ignored when picking the range,
/// so a glare spot or a black border does not pin the stretch
const CLIP_FRACTION: f32 = 0.01;

/// Stretch contrast between the clipped low and high luma percentiles
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let gray = image.into_luma8();
    let (low, high) = clipped_range(&gray, CLIP_FRACTION);

    if high <= low {
        return Ok(DynamicImage::ImageLuma8(gray));
    }

    let range = (high - low) as f32;
    let mut out = gray;
    for pixel in out.pixels_mut() {
        let v = pixel.0[0].clamp(low, high);
        *pixel = Luma([((v - low) as f32 / range * 255.0).round() as u8]);
    }

    Ok(DynamicImage::ImageLuma8(out))
}

fn clipped_range(img: &GrayImage, clip: f32) -> (u8, u8) {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    let cutoff = (total as f32 * clip) as u64;

    let mut seen = 0;
    let mut low = 0u8;
    for (value, count) in histogram.iter().enumerate() {
        seen += count;
        if seen > cutoff {
            low = value as u8;
            break;
        }
    }

    seen = 0;
    let mut high = 255u8;
    for (value, count) in histogram.iter().enumerate().rev() {
        seen += count;
        if seen > cutoff {
            high = value as u8;
            break;
        }
    }

    (low, high)
}
