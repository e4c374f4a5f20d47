use crate::error::OcrError;
use image::DynamicImage;

/// Text recognized from one image
#[derive(Debug, Clone)]
pub struct Recognition {
    pub text: String,
    /// Engine confidence on a 0-100 scale
    pub confidence_percent: f32,
    pub warnings: Vec<String>,
}

/// Trait that all OCR engines must implement
///
/// The MRZ decoder only ever sees the finished [`Recognition`], so any type
/// returning canned text can stand in for a real engine.
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize the text in an already decoded (and preprocessed) image
    fn recognize(&self, image: &DynamicImage) -> Result<Recognition, OcrError>;

    /// Get supported MIME types
    fn supported_formats(&self) -> Vec<String> {
        [
            "image/png",
            "image/jpeg",
            "image/gif",
            "image/bmp",
            "image/webp",
            "image/tiff",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String> {
        vec!["eng".to_string()]
    }
}
