//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models automatically on first use.

use crate::config::Config;
use crate::engine::{OcrEngine, Recognition};
use crate::error::OcrError;
use crate::mrz;
use image::DynamicImage;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// OCR Engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: OcrsOcrEngine,
}

impl OcrsEngine {
    /// Create a new engine, downloading models if needed
    pub fn new(_config: &Config) -> Result<Self, OcrError> {
        let detection_model = load_model(DETECTION_MODEL_URL, "text-detection.rten")?;
        let recognition_model = load_model(RECOGNITION_MODEL_URL, "text-recognition.rten")?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            OcrError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized successfully");

        Ok(Self { engine })
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - fast, no system dependencies required"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Recognition, OcrError> {
        let rgb_img = image.to_rgb8();
        let dimensions = rgb_img.dimensions();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            OcrError::ProcessingError(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to prepare input: {}", e)))?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to detect words: {}", e)))?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to recognize text: {}", e)))?;

        // MRZ lines have no spaces, so words detected inside one line are
        // glued back together.
        let text = line_texts
            .iter()
            .filter_map(|line| line.as_ref())
            .map(|line| line.words().map(|word| word.to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");

        let mut warnings = Vec::new();
        if text.is_empty() {
            warnings.push("No text detected in image".to_string());
        }

        Ok(Recognition {
            confidence_percent: mrz_confidence(&text) * 100.0,
            text,
            warnings,
        })
    }
}

fn load_model(url: &str, filename: &str) -> Result<Model, OcrError> {
    let path = super::cache_dir().join(filename);
    super::ensure_downloaded(url, &path)?;

    Model::load_file(&path).map_err(|e| {
        OcrError::InitializationError(format!("Failed to load model {}: {}", filename, e))
    })
}

// ============================================================================
// Confidence scoring heuristics
// ============================================================================

/// Estimate how MRZ-like the recognized text is, 0.0 - 1.0.
///
/// ocrs has no per-character confidence, so the score is built from what a
/// clean TD3 read looks like: two 44-char lines drawn from `[A-Z0-9<]`.
fn mrz_confidence(text: &str) -> f32 {
    let candidates = mrz::extract_candidates(text);
    if candidates.is_empty() {
        return 0.0;
    }

    let tail = &candidates[candidates.len().saturating_sub(2)..];
    let alphabet = tail.iter().map(|l| alphabet_score(l)).sum::<f32>() / tail.len() as f32;
    let length = tail.iter().map(|l| length_score(l)).sum::<f32>() / tail.len() as f32;
    let pair = if tail.len() == 2 { 1.0 } else { 0.4 };

    (0.5 * alphabet + 0.3 * length + 0.2 * pair).clamp(0.0, 1.0)
}

/// Share of characters from the MRZ alphabet
fn alphabet_score(line: &str) -> f32 {
    let total = line.chars().count();
    if total == 0 {
        return 0.0;
    }
    let good = line.chars().filter(|&c| mrz::is_mrz_char(c)).count();
    good as f32 / total as f32
}

/// 1.0 at exactly 44 chars, falling off with every missing or extra char
fn length_score(line: &str) -> f32 {
    let len = line.chars().count() as f32;
    (1.0 - (len - 44.0).abs() / 14.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
    const LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    #[test]
    fn test_no_mrz_scores_zero() {
        assert_eq!(mrz_confidence(""), 0.0);
        assert_eq!(mrz_confidence("The quick brown fox"), 0.0);
    }

    #[test]
    fn test_clean_pair_scores_full() {
        let text = format!("{}\n{}", LINE1, LINE2);
        assert!((mrz_confidence(&text) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_line_scores_lower() {
        let pair = mrz_confidence(&format!("{}\n{}", LINE1, LINE2));
        let single = mrz_confidence(LINE2);
        assert!(single < pair, "Expected {} < {}", single, pair);
    }

    #[test]
    fn test_filler_runs_are_not_penalized() {
        assert_eq!(alphabet_score("<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<"), 1.0);
    }

    #[test]
    fn test_misread_chars_lower_alphabet_score() {
        let score = alphabet_score("P<UTOERIKSS0N«ANNA MARIA<<<<<<<<<<<<<<<<<<<");
        assert!(score < 1.0);
        assert!(score > 0.9);
    }

    #[test]
    fn test_truncated_lines_lower_length_score() {
        assert_eq!(length_score(LINE2), 1.0);
        assert!(length_score(&LINE2[..32]) < 0.2);
    }
}
