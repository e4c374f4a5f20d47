use crate::error::OcrError;
use image::DynamicImage;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use super::steps;

/// Preprocessing preset names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Hand the upload to the engine untouched
    None,
    /// Grayscale only, for clean flatbed scans
    Minimal,
    /// Grayscale, crop to the MRZ band, resize, normalize
    #[default]
    Mrz,
    /// Everything in `Mrz` plus Otsu binarization, for glare and low contrast
    Aggressive,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Minimal => "minimal",
            Self::Mrz => "mrz",
            Self::Aggressive => "aggressive",
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "minimal" => Ok(Self::Minimal),
            "mrz" | "default" => Ok(Self::Mrz),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(format!(
                "unknown preset '{}' (expected none, minimal, mrz or aggressive)",
                other
            )),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: &'static str,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    #[serde(skip)]
    pub image: DynamicImage,
    pub total_time_ms: u64,
    pub preset: &'static str,
    pub steps: Vec<StepTiming>,
}

type Step = fn(DynamicImage) -> Result<DynamicImage, OcrError>;

/// Preprocessing pipeline that applies steps based on preset
pub struct Pipeline {
    preset: Preset,
}

impl Pipeline {
    pub fn new(preset: Preset) -> Self {
        Self { preset }
    }

    fn steps(&self) -> Vec<(&'static str, Step)> {
        let mut plan: Vec<(&'static str, Step)> = Vec::new();

        if self.preset == Preset::None {
            return plan;
        }

        plan.push(("grayscale", steps::grayscale::apply));

        if self.preset == Preset::Minimal {
            return plan;
        }

        plan.push(("mrz_band", steps::mrz_band::apply));
        plan.push(("resize", steps::resize::apply));
        plan.push(("normalize", steps::normalize::apply));

        if self.preset == Preset::Aggressive {
            plan.push(("threshold", steps::threshold::apply));
        }

        plan
    }

    /// Process an image according to the configured preset
    pub fn process(&self, image: DynamicImage) -> Result<PreprocessingResult, OcrError> {
        let start = Instant::now();
        let mut timings = Vec::new();
        let mut img = image;

        for (name, step) in self.steps() {
            let step_start = Instant::now();
            img = step(img)?;
            let time_ms = step_start.elapsed().as_millis() as u64;
            tracing::debug!(step = name, time_ms, "Preprocessing step done");
            timings.push(StepTiming { name, time_ms });
        }

        Ok(PreprocessingResult {
            image: img,
            total_time_ms: start.elapsed().as_millis() as u64,
            preset: self.preset.as_str(),
            steps: timings,
        })
    }
}
