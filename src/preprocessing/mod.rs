//! Image preprocessing for MRZ recognition
//!
//! Presets trade latency for robustness on phone photos of the data page.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, PreprocessingResult, Preset, StepTiming};
