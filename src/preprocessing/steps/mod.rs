//! Individual preprocessing steps

pub mod grayscale;
pub mod mrz_band;
pub mod normalize;
pub mod resize;
pub mod threshold;
