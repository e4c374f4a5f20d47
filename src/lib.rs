//! Passport MRZ scanning: OCR an uploaded data page, decode the TD3 machine
//! readable zone, and map the result onto traveler form fields.

pub mod autofill;
pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod mrz;
pub mod nationality;
pub mod preprocessing;
pub mod server;

pub use engine::{OcrEngine, Recognition};
pub use error::OcrError;
pub use mrz::{decode, scan, MrzError, PassportRecord, Sex};
