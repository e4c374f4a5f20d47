//! TD3 passport MRZ decoding
//!
//! Locates the two-line Machine Readable Zone in raw OCR output and decodes
//! it into a [`PassportRecord`]. Everything here is pure: no I/O, no state,
//! safe to call from any number of threads at once.
//!
//! Line layout (TD3, 44 chars per line):
//!
//! ```text
//! P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<
//! L898902C36UTO7408122F1204159ZE184226B<<<<<10
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum length for a line to be considered part of an MRZ
pub const MIN_LINE_LENGTH: usize = 30;

/// Confidence assigned when the OCR engine reported none
pub const NOMINAL_CONFIDENCE: f32 = 0.85;

const FILLER: char = '<';
const NAME_SEPARATOR: &str = "<<";

/// Why a scan did not produce usable passport data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MrzError {
    #[error("No machine readable zone found in the recognized text")]
    NotFound,

    #[error("Machine readable zone found but its fields are incomplete")]
    Invalid(Box<PassportRecord>),
}

impl MrzError {
    /// Message shown to the traveler when asking for a better photo
    pub fn user_message(&self) -> &'static str {
        "Could not read passport data. Please ensure the image is clear and shows \
         the Machine Readable Zone (MRZ) at the bottom of the passport page."
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unspecified,
}

impl Sex {
    pub fn from_mrz(c: char) -> Self {
        match c {
            'F' => Self::Female,
            'M' => Self::Male,
            _ => Self::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Unspecified => "UNSPECIFIED",
        }
    }
}

/// Passport fields decoded from one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassportRecord {
    pub passport_number: String,
    pub nationality: String,
    /// `YYYY-MM-DD`, or empty when the raw date did not parse
    pub birth_date: String,
    /// `YYYY-MM-DD`, or empty when the raw date did not parse
    pub expiry_date: String,
    pub sex: Sex,
    pub given_names: String,
    pub surname: String,
    pub is_valid: bool,
    /// 0.0 - 1.0
    pub confidence: f32,
}

/// Decode the MRZ contained in `text`, if any.
///
/// Returns `None` when no MRZ pair can be located or a fixed offset falls
/// outside the located lines. A returned record may still have
/// `is_valid == false`; use [`scan`] to treat that as a failure.
pub fn decode(text: &str) -> Option<PassportRecord> {
    let candidates = extract_candidates(text);
    if candidates.len() < 2 {
        tracing::debug!(candidates = candidates.len(), "Not enough MRZ candidate lines");
        return None;
    }

    let line1 = candidates[candidates.len() - 2];
    let line2 = candidates[candidates.len() - 1];
    if char_len(line1) < MIN_LINE_LENGTH || char_len(line2) < MIN_LINE_LENGTH {
        return None;
    }

    tracing::debug!(line1, line2, "Selected MRZ pair");

    let name_line = decode_name_line(line1)?;
    let data_line = decode_data_line(line2)?;

    let birth_date = parse_date(data_line.birth_date_raw);
    let expiry_date = parse_date(data_line.expiry_date_raw);

    let is_valid = data_line.passport_number.len() >= 6
        && name_line.nationality.len() == 3
        && birth_date.len() == 10
        && expiry_date.len() == 10;

    Some(PassportRecord {
        passport_number: data_line.passport_number,
        nationality: name_line.nationality,
        birth_date,
        expiry_date,
        sex: data_line.sex,
        given_names: name_line.given_names,
        surname: name_line.surname,
        is_valid,
        confidence: NOMINAL_CONFIDENCE,
    })
}

/// Decode and insist on a valid record, rescaling the engine's 0-100
/// confidence onto the record.
pub fn scan(text: &str, confidence_percent: f32) -> Result<PassportRecord, MrzError> {
    let mut record = decode(text).ok_or(MrzError::NotFound)?;
    record.confidence = (confidence_percent / 100.0).clamp(0.0, 1.0);

    if !record.is_valid {
        return Err(MrzError::Invalid(Box::new(record)));
    }

    Ok(record)
}

/// Split OCR text into lines and keep those shaped like MRZ lines,
/// in document order.
///
/// Each line is trimmed on its own, so an indented MRZ line still counts.
pub fn extract_candidates(text: &str) -> Vec<&str> {
    // `lines()` splits on `\n` and strips a trailing `\r`; lone `\r` is
    // handled by the extra split.
    text.lines()
        .flat_map(|line| line.split('\r'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| is_candidate(line))
        .collect()
}

/// Length in characters, not bytes
fn char_len(line: &str) -> usize {
    line.chars().count()
}

fn is_candidate(line: &str) -> bool {
    char_len(line) >= MIN_LINE_LENGTH
        && (line.starts_with("P<") || line.chars().all(is_mrz_char))
}

pub(crate) fn is_mrz_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == FILLER
}

struct NameLine {
    nationality: String,
    surname: String,
    given_names: String,
}

fn decode_name_line(line: &str) -> Option<NameLine> {
    let nationality = strip_filler(line.get(2..5)?);
    let names = line.get(5..)?;

    let (surname, given_names) = match names.split_once(NAME_SEPARATOR) {
        // Anything after a second separator is filler or OCR noise.
        Some((surname, given)) => (
            surname,
            given.split(NAME_SEPARATOR).next().unwrap_or_default(),
        ),
        None => (names, ""),
    };

    Some(NameLine {
        nationality,
        surname: filler_to_space(surname),
        given_names: filler_to_space(given_names),
    })
}

struct DataLine<'a> {
    passport_number: String,
    birth_date_raw: &'a str,
    sex: Sex,
    expiry_date_raw: &'a str,
}

fn decode_data_line(line: &str) -> Option<DataLine<'_>> {
    // Check digits at 9, 19 and 27 are skipped.
    let passport_number = strip_filler(line.get(0..9)?);
    let birth_date_raw = line.get(13..19)?;
    let sex = line.get(20..21)?.chars().next().map(Sex::from_mrz)?;
    let expiry_date_raw = line.get(21..27)?;

    Some(DataLine {
        passport_number,
        birth_date_raw,
        sex,
        expiry_date_raw,
    })
}

fn strip_filler(s: &str) -> String {
    s.chars().filter(|&c| c != FILLER).collect()
}

fn filler_to_space(s: &str) -> String {
    s.replace(FILLER, " ").trim().to_string()
}

/// Convert an MRZ `YYMMDD` date to `YYYY-MM-DD`.
///
/// Years above 50 are 19xx, the rest 20xx. Month must be 1-12 and day
/// 1-31; the day is not checked against the month. Every one of the six
/// characters must be a digit, so a date with a filler or misread
/// character is never partially read. Anything else yields an empty string.
pub fn parse_date(raw: &str) -> String {
    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return String::new();
    }

    let (Ok(year), Ok(month), Ok(day)) = (
        raw[0..2].parse::<u32>(),
        raw[2..4].parse::<u32>(),
        raw[4..6].parse::<u32>(),
    ) else {
        return String::new();
    };

    let full_year = if year > 50 { 1900 + year } else { 2000 + year };

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return String::new();
    }

    format!("{:04}-{:02}-{:02}", full_year, month, day)
}
