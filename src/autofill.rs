//! Mapping a scanned passport onto traveler form fields
//!
//! The form itself lives client-side; this produces the list of field
//! writes the client should apply, given the values it currently holds.

use crate::mrz::{MrzError, PassportRecord, Sex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PASSPORT_NUMBER: &str = "personalInfo.passport.number";
pub const CONFIRM_PASSPORT_NUMBER: &str = "personalInfo.passport.confirmNumber";
pub const NATIONALITY: &str = "personalInfo.passport.nationality";
pub const BIRTH_DATE: &str = "personalInfo.birthDate";
pub const EXPIRY_DATE: &str = "personalInfo.passport.expiryDate";
pub const SEX: &str = "personalInfo.sex";
pub const FIRST_NAME: &str = "personalInfo.firstName";
pub const LAST_NAME: &str = "personalInfo.lastName";

/// Current form values keyed by field path
pub type FormValues = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub path: String,
    pub value: String,
}

/// Ordered field writes produced from one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormPatch {
    pub updates: Vec<FieldUpdate>,
}

impl FormPatch {
    pub fn get(&self, path: &str) -> Option<&str> {
        self.updates
            .iter()
            .find(|u| u.path == path)
            .map(|u| u.value.as_str())
    }

    fn set(&mut self, path: String, value: &str) {
        self.updates.push(FieldUpdate {
            path,
            value: value.to_string(),
        });
    }
}

/// Join a field name to an optional prefix such as `travelers[1]`
pub fn field_path(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{}.{}", p, name),
        _ => name.to_string(),
    }
}

/// Build the field writes for a scanned record.
///
/// Passport fields are always overwritten. Names are only written into
/// fields the traveler has left blank, and `Sex::Unspecified` writes
/// nothing. Invalid records are refused.
pub fn apply(
    record: &PassportRecord,
    current: &FormValues,
    prefix: Option<&str>,
) -> Result<FormPatch, MrzError> {
    if !record.is_valid {
        return Err(MrzError::Invalid(Box::new(record.clone())));
    }

    let path = |name: &str| field_path(prefix, name);
    let is_blank = |name: &str| {
        current
            .get(&path(name))
            .map_or(true, |v: &String| v.trim().is_empty())
    };

    let mut patch = FormPatch::default();
    patch.set(path(PASSPORT_NUMBER), &record.passport_number);
    patch.set(path(CONFIRM_PASSPORT_NUMBER), &record.passport_number);
    patch.set(path(NATIONALITY), &record.nationality);
    patch.set(path(BIRTH_DATE), &record.birth_date);
    patch.set(path(EXPIRY_DATE), &record.expiry_date);

    if record.sex != Sex::Unspecified {
        patch.set(path(SEX), record.sex.as_str());
    }

    if !record.given_names.is_empty() && is_blank(FIRST_NAME) {
        patch.set(path(FIRST_NAME), &record.given_names);
    }

    if !record.surname.is_empty() && is_blank(LAST_NAME) {
        patch.set(path(LAST_NAME), &record.surname);
    }

    Ok(patch)
}
