//! KYC submission validation

use crate::types::KycData;
use chrono::{Datelike, NaiveDate};

/// Collect every rule the submission breaks; empty means valid.
///
/// Age is `today.year() - birth_year`, a calendar-year approximation that
/// ignores whether the birthday has passed this year.
pub fn validate_kyc_data(data: &KycData, today: NaiveDate, minimum_age_years: i32) -> Vec<String> {
    let mut errors = Vec::new();

    if data.legal_name.trim().is_empty() {
        errors.push("Legal name is required".to_string());
    }

    match data.date_of_birth {
        None => errors.push("Date of birth is required".to_string()),
        Some(dob) => {
            if dob > today {
                errors.push("Date of birth cannot be in the future".to_string());
            }
            if today.year() - dob.year() < minimum_age_years {
                errors.push(format!("Must be at least {} years old", minimum_age_years));
            }
        }
    }

    if data.jurisdiction.trim().is_empty() || data.jurisdiction.chars().count() != 2 {
        errors.push("Valid jurisdiction code required".to_string());
    }

    if data.document_hash.trim().is_empty() {
        errors.push("Document hash is required".to_string());
    }

    errors
}
