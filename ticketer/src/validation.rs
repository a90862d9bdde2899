//! Field validation.
//!
//! Every pass checks every field and produces a complete [`FieldErrors`];
//! there is no incremental validation.

use crate::types::{Field, FieldErrors, Gender, RegistrationForm};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Lowest roll number accepted by default
pub const ROLL_NUMBER_MIN: i64 = 24_126_001;

/// Highest roll number accepted by default
pub const ROLL_NUMBER_MAX: i64 = 24_126_060;

/// Message for an empty first name
pub const FIRST_NAME_REQUIRED: &str = "First name is required";
/// Message for an empty last name
pub const LAST_NAME_REQUIRED: &str = "Last name is required";
/// Message for an empty email
pub const EMAIL_REQUIRED: &str = "Email is required";
/// Message for an empty gender
pub const GENDER_REQUIRED: &str = "Gender is required";
/// Message for a gender outside the offered options, when restricted
pub const GENDER_UNKNOWN: &str = "Gender must be one of: male, female, other";

/// Rules the form is validated against
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRules {
    /// Accepted roll numbers, inclusive
    pub roll_numbers: RangeInclusive<i64>,
    /// Treat whitespace-only text as missing
    pub trim_required: bool,
    /// Only accept the genders the form offers
    #[serde(default)]
    pub restrict_gender: bool,
}

impl Default for FormRules {
    fn default() -> Self {
        Self {
            roll_numbers: ROLL_NUMBER_MIN..=ROLL_NUMBER_MAX,
            trim_required: false,
            restrict_gender: false,
        }
    }
}

impl FormRules {
    /// Validate every field of `form`
    #[must_use]
    pub fn validate(&self, form: &RegistrationForm) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.is_missing(&form.first_name) {
            errors.insert(Field::FirstName, FIRST_NAME_REQUIRED);
        }
        if self.is_missing(&form.last_name) {
            errors.insert(Field::LastName, LAST_NAME_REQUIRED);
        }
        if self.is_missing(&form.email) {
            errors.insert(Field::Email, EMAIL_REQUIRED);
        }
        if self.accepted_roll_number(&form.roll_number).is_none() {
            errors.insert(Field::RollNumber, self.roll_number_message());
        }
        if self.is_missing(&form.gender) {
            errors.insert(Field::Gender, GENDER_REQUIRED);
        } else if self.restrict_gender && form.gender.parse::<Gender>().is_err() {
            errors.insert(Field::Gender, GENDER_UNKNOWN);
        }

        errors
    }

    /// The roll number if `raw` is numeric and inside the accepted range
    #[must_use]
    pub fn accepted_roll_number(&self, raw: &str) -> Option<i64> {
        coerce_roll_number(raw).filter(|n| self.roll_numbers.contains(n))
    }

    /// Message shown for a missing or out-of-range roll number
    #[must_use]
    pub fn roll_number_message(&self) -> String {
        format!(
            "Roll number must be between {} and {}",
            self.roll_numbers.start(),
            self.roll_numbers.end()
        )
    }

    fn is_missing(&self, value: &str) -> bool {
        if self.trim_required {
            value.trim().is_empty()
        } else {
            value.is_empty()
        }
    }
}

/// Every integer up to this magnitude is exact as an `f64`
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Parse a typed roll number, ignoring surrounding whitespace
///
/// Numeric text such as `24126030.0` or `2.412603e7` is accepted when it
/// names a whole number; fractions, `inf` and `NaN` are not.
#[must_use]
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)] // Integral and in range before the cast
pub fn coerce_roll_number(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }

    let n = trimmed.parse::<f64>().ok()?;
    if !n.is_finite() || n.fract() != 0.0 || n.abs() > MAX_EXACT_FLOAT {
        return None;
    }
    Some(n as i64)
}
