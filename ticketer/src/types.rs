//! Domain types for the registration form.
//!
//! The form keeps every text field exactly as typed. Coercion (roll number to
//! an integer, and gender to [`Gender`] when restricted) happens only during
//! validation, so a half-typed value never has to be rejected at input time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use ticketer_core::DataUri;

/// A field of the registration form
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Attendee's first name
    FirstName,
    /// Attendee's last name
    LastName,
    /// Contact email
    Email,
    /// Institutional roll number
    RollNumber,
    /// Gender selection
    Gender,
    /// Optional photo
    Image,
}

impl Field {
    /// Every field, in form order
    pub const ALL: [Self; 6] = [
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::RollNumber,
        Self::Gender,
        Self::Image,
    ];

    /// The form name of the field, e.g. `rollNumber`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::RollNumber => "rollNumber",
            Self::Gender => "gender",
            Self::Image => "image",
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::Email => "Email",
            Self::RollNumber => "Roll Number",
            Self::Gender => "Gender",
            Self::Image => "Image",
        }
    }

    /// Whether the field holds a file rather than text
    #[must_use]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::Image)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for a field name that is not part of the form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown form field: {0:?}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Gender options offered by the form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// `male`
    Male,
    /// `female`
    Female,
    /// `other`
    Other,
}

impl Gender {
    /// Every option, in display order
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    /// The submitted value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a gender value outside the offered options
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown gender: {0:?}")]
pub struct UnknownGender(pub String);

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownGender(s.to_string()))
    }
}

/// A picked image. Held with the form but never encoded into the ticket.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// Name of the picked file
    pub file_name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    /// Create an attachment
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

impl fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Raw input for a single field
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// Typed or selected text
    Text(String),
    /// A picked file, or `None` when the picker was cleared
    File(Option<ImageAttachment>),
}

/// An input that does not fit the field it was sent to
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdateError {
    /// A file was sent to a text field
    #[error("field {0} takes text, not a file")]
    ExpectedText(Field),
    /// Text was sent to the file field
    #[error("field {0} takes a file, not text")]
    ExpectedFile(Field),
}

/// The attendee details as currently entered
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    /// First name as typed
    pub first_name: String,
    /// Last name as typed
    pub last_name: String,
    /// Email as typed (presence is the only check)
    pub email: String,
    /// Roll number as typed; coerced during validation
    pub roll_number: String,
    /// Gender as selected
    pub gender: String,
    /// Optional picked image
    #[serde(skip)]
    pub image: Option<ImageAttachment>,
}

impl RegistrationForm {
    /// Text currently held by `field` (`None` for the image field)
    #[must_use]
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::FirstName => Some(&self.first_name),
            Field::LastName => Some(&self.last_name),
            Field::Email => Some(&self.email),
            Field::RollNumber => Some(&self.roll_number),
            Field::Gender => Some(&self.gender),
            Field::Image => None,
        }
    }

    /// Replace exactly one field, leaving all others untouched
    ///
    /// # Errors
    ///
    /// Returns [`FieldUpdateError`] (and changes nothing) if the value kind
    /// does not match the field.
    pub fn update(&mut self, field: Field, value: FieldValue) -> Result<(), FieldUpdateError> {
        match (field, value) {
            (Field::Image, FieldValue::File(image)) => self.image = image,
            (Field::Image, FieldValue::Text(_)) => return Err(FieldUpdateError::ExpectedFile(field)),
            (_, FieldValue::File(_)) => return Err(FieldUpdateError::ExpectedText(field)),
            (Field::FirstName, FieldValue::Text(text)) => self.first_name = text,
            (Field::LastName, FieldValue::Text(text)) => self.last_name = text,
            (Field::Email, FieldValue::Text(text)) => self.email = text,
            (Field::RollNumber, FieldValue::Text(text)) => self.roll_number = text,
            (Field::Gender, FieldValue::Text(text)) => self.gender = text,
        }
        Ok(())
    }
}

/// Per-field validation messages, at most one per field
///
/// Each validation pass builds a fresh map and replaces the stored one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    /// Empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field`, replacing any earlier one
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    /// The message for `field`, if any
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Whether `field` has a message
    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// Number of fields with messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether every field passed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields with messages, in form order
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    /// `(field, message)` pairs, in form order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Identifies one generate request; later requests have larger ids
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// The id following this one
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw value; `0` means no request has been issued
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The scannable code currently on display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// Request that produced it
    pub request: RequestId,
    /// Text encoded in the image
    pub payload: String,
    /// Rendered image
    pub image: DataUri,
    /// When the result was applied
    pub generated_at: DateTime<Utc>,
}

/// Result of the most recent download
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadOutcome {
    /// The image was written
    Saved {
        /// Where it was written
        path: PathBuf,
    },
    /// Saving failed
    Failed {
        /// User-facing reason
        message: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>(), Ok(field));
        }
        assert_eq!(
            "roll_number".parse::<Field>(),
            Err(UnknownField("roll_number".to_string()))
        );
    }

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("Female".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!(" other ".parse::<Gender>(), Ok(Gender::Other));
        assert!("".parse::<Gender>().is_err());
        assert!("unknown".parse::<Gender>().is_err());
    }

    #[test]
    fn update_replaces_only_the_named_field() {
        let mut form = RegistrationForm {
            first_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            ..RegistrationForm::default()
        };

        form.update(Field::RollNumber, FieldValue::Text(String::new()))
            .unwrap();
        form.update(Field::LastName, FieldValue::Text("Lovelace".to_string()))
            .unwrap();

        assert_eq!(form.first_name, "Ada");
        assert_eq!(form.last_name, "Lovelace");
        assert_eq!(form.email, "ada@example.com");
        assert_eq!(form.roll_number, "");
    }

    #[test]
    fn update_keeps_partial_roll_number_text() {
        let mut form = RegistrationForm::default();
        form.update(Field::RollNumber, FieldValue::Text("2412".to_string()))
            .unwrap();
        assert_eq!(form.roll_number, "2412");
    }

    #[test]
    fn mismatched_value_kind_changes_nothing() {
        let mut form = RegistrationForm::default();
        let image = ImageAttachment::new("me.png", vec![1, 2, 3]);

        assert_eq!(
            form.update(Field::Email, FieldValue::File(Some(image.clone()))),
            Err(FieldUpdateError::ExpectedText(Field::Email))
        );
        assert_eq!(
            form.update(Field::Image, FieldValue::Text("me.png".to_string())),
            Err(FieldUpdateError::ExpectedFile(Field::Image))
        );
        assert_eq!(form, RegistrationForm::default());

        form.update(Field::Image, FieldValue::File(Some(image.clone())))
            .unwrap();
        assert_eq!(form.image, Some(image));
        form.update(Field::Image, FieldValue::File(None)).unwrap();
        assert_eq!(form.image, None);
    }

    #[test]
    fn field_errors_iterate_in_form_order() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::Gender, "Gender is required");
        errors.insert(Field::FirstName, "First name is required");
        errors.insert(Field::Gender, "replaced");

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec![Field::FirstName, Field::Gender]
        );
        assert_eq!(errors.get(Field::Gender), Some("replaced"));
    }

    #[test]
    fn field_errors_serialize_with_form_names() {
        let mut errors = FieldErrors::new();
        errors.insert(Field::RollNumber, "bad");
        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(json, r#"{"rollNumber":"bad"}"#);
    }
}
