//! `data:` URIs for rendered images.
//!
//! Only the base64 form (`data:<media-type>;base64,<payload>`) is produced and
//! accepted, which is what every image encoder emits.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Errors from parsing or decoding a `data:` URI
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataUriError {
    /// The text does not start with `data:`
    #[error("missing `data:` scheme")]
    MissingScheme,

    /// No `,` separates the header from the payload
    #[error("missing `,` between header and payload")]
    MissingSeparator,

    /// The header has no `;base64` marker
    #[error("only base64 data URIs are supported")]
    NotBase64,

    /// The header has no media type
    #[error("missing media type")]
    MissingMediaType,

    /// The payload is not valid base64
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// A self-contained image reference of the form `data:image/png;base64,...`
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUri {
    media_type: String,
    payload: String,
}

impl DataUri {
    /// Wrap raw bytes, base64-encoding them
    #[must_use]
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            payload: STANDARD.encode(bytes),
        }
    }

    /// Wrap PNG bytes
    #[must_use]
    pub fn png(bytes: &[u8]) -> Self {
        Self::from_bytes("image/png", bytes)
    }

    /// Parse a `data:` URI
    ///
    /// # Errors
    ///
    /// Returns [`DataUriError`] if the text is not a well-formed base64 data URI.
    pub fn parse(text: &str) -> Result<Self, DataUriError> {
        let rest = text.strip_prefix(SCHEME).ok_or(DataUriError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingSeparator)?;
        let media_type = header
            .strip_suffix(BASE64_MARKER)
            .ok_or(DataUriError::NotBase64)?;
        if media_type.is_empty() {
            return Err(DataUriError::MissingMediaType);
        }
        STANDARD
            .decode(payload)
            .map_err(|e| DataUriError::InvalidBase64(e.to_string()))?;

        Ok(Self {
            media_type: media_type.to_string(),
            payload: payload.to_string(),
        })
    }

    /// The media type, e.g. `image/png`
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The base64 text after the comma
    #[must_use]
    pub fn base64_payload(&self) -> &str {
        &self.payload
    }

    /// Decode the payload back into bytes
    ///
    /// # Errors
    ///
    /// Returns [`DataUriError::InvalidBase64`] if the payload is corrupt.
    pub fn decode(&self) -> Result<Vec<u8>, DataUriError> {
        STANDARD
            .decode(&self.payload)
            .map_err(|e| DataUriError::InvalidBase64(e.to_string()))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}{BASE64_MARKER},{}", self.media_type, self.payload)
    }
}

// Payloads can be tens of kilobytes; keep Debug output readable.
impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUri")
            .field("media_type", &self.media_type)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl FromStr for DataUri {
    type Err = DataUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DataUri {
    type Error = DataUriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DataUri> for String {
    fn from(uri: DataUri) -> Self {
        uri.to_string()
    }
}
