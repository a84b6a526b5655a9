//! Order tracking numbers.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters a generated tracking number is drawn from.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Errors that can occur when parsing a [`TrackingNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingNumberError {
    /// Wrong number of characters.
    #[error("tracking number must be exactly {expected} characters")]
    Length {
        /// Required length.
        expected: usize,
    },
    /// Contains something other than uppercase ASCII letters and digits.
    #[error("tracking number may only contain uppercase letters and digits")]
    InvalidCharacter,
}

/// A 10-character uppercase alphanumeric order identifier.
///
/// Distinct from the order's primary key; safe to hand to customers and
/// carriers. Uniqueness is enforced by storage, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Length of every tracking number.
    pub const LENGTH: usize = 10;

    /// Generate a fresh random tracking number.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let value = (0..Self::LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..ALPHABET.len());
                char::from(ALPHABET.get(idx).copied().unwrap_or(b'0'))
            })
            .collect();
        Self(value)
    }

    /// Parse a client- or database-supplied tracking number.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is exactly ten uppercase letters or
    /// digits.
    pub fn parse(s: &str) -> Result<Self, TrackingNumberError> {
        if s.len() != Self::LENGTH {
            return Err(TrackingNumberError::Length {
                expected: Self::LENGTH,
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(TrackingNumberError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the tracking number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TrackingNumber {
    type Error = TrackingNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TrackingNumber> for String {
    fn from(value: TrackingNumber) -> Self {
        value.0
    }
}
