//! Canonical resource identifiers.

use crate::{RandomError, RandomResult};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Kindling's canonical record identifier (hyphenated lowercase UUID).
///
/// This wrapper type guarantees that once constructed, the contained identifier is in canonical
/// form. It is used for durable identifiers assigned at record construction time and for the
/// transport-local identifiers that replace them in anonymised bundles.
///
/// # Construction
/// - [`SeededRandom::resource_id`](crate::SeededRandom::resource_id) mints a reproducible
///   identifier from the run's random stream.
/// - [`ResourceId::parse`] validates an externally supplied identifier.
///
/// # Display format
/// When displayed or converted to string, `ResourceId` always produces the 36-character
/// hyphenated lowercase form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Builds an identifier from 16 raw bytes.
    ///
    /// The version and variant bits are overwritten so the result is a well-formed RFC 4122
    /// version 4 UUID. Everything else comes straight from `bytes`.
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Validates and parses an identifier string that must already be canonical.
    ///
    /// This does **not** normalise other common UUID forms (uppercase, braced, simple).
    ///
    /// # Errors
    ///
    /// Returns [`RandomError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> RandomResult<Self> {
        if !Self::is_canonical(input) {
            return Err(RandomError::InvalidInput(format!(
                "identifier must be a lowercase hyphenated UUID, got: '{}'",
                input
            )));
        }

        Uuid::parse_str(input).map(Self).map_err(|e| {
            RandomError::InvalidInput(format!("identifier '{}' is not a UUID: {}", input, e))
        })
    }

    /// Returns true if `input` is a lowercase hyphenated UUID.
    ///
    /// This is a purely syntactic check and can be used for pre-validation before calling
    /// [`parse`](Self::parse).
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 36
            && input.bytes().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => b == b'-',
                _ => matches!(b, b'0'..=b'9' | b'a'..=b'f'),
            })
    }

    /// Returns the first eight hex characters, used for short registry-style identifiers.
    pub fn short(&self) -> String {
        self.to_string()[..8].to_string()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ResourceId {
    type Err = RandomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceId::parse(&s).map_err(serde::de::Error::custom)
    }
}
