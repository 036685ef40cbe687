use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_BOOKMAKER_LEN: usize = 32;

/// Normalized bookmaker identifier, e.g. `sportybet` or `betpawa_gh`.
///
/// Bookmakers are configuration-driven, so this is an open set rather than a
/// closed enum; the identifier is the unit of fallback-chain scoping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookmakerId(String);

impl BookmakerId {
    /// Parse and normalize an identifier to lowercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyBookmaker);
        }

        let normalized = trimmed.to_ascii_lowercase();
        let len = normalized.chars().count();
        if len > MAX_BOOKMAKER_LEN {
            return Err(ValidationError::BookmakerTooLong {
                len,
                max: MAX_BOOKMAKER_LEN,
            });
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_alphanumeric() || ch == '_' || ch == '-';
            if !valid {
                return Err(ValidationError::BookmakerInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BookmakerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookmakerId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for BookmakerId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for BookmakerId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<BookmakerId> for String {
    fn from(value: BookmakerId) -> Self {
        value.0
    }
}
