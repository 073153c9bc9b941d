//! CEP (Brazilian postal code) type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Cep`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum CepError {
    /// The input string is empty.
    #[error("CEP cannot be empty")]
    Empty,
    /// The cleaned code is not exactly 8 digits.
    #[error("CEP must have exactly 8 digits, got {got}")]
    InvalidLength {
        /// Number of digits after cleaning.
        got: usize,
    },
}

/// An 8-digit CEP, stored as bare digits.
///
/// Input is cleaned before validation (the conventional `01310-100` form is
/// accepted). The address lookup only fires once the cleaned input reaches
/// exactly 8 digits, so this type is the gate for that request.
///
/// ## Examples
///
/// ```
/// use vale_acai_core::Cep;
///
/// let cep = Cep::parse("11680-000").unwrap();
/// assert_eq!(cep.as_str(), "11680000");
/// assert_eq!(cep.to_string(), "11680-000");
///
/// assert!(Cep::parse("1168").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cep(String);

impl Cep {
    /// Parse a `Cep` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or the cleaned code is not
    /// exactly 8 digits.
    pub fn parse(s: &str) -> Result<Self, CepError> {
        if s.trim().is_empty() {
            return Err(CepError::Empty);
        }

        let digits: String = s.chars().filter(char::is_ascii_digit).collect();

        if digits.len() == 8 {
            Ok(Self(digits))
        } else {
            Err(CepError::InvalidLength { got: digits.len() })
        }
    }

    /// Returns the bare digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Cep` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, suffix) = self.0.split_at(5);
        write!(f, "{prefix}-{suffix}")
    }
}

impl std::str::FromStr for Cep {
    type Err = CepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Cep {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Cep::parse("11680000").unwrap().as_str(), "11680000");
        assert_eq!(Cep::parse("11680-000").unwrap().as_str(), "11680000");
        assert_eq!(Cep::parse(" 11.680-000 ").unwrap().as_str(), "11680000");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Cep::parse(""), Err(CepError::Empty)));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            Cep::parse("1168"),
            Err(CepError::InvalidLength { got: 4 })
        ));
        assert!(matches!(
            Cep::parse("116800001"),
            Err(CepError::InvalidLength { got: 9 })
        ));
        // Letters are stripped, leaving too few digits
        assert!(matches!(
            Cep::parse("abcdefgh"),
            Err(CepError::InvalidLength { got: 0 })
        ));
    }

    #[test]
    fn test_display() {
        let cep = Cep::parse("11680000").unwrap();
        assert_eq!(cep.to_string(), "11680-000");
    }

    #[test]
    fn test_serde_roundtrip() {
        let cep = Cep::parse("11680-000").unwrap();
        let json = serde_json::to_string(&cep).unwrap();
        assert_eq!(json, "\"11680000\"");

        let parsed: Cep = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cep);
    }
}
