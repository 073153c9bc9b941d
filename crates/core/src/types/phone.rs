//! Brazilian phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone cannot be empty")]
    Empty,
    /// The cleaned number has the wrong number of digits.
    #[error("phone must have 10 or 11 digits, got {got}")]
    InvalidLength {
        /// Number of digits after cleaning.
        got: usize,
    },
}

/// A Brazilian phone number, stored as bare digits (DDD + number).
///
/// Input is cleaned before validation: punctuation and whitespace are
/// stripped, and a leading `55` country code is dropped. What remains must
/// be 10 digits (landline) or 11 digits (mobile).
///
/// The digit form is also the key the client API is addressed by
/// (`GET /clientes/{phone}`), so [`Phone::as_str`] is what goes on the wire.
///
/// ## Examples
///
/// ```
/// use vale_acai_core::Phone;
///
/// let phone = Phone::parse("(12) 99876-5432").unwrap();
/// assert_eq!(phone.as_str(), "12998765432");
/// assert_eq!(phone.formatted(), "(12) 99876-5432");
///
/// // Country code is stripped
/// assert_eq!(Phone::parse("+55 12 99876-5432").unwrap().as_str(), "12998765432");
///
/// assert!(Phone::parse("").is_err());
/// assert!(Phone::parse("1234").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse a `Phone` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or the cleaned number is not
    /// 10 or 11 digits long.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.trim().is_empty() {
            return Err(PhoneError::Empty);
        }

        let mut digits: String = s.chars().filter(char::is_ascii_digit).collect();

        // Drop a leading country code ("+55 ..." input)
        if digits.len() > 11 && digits.starts_with("55") {
            digits.drain(..2);
        }

        match digits.len() {
            10 | 11 => Ok(Self(digits)),
            got => Err(PhoneError::InvalidLength { got }),
        }
    }

    /// Returns the bare digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Human-readable form: `(DD) NNNNN-NNNN`.
    #[must_use]
    pub fn formatted(&self) -> String {
        let (ddd, number) = self.0.split_at(2);
        let (prefix, suffix) = number.split_at(number.len() - 4);
        format!("({ddd}) {prefix}-{suffix}")
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
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
        assert_eq!(Phone::parse("12998765432").unwrap().as_str(), "12998765432");
        assert_eq!(Phone::parse("1233224455").unwrap().as_str(), "1233224455");
        assert_eq!(
            Phone::parse("(12) 99876-5432").unwrap().as_str(),
            "12998765432"
        );
    }

    #[test]
    fn test_parse_strips_country_code() {
        assert_eq!(
            Phone::parse("+55 12 99876-5432").unwrap().as_str(),
            "12998765432"
        );
        assert_eq!(
            Phone::parse("5512998765432").unwrap().as_str(),
            "12998765432"
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Phone::parse(""), Err(PhoneError::Empty)));
        assert!(matches!(Phone::parse("   "), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            Phone::parse("1234"),
            Err(PhoneError::InvalidLength { got: 4 })
        ));
        assert!(matches!(
            Phone::parse("129987654321"),
            Err(PhoneError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_formatted() {
        let mobile = Phone::parse("12998765432").unwrap();
        assert_eq!(mobile.formatted(), "(12) 99876-5432");

        let landline = Phone::parse("1233224455").unwrap();
        assert_eq!(landline.formatted(), "(12) 3322-4455");
    }

    #[test]
    fn test_serde_roundtrip() {
        let phone = Phone::parse("12998765432").unwrap();
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"12998765432\"");

        let parsed: Phone = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, phone);
    }
}
