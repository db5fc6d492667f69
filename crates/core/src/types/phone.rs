//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone cannot be empty")]
    Empty,
    /// The input contains a character that is not a digit or separator.
    #[error("phone contains invalid character '{0}'")]
    InvalidCharacter(char),
    /// Too few or too many digits.
    #[error("phone must have between {min} and {max} digits (got {got})")]
    DigitCount {
        /// Minimum digits.
        min: usize,
        /// Maximum digits.
        max: usize,
        /// Digits found.
        got: usize,
    },
}

/// A phone number in compact international form (e.g. `+573001234567`).
///
/// Spaces, dashes, dots and parentheses are stripped on parse so the same
/// number always compares equal; the optional leading `+` is kept.
///
/// ## Constraints
///
/// - 7-15 digits (E.164 allows at most 15)
/// - Only digits, separators, and a single leading `+`
///
/// ## Examples
///
/// ```
/// use skybox_core::Phone;
///
/// let phone = Phone::parse("+57 300 123-4567").unwrap();
/// assert_eq!(phone.as_str(), "+573001234567");
///
/// assert!(Phone::parse("").is_err());
/// assert!(Phone::parse("call me").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 7;
    /// Maximum number of digits (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a `Phone` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains letters or symbols
    /// other than separators, or has a digit count outside 7-15.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        let mut normalized = String::with_capacity(s.len());
        for (i, c) in s.chars().enumerate() {
            match c {
                '0'..='9' => normalized.push(c),
                '+' if i == 0 => normalized.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        let digits = normalized.chars().filter(char::is_ascii_digit).count();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits) {
            return Err(PhoneError::DigitCount {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
                got: digits,
            });
        }

        Ok(Self(normalized))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The address used for WhatsApp delivery (`whatsapp:+57...`).
    #[must_use]
    pub fn whatsapp_address(&self) -> String {
        format!("whatsapp:{}", self.0)
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
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

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Phone {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Phone {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Phone {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_separators() {
        let phone = Phone::parse(" +57 (300) 123-45.67 ").unwrap();
        assert_eq!(phone.as_str(), "+573001234567");
    }

    #[test]
    fn test_parse_without_plus() {
        assert_eq!(Phone::parse("3001234567").unwrap().as_str(), "3001234567");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Phone::parse("   "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_parse_rejects_letters() {
        assert_eq!(
            Phone::parse("+57 300 abc"),
            Err(PhoneError::InvalidCharacter('a'))
        );
    }

    #[test]
    fn test_parse_rejects_inner_plus() {
        assert_eq!(
            Phone::parse("57+3001234567"),
            Err(PhoneError::InvalidCharacter('+'))
        );
    }

    #[test]
    fn test_parse_digit_bounds() {
        assert!(matches!(
            Phone::parse("12345"),
            Err(PhoneError::DigitCount { got: 5, .. })
        ));
        assert!(matches!(
            Phone::parse("1234567890123456"),
            Err(PhoneError::DigitCount { got: 16, .. })
        ));
    }

    #[test]
    fn test_whatsapp_address() {
        let phone = Phone::parse("+573001234567").unwrap();
        assert_eq!(phone.whatsapp_address(), "whatsapp:+573001234567");
    }
}
