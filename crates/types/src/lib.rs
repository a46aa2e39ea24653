//! Validated scalar types shared across the HIS crates.
//!
//! Each type here checks its invariant once at construction (or deserialisation) so that
//! downstream code can rely on it without re-validating.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input is not a syntactically valid email address
    #[error("Invalid email address")]
    InvalidEmail,
    /// The input is not a 10-digit mobile number
    #[error("Mobile number must be 10 digits")]
    InvalidMobile,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, utoipa::ToSchema)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters (not bytes) in the text.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A lowercased email address with a minimal syntactic check.
///
/// The check is deliberately shallow: one `@`, a non-empty local part, and a domain
/// containing a dot that neither starts nor ends the domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, utoipa::ToSchema)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and normalises an email address.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::InvalidEmail`] otherwise.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }

        let lowered = trimmed.to_ascii_lowercase();
        let (local, domain) = lowered.split_once('@').ok_or(TextError::InvalidEmail)?;

        let domain_ok = !domain.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');

        if local.is_empty() || !domain_ok || lowered.chars().any(char::is_whitespace) {
            return Err(TextError::InvalidEmail);
        }

        Ok(Self(lowered))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for EmailAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for EmailAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EmailAddress::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A 10-digit mobile number.
///
/// Accepts an optional `+91` or leading `0` trunk prefix and strips spaces and hyphens; the
/// stored value is always the bare 10 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, utoipa::ToSchema)]
pub struct MobileNumber(String);

impl MobileNumber {
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::InvalidMobile`] when the
    /// remaining digits are not exactly ten.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let compact: String = input
            .as_ref()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if compact.is_empty() {
            return Err(TextError::Empty);
        }

        let digits = compact
            .strip_prefix("+91")
            .or_else(|| (compact.len() == 11).then(|| compact.strip_prefix('0')).flatten())
            .unwrap_or(&compact);

        if digits.len() != 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TextError::InvalidMobile);
        }

        Ok(Self(digits.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for MobileNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for MobileNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MobileNumber::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims() {
        let text = NonEmptyText::new("  Ward A  ").expect("should accept padded text");
        assert_eq!(text.as_str(), "Ward A");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn test_non_empty_text_deserialize_rejects_empty() {
        let err = serde_json::from_str::<NonEmptyText>("\"\"").expect_err("empty should fail");
        assert!(err.to_string().contains("Text cannot be empty"));
    }

    #[test]
    fn test_email_is_lowercased() {
        let email = EmailAddress::parse(" Dr.Rao@Example.ORG ").expect("valid email");
        assert_eq!(email.as_str(), "dr.rao@example.org");
    }

    #[test]
    fn test_email_rejects_malformed() {
        for bad in ["rao", "rao@", "@example.org", "rao@example", "rao@.org", "a b@x.org"] {
            assert_eq!(
                EmailAddress::parse(bad),
                Err(TextError::InvalidEmail),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_mobile_strips_country_code() {
        let mobile = MobileNumber::parse("+91 98765-43210").expect("valid mobile");
        assert_eq!(mobile.as_str(), "9876543210");
    }

    #[test]
    fn test_mobile_strips_trunk_zero() {
        let mobile = MobileNumber::parse("09876543210").expect("valid mobile");
        assert_eq!(mobile.as_str(), "9876543210");
    }

    #[test]
    fn test_mobile_rejects_short_numbers() {
        assert_eq!(MobileNumber::parse("12345"), Err(TextError::InvalidMobile));
        assert_eq!(MobileNumber::parse("98765abcde"), Err(TextError::InvalidMobile));
    }
}
