use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Filing accession number, the identifier that pins a fact to one exact
/// as-filed version. Format: ten digits, dash, two digits, dash, six digits
/// (`0000320193-24-000006`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Accession(String);

impl Accession {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if Self::is_valid(trimmed) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(ValidationError::InvalidAccessionFormat {
                value: input.to_owned(),
            })
        }
    }

    /// Checks the `NNNNNNNNNN-NN-NNNNNN` shape without allocating.
    pub fn is_valid(input: &str) -> bool {
        let bytes = input.as_bytes();
        if bytes.len() != 20 {
            return false;
        }
        bytes.iter().enumerate().all(|(index, byte)| match index {
            10 | 13 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Accession {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Accession {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Accession {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Accession> for String {
    fn from(value: Accession) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_format() {
        let parsed = Accession::parse("0000320193-24-000006").expect("must parse");
        assert_eq!(parsed.as_str(), "0000320193-24-000006");
    }

    #[test]
    fn rejects_wrong_group_lengths() {
        assert!(!Accession::is_valid("000032019-24-000006"));
        assert!(!Accession::is_valid("0000320193-240-00006"));
        assert!(!Accession::is_valid("0000320193-24-0000067"));
    }

    #[test]
    fn rejects_non_digits_and_misplaced_dashes() {
        assert!(!Accession::is_valid("0000x20193-24-000006"));
        assert!(!Accession::is_valid("0000320193_24_000006"));
        assert!(matches!(
            Accession::parse("not-an-accession"),
            Err(ValidationError::InvalidAccessionFormat { .. })
        ));
    }
}
