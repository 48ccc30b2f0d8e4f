use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Reporting frequency of a fact series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "D")]
    Daily,
    #[serde(rename = "W")]
    Weekly,
    #[serde(rename = "M")]
    Monthly,
    #[serde(rename = "Q")]
    Quarterly,
    #[serde(rename = "A")]
    Annual,
}

impl Frequency {
    pub const ALL: [Self; 5] = [
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Quarterly,
        Self::Annual,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "D",
            Self::Weekly => "W",
            Self::Monthly => "M",
            Self::Quarterly => "Q",
            Self::Annual => "A",
        }
    }

    /// Samples between a value and its year-ago counterpart, where defined.
    pub const fn yoy_step(self) -> Option<usize> {
        match self {
            Self::Monthly => Some(12),
            Self::Quarterly => Some(4),
            Self::Annual => Some(1),
            Self::Daily | Self::Weekly => None,
        }
    }

    /// Samples between a value and its quarter-ago counterpart, where defined.
    pub const fn qoq_step(self) -> Option<usize> {
        match self {
            Self::Monthly => Some(3),
            Self::Quarterly => Some(1),
            Self::Daily | Self::Weekly | Self::Annual => None,
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "D" => Ok(Self::Daily),
            "W" => Ok(Self::Weekly),
            "M" => Ok(Self::Monthly),
            "Q" => Ok(Self::Quarterly),
            "A" => Ok(Self::Annual),
            other => Err(ValidationError::InvalidFrequency {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frequency_codes() {
        assert_eq!("q".parse::<Frequency>().expect("must parse"), Frequency::Quarterly);
        assert!(matches!(
            "H".parse::<Frequency>(),
            Err(ValidationError::InvalidFrequency { .. })
        ));
    }

    #[test]
    fn yoy_steps_follow_periods_per_year() {
        assert_eq!(Frequency::Monthly.yoy_step(), Some(12));
        assert_eq!(Frequency::Quarterly.yoy_step(), Some(4));
        assert_eq!(Frequency::Annual.yoy_step(), Some(1));
        assert_eq!(Frequency::Daily.yoy_step(), None);
    }

    #[test]
    fn qoq_steps_follow_periods_per_quarter() {
        assert_eq!(Frequency::Monthly.qoq_step(), Some(3));
        assert_eq!(Frequency::Quarterly.qoq_step(), Some(1));
        assert_eq!(Frequency::Annual.qoq_step(), None);
    }
}
