use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Power-of-ten multiplier applied to a raw reported number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scale {
    #[serde(rename = "K")]
    Thousands,
    #[serde(rename = "M")]
    Millions,
    #[serde(rename = "B")]
    Billions,
    #[serde(rename = "T")]
    Trillions,
    #[serde(rename = "U")]
    Units,
}

impl Scale {
    pub const ALL: [Self; 5] = [
        Self::Thousands,
        Self::Millions,
        Self::Billions,
        Self::Trillions,
        Self::Units,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Thousands => "K",
            Self::Millions => "M",
            Self::Billions => "B",
            Self::Trillions => "T",
            Self::Units => "U",
        }
    }

    pub const fn factor(self) -> f64 {
        match self {
            Self::Thousands => 1e3,
            Self::Millions => 1e6,
            Self::Billions => 1e9,
            Self::Trillions => 1e12,
            Self::Units => 1.0,
        }
    }
}

impl Display for Scale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "K" => Ok(Self::Thousands),
            "M" => Ok(Self::Millions),
            "B" => Ok(Self::Billions),
            "T" => Ok(Self::Trillions),
            "U" => Ok(Self::Units),
            other => Err(ValidationError::InvalidScale {
                value: other.to_owned(),
            }),
        }
    }
}
