use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Accession, CalendarDate, Scale, Ticker, ValidationError};

/// Whether a fact measures a point in time or a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Instant,
    Duration,
}

impl PeriodType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instant => "instant",
            Self::Duration => "duration",
        }
    }
}

/// Raw financial fact as extracted from a filing. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub concept: String,
    pub value: f64,
    pub unit: String,
    /// Period end date (`YYYY-MM-DD`) or a range marker such as `latest`.
    pub period: String,
    pub period_type: PeriodType,
    pub accession: Accession,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dimensions: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub quality_flags: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filed: Option<CalendarDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
}

impl Fact {
    pub fn new(
        concept: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        period: impl Into<String>,
        period_type: PeriodType,
        accession: Accession,
    ) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "value" });
        }

        Ok(Self {
            concept: concept.into(),
            value,
            unit: unit.into(),
            period: period.into(),
            period_type,
            accession,
            dimensions: BTreeMap::new(),
            quality_flags: BTreeSet::new(),
            filed: None,
            form: None,
        })
    }

    pub fn with_filing(mut self, filed: CalendarDate, form: impl Into<String>) -> Self {
        self.filed = Some(filed);
        self.form = Some(form.into());
        self
    }

    pub fn with_dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(key.into(), value.into());
        self
    }

    pub fn with_quality_flag(mut self, flag: impl Into<String>) -> Self {
        self.quality_flags.insert(flag.into());
        self
    }

    /// Period end as a date, when the period is a concrete `YYYY-MM-DD`.
    pub fn period_end(&self) -> Option<CalendarDate> {
        CalendarDate::parse(&self.period).ok()
    }
}

/// Scale algebra applied during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingApplied {
    pub source_scale: Scale,
    pub source_factor: f64,
    pub target_scale: Scale,
    pub target_factor: f64,
}

/// Currency conversion provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxConversion {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub asof: CalendarDate,
}

/// Normalization audit trail. When `fx_conversion` is absent the value
/// reflects scale-only conversion; when `normalization_error` is set the
/// value falls back to the original rather than being silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFact {
    pub original_value: f64,
    pub original_unit: String,
    pub normalized_value: f64,
    pub target_unit: String,
    pub scaling_applied: ScalingApplied,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_conversion: Option<FxConversion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalization_error: Option<String>,
}

impl NormalizedFact {
    pub fn fx_applied(&self) -> bool {
        self.fx_conversion.is_some()
    }
}

/// Reproducibility contract attached to every fact-bearing response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    pub accession: Accession,
    pub url: String,
    pub concept: String,
    pub unit: String,
    pub scale: Scale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx_used: Option<FxConversion>,
    pub amended: bool,
    pub as_reported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filed: Option<CalendarDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
}

/// Normalized fact with citation, the result shape of store lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactSnapshot {
    pub ticker: Ticker,
    pub metric: String,
    pub value: f64,
    pub unit: String,
    pub period: String,
    pub citation: Citation,
    pub normalization: NormalizedFact,
}
