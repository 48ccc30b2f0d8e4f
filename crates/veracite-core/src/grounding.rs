//! Numeric claim verification against time-series evidence.
//!
//! Claims extracted from generated text are checked against authoritative
//! series before the text reaches a user. Verification outcomes are values,
//! not errors: an unsupported claim is ordinary business traffic and comes
//! back as `Evidence { supported: false, .. }` with a reason in `details`.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{CalendarDate, Frequency, ValidationError};

/// Comparison requested by a numeric claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimOperator {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "change")]
    Change,
    #[serde(rename = "yoy")]
    YearOverYear,
    #[serde(rename = "qoq")]
    QuarterOverQuarter,
}

impl ClaimOperator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::Change => "change",
            Self::YearOverYear => "yoy",
            Self::QuarterOverQuarter => "qoq",
        }
    }
}

impl Display for ClaimOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimOperator {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "=" => Ok(Self::Equal),
            "<" => Ok(Self::LessThan),
            "<=" => Ok(Self::LessOrEqual),
            ">" => Ok(Self::GreaterThan),
            ">=" => Ok(Self::GreaterOrEqual),
            "change" => Ok(Self::Change),
            "yoy" => Ok(Self::YearOverYear),
            "qoq" => Ok(Self::QuarterOverQuarter),
            other => Err(ValidationError::InvalidOperator {
                value: other.to_owned(),
            }),
        }
    }
}

/// Ordered (date, value) series for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    series_id: String,
    frequency: Frequency,
    points: Vec<(CalendarDate, f64)>,
}

impl TimeSeries {
    /// Build a series; dates must be strictly ascending (no duplicates).
    /// An empty series is valid but unverifiable.
    pub fn new(
        series_id: impl Into<String>,
        frequency: Frequency,
        points: Vec<(CalendarDate, f64)>,
    ) -> Result<Self, ValidationError> {
        for index in 1..points.len() {
            if points[index].0 <= points[index - 1].0 {
                return Err(ValidationError::SeriesNotAscending { index });
            }
        }
        Ok(Self {
            series_id: series_id.into(),
            frequency,
            points,
        })
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn points(&self) -> &[(CalendarDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Insertion point of `target` clamped into `[0, len-1]`.
    fn snap_index(&self, target: CalendarDate) -> usize {
        let insertion = self.points.partition_point(|(date, _)| *date < target);
        insertion.min(self.points.len() - 1)
    }
}

/// One numeric claim proposed by generated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericClaim {
    pub id: String,
    /// Series reference resolved against `series_id`.
    pub metric: String,
    pub operator: ClaimOperator,
    pub value: f64,
    /// Anchor date; the series' last date is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<CalendarDate>,
    /// Accepted for `change` claims but not used to pick a day distance:
    /// the comparison is always against the immediately preceding sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<u32>,
}

impl NumericClaim {
    pub fn new(
        id: impl Into<String>,
        metric: impl Into<String>,
        operator: ClaimOperator,
        value: f64,
    ) -> Self {
        Self {
            id: id.into(),
            metric: metric.into(),
            operator,
            value,
            at: None,
            window: None,
        }
    }

    pub fn anchored_at(mut self, at: CalendarDate) -> Self {
        self.at = Some(at);
        self
    }

    pub fn with_window(mut self, window: u32) -> Self {
        self.window = Some(window);
        self
    }
}

/// Per-claim verification outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub claim_id: String,
    pub supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_series: Option<String>,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
}

impl Evidence {
    pub fn reason(&self) -> Option<&str> {
        self.details.get("reason").and_then(Value::as_str)
    }
}

/// Checks numeric claims against time-series evidence.
#[derive(Debug, Clone, Copy)]
pub struct ClaimVerifier {
    /// Absolute tolerance for `=` and `change` comparisons.
    pub abs_tolerance: f64,
    /// Tolerance on yoy/qoq percentages (0.05 = five basis points).
    pub pct_tolerance: f64,
}

impl Default for ClaimVerifier {
    fn default() -> Self {
        Self {
            abs_tolerance: 1e-9,
            pct_tolerance: 0.05,
        }
    }
}

impl ClaimVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify a single claim against one series.
    pub fn verify_claim(&self, claim: &NumericClaim, series: &TimeSeries) -> Evidence {
        if series.is_empty() {
            return Evidence {
                claim_id: claim.id.clone(),
                supported: false,
                source_series: Some(series.series_id().to_owned()),
                details: BTreeMap::from([("reason".to_owned(), json!("empty_series"))]),
            };
        }

        let target = claim
            .at
            .unwrap_or_else(|| series.points()[series.len() - 1].0);
        let index = series.snap_index(target);
        let (snapped_date, snapped_value) = series.points()[index];

        let mut details = BTreeMap::from([
            ("at".to_owned(), json!(snapped_date.format_iso())),
            ("value".to_owned(), json!(snapped_value)),
        ]);

        match claim.operator {
            ClaimOperator::Equal
            | ClaimOperator::LessThan
            | ClaimOperator::LessOrEqual
            | ClaimOperator::GreaterThan
            | ClaimOperator::GreaterOrEqual => {
                let supported = match claim.operator {
                    ClaimOperator::Equal => (snapped_value - claim.value).abs() < self.abs_tolerance,
                    ClaimOperator::LessThan => snapped_value < claim.value,
                    ClaimOperator::LessOrEqual => snapped_value <= claim.value,
                    ClaimOperator::GreaterThan => snapped_value > claim.value,
                    _ => snapped_value >= claim.value,
                };
                Evidence {
                    claim_id: claim.id.clone(),
                    supported,
                    source_series: Some(series.series_id().to_owned()),
                    details,
                }
            }
            ClaimOperator::Change => {
                let previous_index = index.saturating_sub(1);
                let (previous_date, previous_value) = series.points()[previous_index];
                let change = snapped_value - previous_value;
                details.insert("prev_at".to_owned(), json!(previous_date.format_iso()));
                details.insert("prev".to_owned(), json!(previous_value));
                details.insert("change".to_owned(), json!(change));
                Evidence {
                    claim_id: claim.id.clone(),
                    supported: (change - claim.value).abs() < self.abs_tolerance,
                    source_series: Some(series.series_id().to_owned()),
                    details,
                }
            }
            ClaimOperator::YearOverYear => self.verify_periodic(
                claim,
                series,
                index,
                series.frequency().yoy_step(),
                "invalid_frequency_for_yoy",
                &["M", "Q", "A"],
                details,
            ),
            ClaimOperator::QuarterOverQuarter => self.verify_periodic(
                claim,
                series,
                index,
                series.frequency().qoq_step(),
                "invalid_frequency_for_qoq",
                &["M", "Q"],
                details,
            ),
        }
    }

    /// Verify every claim, resolving metrics against the supplied series.
    /// The aggregate flag is the logical AND over all per-claim outcomes.
    pub fn ground_claims(
        &self,
        claims: &[NumericClaim],
        series: &[TimeSeries],
    ) -> (Vec<Evidence>, bool) {
        let by_id: HashMap<&str, &TimeSeries> = series
            .iter()
            .map(|entry| (entry.series_id(), entry))
            .collect();

        let mut evidence = Vec::with_capacity(claims.len());
        let mut all_supported = true;
        for claim in claims {
            let outcome = match by_id.get(claim.metric.as_str()) {
                Some(matched) => self.verify_claim(claim, matched),
                None => Evidence {
                    claim_id: claim.id.clone(),
                    supported: false,
                    source_series: None,
                    details: BTreeMap::from([
                        ("reason".to_owned(), json!("series_not_found")),
                        ("metric".to_owned(), json!(claim.metric)),
                    ]),
                },
            };
            all_supported = all_supported && outcome.supported;
            evidence.push(outcome);
        }

        (evidence, all_supported)
    }

    #[allow(clippy::too_many_arguments)]
    fn verify_periodic(
        &self,
        claim: &NumericClaim,
        series: &TimeSeries,
        index: usize,
        step: Option<usize>,
        frequency_reason: &str,
        required_frequencies: &[&str],
        mut details: BTreeMap<String, Value>,
    ) -> Evidence {
        let Some(step) = step else {
            return Evidence {
                claim_id: claim.id.clone(),
                supported: false,
                source_series: Some(series.series_id().to_owned()),
                details: BTreeMap::from([
                    ("reason".to_owned(), json!(frequency_reason)),
                    ("freq".to_owned(), json!(series.frequency().as_str())),
                    ("required".to_owned(), json!(required_frequencies)),
                ]),
            };
        };

        if index < step {
            return Evidence {
                claim_id: claim.id.clone(),
                supported: false,
                source_series: Some(series.series_id().to_owned()),
                details: BTreeMap::from([
                    ("reason".to_owned(), json!("insufficient_historical_data")),
                    ("required_periods".to_owned(), json!(step)),
                    ("available".to_owned(), json!(index)),
                ]),
            };
        }

        let (snapped_date, snapped_value) = series.points()[index];
        let (previous_date, previous_value) = series.points()[index - step];
        let pct = if previous_value != 0.0 {
            Some((snapped_value / previous_value - 1.0) * 100.0)
        } else {
            None
        };

        details.insert("prev_at".to_owned(), json!(previous_date.format_iso()));
        details.insert("prev".to_owned(), json!(previous_value));
        details.insert("pct".to_owned(), json!(pct));
        details.insert("snapped_date".to_owned(), json!(snapped_date.format_iso()));

        let supported = pct
            .map(|pct| (pct - claim.value).abs() <= self.pct_tolerance)
            .unwrap_or(false);

        Evidence {
            claim_id: claim.id.clone(),
            supported,
            source_series: Some(series.series_id().to_owned()),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> CalendarDate {
        CalendarDate::parse(raw).expect("date")
    }

    fn quarterly(points: &[(&str, f64)]) -> TimeSeries {
        TimeSeries::new(
            "AAPL.revenue",
            Frequency::Quarterly,
            points
                .iter()
                .map(|(raw, value)| (date(raw), *value))
                .collect(),
        )
        .expect("series")
    }

    #[test]
    fn parses_operator_tokens() {
        assert_eq!("<=".parse::<ClaimOperator>().expect("op"), ClaimOperator::LessOrEqual);
        assert_eq!("yoy".parse::<ClaimOperator>().expect("op"), ClaimOperator::YearOverYear);
        assert!(matches!(
            "between".parse::<ClaimOperator>(),
            Err(ValidationError::InvalidOperator { .. })
        ));
    }

    #[test]
    fn rejects_unsorted_series() {
        let err = TimeSeries::new(
            "s",
            Frequency::Quarterly,
            vec![(date("2024-06-30"), 1.0), (date("2024-03-31"), 2.0)],
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::SeriesNotAscending { index: 1 }));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = TimeSeries::new(
            "s",
            Frequency::Quarterly,
            vec![(date("2024-03-31"), 1.0), (date("2024-03-31"), 2.0)],
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::SeriesNotAscending { .. }));
    }

    #[test]
    fn snaps_anchor_between_samples_to_insertion_point() {
        let series = quarterly(&[("2024-03-31", 100.0), ("2024-06-30", 110.0)]);
        assert_eq!(series.snap_index(date("2024-05-01")), 1);
        assert_eq!(series.snap_index(date("2023-01-01")), 0);
        assert_eq!(series.snap_index(date("2025-01-01")), 1);
    }

    #[test]
    fn empty_series_is_valid_but_unverifiable() {
        let series = TimeSeries::new("s", Frequency::Monthly, Vec::new()).expect("series");
        let claim = NumericClaim::new("c1", "s", ClaimOperator::Equal, 1.0);
        let evidence = ClaimVerifier::new().verify_claim(&claim, &series);
        assert!(!evidence.supported);
        assert_eq!(evidence.reason(), Some("empty_series"));
    }

    #[test]
    fn zero_prior_value_yields_undefined_percentage() {
        let series = quarterly(&[
            ("2023-12-31", 0.0),
            ("2024-03-31", 10.0),
        ]);
        let claim = NumericClaim::new("c1", "AAPL.revenue", ClaimOperator::QuarterOverQuarter, 5.0);
        let evidence = ClaimVerifier::new().verify_claim(&claim, &series);
        assert!(!evidence.supported);
        assert_eq!(evidence.details.get("pct"), Some(&Value::Null));
    }
}
