//! Unit classification and the monetary-expression guard.
//!
//! Before any cross-fact arithmetic (a ratio, a margin), every operand unit
//! must classify as monetary. Classification precedence is an explicit,
//! ordered rule list: monetary vocabulary, then shares, ratio, and pure
//! keywords, with unknown as the fallthrough.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Scale;
use crate::normalize::{canonical_currency, parse_unit, CURRENCY_ALIASES};

const SHARES_TOKENS: &[&str] = &[
    "shares",
    "share",
    "sh",
    "common",
    "preferred",
    "outstanding",
    "issued",
    "authorized",
    "treasury",
];

const RATIO_TOKENS: &[&str] = &[
    "ratio",
    "percent",
    "%",
    "pct",
    "basis_points",
    "bp",
    "multiple",
    "x",
    "times",
];

const PURE_TOKENS: &[&str] = &["pure", "unitless", "count", "number"];

/// Advisory keywords suggesting an expression is monetary.
const MONETARY_EXPRESSION_TOKENS: &[&str] = &[
    "revenue",
    "income",
    "profit",
    "margin",
    "cost",
    "expense",
    "cash",
    "flow",
    "debt",
    "equity",
    "assets",
    "liabilities",
    "earnings",
    "dividend",
    "price",
    "value",
];

/// Closed set of unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitClass {
    Monetary,
    Shares,
    Ratio,
    Pure,
    Unknown,
}

impl UnitClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monetary => "monetary",
            Self::Shares => "shares",
            Self::Ratio => "ratio",
            Self::Pure => "pure",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for UnitClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified unit with extracted currency/scale for monetary units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitClassification {
    pub unit: String,
    pub unit_class: UnitClass,
    pub is_monetary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,
}

fn format_offenders(offenders: &[(String, String)]) -> String {
    offenders
        .iter()
        .map(|(variable, unit)| format!("{variable} ({unit})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Guard violations. Raised synchronously, before any arithmetic runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("non-monetary inputs in monetary expression: {}", format_offenders(.offenders))]
    UnsupportedUnitKind {
        /// Offending (variable, unit) pairs.
        offenders: Vec<(String, String)>,
    },
}

/// One ordered classification rule: first token match wins.
#[derive(Debug, Clone, Copy)]
struct MatchRule {
    class: UnitClass,
    tokens: &'static [&'static str],
}

/// Classifies units and rejects mixed-unit monetary expressions.
///
/// Vocabularies are fixed at construction and read-only afterwards; the
/// guard is freely shareable across tasks.
#[derive(Debug, Clone)]
pub struct UnitGuard {
    rules: Vec<MatchRule>,
}

impl UnitGuard {
    pub fn new() -> Self {
        let monetary_tokens: &'static [&'static str] = {
            // The currency vocabulary doubles as the monetary token set.
            static TOKENS: std::sync::OnceLock<Vec<&'static str>> = std::sync::OnceLock::new();
            TOKENS.get_or_init(|| CURRENCY_ALIASES.iter().map(|(alias, _)| *alias).collect())
        };

        Self {
            rules: vec![
                MatchRule {
                    class: UnitClass::Monetary,
                    tokens: monetary_tokens,
                },
                MatchRule {
                    class: UnitClass::Shares,
                    tokens: SHARES_TOKENS,
                },
                MatchRule {
                    class: UnitClass::Ratio,
                    tokens: RATIO_TOKENS,
                },
                MatchRule {
                    class: UnitClass::Pure,
                    tokens: PURE_TOKENS,
                },
            ],
        }
    }

    /// Classify a unit string; first matching rule wins.
    pub fn classify_unit(&self, unit: &str) -> UnitClassification {
        let trimmed = unit.trim();
        if trimmed.is_empty() {
            return UnitClassification {
                unit: unit.to_owned(),
                unit_class: UnitClass::Unknown,
                is_monetary: false,
                currency: None,
                scale: None,
            };
        }

        let upper = trimmed.to_ascii_uppercase();
        let lower = trimmed.to_ascii_lowercase();

        for rule in &self.rules {
            let haystack = if rule.class == UnitClass::Monetary {
                upper.as_str()
            } else {
                lower.as_str()
            };
            if !rule.tokens.iter().any(|token| haystack.contains(token)) {
                continue;
            }

            let (currency, scale) = if rule.class == UnitClass::Monetary {
                let parsed = parse_unit(trimmed);
                // parse_unit keeps unrecognized strings verbatim; fall back
                // to the first vocabulary token present in the unit.
                let currency = canonical_currency(&parsed.currency)
                    .map(str::to_owned)
                    .or_else(|| {
                        CURRENCY_ALIASES
                            .iter()
                            .find(|(alias, _)| upper.contains(*alias))
                            .map(|(_, code)| (*code).to_owned())
                    });
                (currency, Some(parsed.scale))
            } else {
                (None, None)
            };

            return UnitClassification {
                unit: unit.to_owned(),
                unit_class: rule.class,
                is_monetary: rule.class == UnitClass::Monetary,
                currency,
                scale,
            };
        }

        UnitClassification {
            unit: unit.to_owned(),
            unit_class: UnitClass::Unknown,
            is_monetary: false,
            currency: None,
            scale: None,
        }
    }

    /// Validate that every input to a monetary expression is monetary.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::UnsupportedUnitKind`] enumerating the offending
    /// variable/unit pairs when any input classifies as non-monetary.
    pub fn validate_monetary_expression(
        &self,
        expression: &str,
        input_units: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, UnitClassification>, GuardError> {
        let mut classifications = BTreeMap::new();
        let mut offenders = Vec::new();

        for (variable, unit) in input_units {
            let classification = self.classify_unit(unit);
            if !classification.is_monetary {
                offenders.push((variable.clone(), unit.clone()));
            }
            classifications.insert(variable.clone(), classification);
        }

        if !offenders.is_empty() {
            return Err(GuardError::UnsupportedUnitKind { offenders });
        }

        tracing::debug!(expression, inputs = input_units.len(), "monetary expression validated");
        Ok(classifications)
    }

    /// Advisory keyword pre-check: does this expression look monetary?
    /// Never blocks execution by itself.
    pub fn is_monetary_expression(&self, expression: &str) -> bool {
        let lower = expression.to_ascii_lowercase();
        MONETARY_EXPRESSION_TOKENS
            .iter()
            .any(|token| lower.contains(token))
    }
}

impl Default for UnitGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_monetary_units_with_currency_and_scale() {
        let guard = UnitGuard::new();
        let classified = guard.classify_unit("EUR-M");
        assert_eq!(classified.unit_class, UnitClass::Monetary);
        assert!(classified.is_monetary);
        assert_eq!(classified.currency.as_deref(), Some("EUR"));
        assert_eq!(classified.scale, Some(Scale::Millions));
    }

    #[test]
    fn precedence_is_ordered_first_match_wins() {
        let guard = UnitGuard::new();
        // "USD per share" carries both vocabularies; monetary is checked first.
        assert_eq!(
            guard.classify_unit("USD per share").unit_class,
            UnitClass::Monetary
        );
        assert_eq!(guard.classify_unit("shares").unit_class, UnitClass::Shares);
        assert_eq!(guard.classify_unit("percent").unit_class, UnitClass::Ratio);
        assert_eq!(guard.classify_unit("count").unit_class, UnitClass::Pure);
        assert_eq!(guard.classify_unit("widgets").unit_class, UnitClass::Unknown);
    }

    #[test]
    fn empty_unit_is_unknown() {
        let guard = UnitGuard::new();
        let classified = guard.classify_unit("  ");
        assert_eq!(classified.unit_class, UnitClass::Unknown);
        assert!(!classified.is_monetary);
    }

    #[test]
    fn rejects_non_monetary_inputs_with_offender_list() {
        let guard = UnitGuard::new();
        let inputs = BTreeMap::from([
            ("revenue".to_owned(), "USD".to_owned()),
            ("shares".to_owned(), "shares".to_owned()),
        ]);

        let err = guard
            .validate_monetary_expression("revenue / shares", &inputs)
            .expect_err("must fail");
        let GuardError::UnsupportedUnitKind { offenders } = err;
        assert_eq!(offenders, vec![("shares".to_owned(), "shares".to_owned())]);
    }

    #[test]
    fn advisory_check_never_blocks() {
        let guard = UnitGuard::new();
        assert!(guard.is_monetary_expression("grossProfit = revenue - costOfRevenue"));
        assert!(!guard.is_monetary_expression("beta * correlation"));
    }
}
