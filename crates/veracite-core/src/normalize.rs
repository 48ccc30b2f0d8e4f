//! Unit parsing and scale/currency normalization.
//!
//! A reported unit string like `"EUR-M"` carries both a currency and a
//! power-of-ten scale. Normalization multiplies out the source scale,
//! delegates currency conversion to the [`FxConverter`] collaborator, then
//! divides by the target scale, returning the full audit trail either way.

use std::sync::Arc;

use crate::domain::{CalendarDate, FxConversion, NormalizedFact, Scale, ScalingApplied};
use crate::fx::FxConverter;

/// Currency code and symbol vocabulary, alias to ISO code.
pub(crate) const CURRENCY_ALIASES: &[(&str, &str)] = &[
    ("USD", "USD"),
    ("US$", "USD"),
    ("$", "USD"),
    ("EUR", "EUR"),
    ("€", "EUR"),
    ("GBP", "GBP"),
    ("£", "GBP"),
    ("JPY", "JPY"),
    ("¥", "JPY"),
    ("CAD", "CAD"),
    ("C$", "CAD"),
    ("AUD", "AUD"),
    ("A$", "AUD"),
    ("CHF", "CHF"),
    ("TWD", "TWD"),
    ("NT$", "TWD"),
    ("CNY", "CNY"),
];

/// Canonical ISO code for a recognized currency token, if any.
pub fn canonical_currency(token: &str) -> Option<&'static str> {
    CURRENCY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == token)
        .map(|(_, code)| *code)
}

/// Currency and scale extracted from a unit string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUnit {
    pub currency: String,
    pub scale: Scale,
}

impl ParsedUnit {
    fn new(currency: impl Into<String>, scale: Scale) -> Self {
        Self {
            currency: currency.into(),
            scale,
        }
    }
}

/// Split a unit string into (currency, scale).
///
/// Match order: explicit scale suffix (`"EUR-M"`), explicit scale prefix
/// (`"M-EUR"`), currency code or symbol from the vocabulary, then defaults:
/// strings containing digits fall back to USD units, anything else is kept
/// verbatim as an unrecognized currency code with scale units.
pub fn parse_unit(unit: &str) -> ParsedUnit {
    let trimmed = unit.trim();
    if trimmed.is_empty() {
        return ParsedUnit::new("USD", Scale::Units);
    }

    let upper = trimmed.to_ascii_uppercase();

    for scale in Scale::ALL {
        if scale == Scale::Units {
            continue;
        }
        let suffix = format!("-{}", scale.as_str());
        if let Some(currency_part) = upper.strip_suffix(&suffix) {
            let currency = canonical_currency(currency_part).unwrap_or(currency_part);
            return ParsedUnit::new(currency, scale);
        }
    }

    for scale in Scale::ALL {
        if scale == Scale::Units {
            continue;
        }
        let prefix = format!("{}-", scale.as_str());
        if let Some(currency_part) = upper.strip_prefix(&prefix) {
            let currency = canonical_currency(currency_part).unwrap_or(currency_part);
            return ParsedUnit::new(currency, scale);
        }
    }

    if let Some(code) = canonical_currency(&upper) {
        return ParsedUnit::new(code, Scale::Units);
    }

    if upper.bytes().any(|byte| byte.is_ascii_digit()) {
        return ParsedUnit::new("USD", Scale::Units);
    }

    ParsedUnit::new(upper, Scale::Units)
}

/// Normalizes fact values across unit scales and currencies.
#[derive(Clone)]
pub struct UnitScaleNormalizer {
    fx: Arc<dyn FxConverter>,
}

impl UnitScaleNormalizer {
    pub fn new(fx: Arc<dyn FxConverter>) -> Self {
        Self { fx }
    }

    /// Normalize a raw fact value to the target currency and scale.
    ///
    /// The scale step always succeeds. The FX step may fail; the scaled,
    /// unconverted value is then kept and `fx_conversion` stays absent, so
    /// the result is never labeled with a currency it was not converted to.
    pub async fn normalize_fact(
        &self,
        value: f64,
        unit: &str,
        period_end: Option<CalendarDate>,
        target_currency: &str,
        target_scale: Scale,
    ) -> NormalizedFact {
        let parsed = parse_unit(unit);
        let target_currency = target_currency.trim().to_ascii_uppercase();

        let source_factor = parsed.scale.factor();
        let target_factor = target_scale.factor();
        let scaling = ScalingApplied {
            source_scale: parsed.scale,
            source_factor,
            target_scale,
            target_factor,
        };

        if !value.is_finite() {
            return NormalizedFact {
                original_value: value,
                original_unit: unit.to_owned(),
                normalized_value: value,
                target_unit: unit.to_owned(),
                scaling_applied: scaling,
                fx_conversion: None,
                normalization_error: Some("value is not finite".to_owned()),
            };
        }

        let scaled = value * source_factor;

        let mut converted = scaled;
        let mut fx_used = None;
        if parsed.currency != target_currency {
            match period_end {
                Some(asof) => {
                    match self
                        .fx
                        .convert(scaled, &parsed.currency, &target_currency, asof)
                        .await
                    {
                        Ok(converted_value) => {
                            let rate = if scaled != 0.0 {
                                converted_value / scaled
                            } else {
                                1.0
                            };
                            converted = converted_value;
                            fx_used = Some(FxConversion {
                                from_currency: parsed.currency.clone(),
                                to_currency: target_currency.clone(),
                                rate,
                                asof,
                            });
                        }
                        Err(error) => {
                            tracing::warn!(
                                from = %parsed.currency,
                                to = %target_currency,
                                %error,
                                "fx conversion failed, keeping unconverted value"
                            );
                        }
                    }
                }
                None => {
                    tracing::warn!(
                        from = %parsed.currency,
                        to = %target_currency,
                        "fx conversion skipped, period has no as-of date"
                    );
                }
            }
        }

        let unit_currency = if fx_used.is_some() || parsed.currency == target_currency {
            target_currency
        } else {
            parsed.currency.clone()
        };

        NormalizedFact {
            original_value: value,
            original_unit: unit.to_owned(),
            normalized_value: converted / target_factor,
            target_unit: format!("{unit_currency}-{}", target_scale.as_str()),
            scaling_applied: scaling,
            fx_conversion: fx_used,
            normalization_error: None,
        }
    }

    /// Whether a unit differs from the target currency or scale at all.
    pub fn should_normalize(unit: &str, target_currency: &str, target_scale: Scale) -> bool {
        let parsed = parse_unit(unit);
        parsed.currency != target_currency.trim().to_ascii_uppercase()
            || parsed.scale != target_scale
    }

    /// Human-readable label for a normalized unit.
    pub fn normalized_unit_display(unit: &str, target_currency: &str) -> String {
        let parsed = parse_unit(unit);
        if parsed.scale == Scale::Units {
            target_currency.to_owned()
        } else {
            format!("{target_currency} ({})", parsed.scale.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::{NoopFxConverter, StaticRateTable};

    fn normalizer_with_rate(from: &str, to: &str, rate: f64) -> UnitScaleNormalizer {
        UnitScaleNormalizer::new(Arc::new(StaticRateTable::new().with_rate(from, to, rate)))
    }

    fn period_end() -> Option<CalendarDate> {
        Some(CalendarDate::parse("2024-12-31").expect("date"))
    }

    #[test]
    fn parses_scale_suffix() {
        assert_eq!(parse_unit("EUR-M"), ParsedUnit::new("EUR", Scale::Millions));
        assert_eq!(parse_unit("twd-k"), ParsedUnit::new("TWD", Scale::Thousands));
    }

    #[test]
    fn parses_scale_prefix() {
        assert_eq!(parse_unit("B-GBP"), ParsedUnit::new("GBP", Scale::Billions));
    }

    #[test]
    fn parses_currency_symbols() {
        assert_eq!(parse_unit("US$"), ParsedUnit::new("USD", Scale::Units));
        assert_eq!(parse_unit("€"), ParsedUnit::new("EUR", Scale::Units));
        assert_eq!(parse_unit("NT$-M"), ParsedUnit::new("TWD", Scale::Millions));
    }

    #[test]
    fn digit_bearing_units_default_to_usd() {
        assert_eq!(parse_unit("USD/share2"), ParsedUnit::new("USD", Scale::Units));
    }

    #[test]
    fn unrecognized_units_are_kept_as_currency_codes() {
        assert_eq!(parse_unit("sek"), ParsedUnit::new("SEK", Scale::Units));
        assert_eq!(parse_unit(""), ParsedUnit::new("USD", Scale::Units));
    }

    #[tokio::test]
    async fn scales_and_converts_currency() {
        let normalizer = normalizer_with_rate("EUR", "USD", 1.10);
        let result = normalizer
            .normalize_fact(100.0, "EUR-M", period_end(), "USD", Scale::Units)
            .await;

        assert!((result.normalized_value - 1.1e8).abs() < 1.0);
        assert_eq!(result.target_unit, "USD-U");
        let fx = result.fx_conversion.expect("fx conversion recorded");
        assert_eq!(fx.from_currency, "EUR");
        assert!((fx.rate - 1.10).abs() < 1e-9);
    }

    #[tokio::test]
    async fn fx_failure_keeps_scaled_value() {
        let normalizer = UnitScaleNormalizer::new(Arc::new(NoopFxConverter));
        let result = normalizer
            .normalize_fact(100.0, "EUR-M", period_end(), "USD", Scale::Units)
            .await;

        assert!((result.normalized_value - 1.0e8).abs() < 1e-9);
        assert!(result.fx_conversion.is_none());
        assert_eq!(result.target_unit, "EUR-U");
        assert!(result.normalization_error.is_none());
    }

    #[tokio::test]
    async fn missing_period_end_skips_conversion() {
        let normalizer = normalizer_with_rate("EUR", "USD", 1.10);
        let result = normalizer
            .normalize_fact(5.0, "EUR-K", None, "USD", Scale::Units)
            .await;

        assert!((result.normalized_value - 5.0e3).abs() < 1e-9);
        assert!(result.fx_conversion.is_none());
        assert_eq!(result.target_unit, "EUR-U");
    }

    #[tokio::test]
    async fn round_trips_when_target_matches_source() {
        let normalizer = UnitScaleNormalizer::new(Arc::new(NoopFxConverter));
        for unit in ["USD", "EUR-M", "TWD-K", "B-GBP", "JPY"] {
            let parsed = parse_unit(unit);
            let result = normalizer
                .normalize_fact(42.5, unit, period_end(), &parsed.currency, parsed.scale)
                .await;
            assert!(
                (result.normalized_value - 42.5).abs() < 1e-9,
                "round trip failed for {unit}"
            );
        }
    }

    #[tokio::test]
    async fn non_finite_value_falls_back_with_error_marker() {
        let normalizer = UnitScaleNormalizer::new(Arc::new(NoopFxConverter));
        let result = normalizer
            .normalize_fact(f64::NAN, "USD", period_end(), "USD", Scale::Units)
            .await;

        assert!(result.normalized_value.is_nan());
        assert_eq!(result.target_unit, "USD");
        assert!(result.normalization_error.is_some());
    }

    #[test]
    fn should_normalize_detects_mismatches() {
        assert!(UnitScaleNormalizer::should_normalize("EUR-M", "USD", Scale::Units));
        assert!(!UnitScaleNormalizer::should_normalize("USD", "USD", Scale::Units));
    }
}
