//! FX conversion collaborator contract.
//!
//! Rate sourcing is outside the core; conversion failure is non-fatal to
//! normalization (the scaled, unconverted value is kept).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::CalendarDate;

/// Errors surfaced by FX collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FxError {
    #[error("no rate for {pair} around {asof}")]
    RateNotFound { pair: String, asof: CalendarDate },
    #[error("fx provider unavailable: {message}")]
    Unavailable { message: String },
}

impl FxError {
    pub fn rate_not_found(from: &str, to: &str, asof: CalendarDate) -> Self {
        Self::RateNotFound {
            pair: format!("{from}/{to}"),
            asof,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Currency conversion collaborator contract.
pub trait FxConverter: Send + Sync {
    /// Converts `value` from one currency to another at the given as-of
    /// date, returning the converted value.
    fn convert<'a>(
        &'a self,
        value: f64,
        from: &'a str,
        to: &'a str,
        asof: CalendarDate,
    ) -> Pin<Box<dyn Future<Output = Result<f64, FxError>> + Send + 'a>>;
}

/// Converter that never has a rate. Useful as a default when no FX
/// collaborator is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFxConverter;

impl FxConverter for NoopFxConverter {
    fn convert<'a>(
        &'a self,
        _value: f64,
        _from: &'a str,
        _to: &'a str,
        _asof: CalendarDate,
    ) -> Pin<Box<dyn Future<Output = Result<f64, FxError>> + Send + 'a>> {
        Box::pin(async { Err(FxError::unavailable("no fx converter configured")) })
    }
}

/// Fixed pair-to-rate table. Looks up the direct pair first, then the
/// inverse pair (inverted). Intended for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticRateTable {
    rates: HashMap<(String, String), f64>,
}

impl StaticRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, from: &str, to: &str, rate: f64) -> Self {
        self.rates.insert(
            (from.to_ascii_uppercase(), to.to_ascii_uppercase()),
            rate,
        );
        self
    }

    fn rate_for(&self, from: &str, to: &str) -> Option<f64> {
        let from = from.to_ascii_uppercase();
        let to = to.to_ascii_uppercase();
        if from == to {
            return Some(1.0);
        }
        if let Some(rate) = self.rates.get(&(from.clone(), to.clone())) {
            return Some(*rate);
        }
        self.rates
            .get(&(to, from))
            .map(|inverse_rate| 1.0 / inverse_rate)
    }
}

impl FxConverter for StaticRateTable {
    fn convert<'a>(
        &'a self,
        value: f64,
        from: &'a str,
        to: &'a str,
        asof: CalendarDate,
    ) -> Pin<Box<dyn Future<Output = Result<f64, FxError>> + Send + 'a>> {
        Box::pin(async move {
            match self.rate_for(from, to) {
                Some(rate) => Ok(value * rate),
                None => Err(FxError::rate_not_found(from, to, asof)),
            }
        })
    }
}
