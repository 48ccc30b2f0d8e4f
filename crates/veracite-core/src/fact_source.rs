//! Upstream fact source contract.
//!
//! The network fetch layer is an external collaborator: it owns retries,
//! timeouts, and rate limiting. The core consumes this trait and treats any
//! collaborator failure as "no data" rather than propagating raw faults.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{Accession, CalendarDate, Fact, Frequency, Ticker};

/// Collaborator-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured error returned by fact source collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request for a single fact under one taxonomy concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactQuery {
    pub ticker: Ticker,
    pub concept: String,
    pub period: String,
    pub freq: Frequency,
}

impl FactQuery {
    pub fn new(
        ticker: Ticker,
        concept: impl Into<String>,
        period: impl Into<String>,
        freq: Frequency,
    ) -> Result<Self, SourceError> {
        let concept = concept.into();
        if concept.trim().is_empty() {
            return Err(SourceError::invalid_request(
                "fact query concept must not be empty",
            ));
        }
        let period = period.into();
        if period.trim().is_empty() {
            return Err(SourceError::invalid_request(
                "fact query period must not be empty",
            ));
        }
        Ok(Self {
            ticker,
            concept,
            period,
            freq,
        })
    }
}

/// Request for an ordered run of facts under one taxonomy concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub ticker: Ticker,
    pub concept: String,
    pub freq: Frequency,
    pub limit: usize,
}

impl SeriesQuery {
    pub fn new(
        ticker: Ticker,
        concept: impl Into<String>,
        freq: Frequency,
        limit: usize,
    ) -> Result<Self, SourceError> {
        let concept = concept.into();
        if concept.trim().is_empty() {
            return Err(SourceError::invalid_request(
                "series query concept must not be empty",
            ));
        }
        if limit == 0 {
            return Err(SourceError::invalid_request(
                "series query limit must be greater than zero",
            ));
        }
        Ok(Self {
            ticker,
            concept,
            freq,
            limit,
        })
    }
}

/// Request for the filed-version chain of one (concept, period) fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionQuery {
    pub ticker: Ticker,
    pub concept: String,
    pub period: String,
}

impl VersionQuery {
    pub fn new(
        ticker: Ticker,
        concept: impl Into<String>,
        period: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let concept = concept.into();
        if concept.trim().is_empty() {
            return Err(SourceError::invalid_request(
                "version query concept must not be empty",
            ));
        }
        let period = period.into();
        if period.trim().is_empty() {
            return Err(SourceError::invalid_request(
                "version query period must not be empty",
            ));
        }
        Ok(Self {
            ticker,
            concept,
            period,
        })
    }
}

/// One filed version of a fact: the original filing or an amendment to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingVersion {
    pub fact: Fact,
    pub filed: CalendarDate,
    pub form: String,
    /// Accession of the filing this version amends, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amends: Option<Accession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restatement_reason: Option<String>,
}

/// Fact source collaborator contract.
///
/// Implementations must be `Send + Sync`; they are shared across tasks.
pub trait FactSource: Send + Sync {
    /// Human-readable source label used in citations (e.g. a registry name).
    fn name(&self) -> &str;

    /// Stable document URL for a filing, used in citations.
    fn filing_url(&self, ticker: &Ticker, accession: &Accession) -> String;

    /// Fetches the fact for one taxonomy concept, if the source has it.
    fn fact<'a>(
        &'a self,
        query: FactQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Fact>, SourceError>> + Send + 'a>>;

    /// Fetches an ordered run of facts; ordering and limit are applied by
    /// the source.
    fn series<'a>(
        &'a self,
        query: SeriesQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Fact>, SourceError>> + Send + 'a>>;

    /// Fetches every filed version of a fact, original and amendments.
    fn versions<'a>(
        &'a self,
        query: VersionQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FilingVersion>, SourceError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").expect("ticker")
    }

    #[test]
    fn rejects_empty_concept() {
        let error = FactQuery::new(ticker(), "  ", "latest", Frequency::Quarterly)
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
        assert!(error.message().contains("concept"));
    }

    #[test]
    fn rejects_zero_series_limit() {
        let error =
            SeriesQuery::new(ticker(), "Revenues", Frequency::Quarterly, 0).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
        assert!(error.message().contains("limit"));
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(SourceError::unavailable("x").code(), "source.unavailable");
        assert_eq!(SourceError::rate_limited("x").code(), "source.rate_limited");
        assert!(SourceError::unavailable("x").retryable());
        assert!(!SourceError::invalid_request("x").retryable());
    }
}
