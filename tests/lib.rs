//! Shared fixtures for veracite behavior tests.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use veracite_core::{
    Accession, CalendarDate, ClaimOperator, Fact, FactQuery, FactSource, FilingVersion, Frequency,
    NumericClaim, PeriodType, SeriesQuery, SourceError, Ticker, TimeSeries, VersionQuery,
};

pub fn date(raw: &str) -> CalendarDate {
    CalendarDate::parse(raw).expect("fixture date must parse")
}

pub fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw).expect("fixture ticker must parse")
}

pub fn accession(raw: &str) -> Accession {
    Accession::parse(raw).expect("fixture accession must parse")
}

pub fn series(id: &str, frequency: Frequency, points: &[(&str, f64)]) -> TimeSeries {
    TimeSeries::new(
        id,
        frequency,
        points
            .iter()
            .map(|(raw, value)| (date(raw), *value))
            .collect(),
    )
    .expect("fixture series must be ordered")
}

pub fn claim(id: &str, metric: &str, operator: ClaimOperator, value: f64) -> NumericClaim {
    NumericClaim::new(id, metric, operator, value)
}

pub fn fact(concept: &str, value: f64, unit: &str, period: &str, accn: &str) -> Fact {
    Fact::new(concept, value, unit, period, PeriodType::Duration, accession(accn))
        .expect("fixture fact must validate")
}

pub fn filed_version(
    fact: Fact,
    filed: &str,
    form: &str,
    amends: Option<&str>,
    restatement_reason: Option<&str>,
) -> FilingVersion {
    FilingVersion {
        fact,
        filed: date(filed),
        form: form.to_owned(),
        amends: amends.map(accession),
        restatement_reason: restatement_reason.map(str::to_owned),
    }
}

/// In-memory fact source with canned facts and filing-version chains.
#[derive(Default)]
pub struct CannedFactSource {
    facts: Vec<Fact>,
    versions: HashMap<(String, String), Vec<FilingVersion>>,
    pub fact_calls: AtomicUsize,
    pub version_calls: AtomicUsize,
}

impl CannedFactSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fact(mut self, fact: Fact) -> Self {
        self.facts.push(fact);
        self
    }

    pub fn with_versions(mut self, concept: &str, period: &str, chain: Vec<FilingVersion>) -> Self {
        self.versions
            .insert((concept.to_owned(), period.to_owned()), chain);
        self
    }
}

impl FactSource for CannedFactSource {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    fn filing_url(&self, ticker: &Ticker, accession: &Accession) -> String {
        format!("https://filings.example.test/{ticker}/{accession}/")
    }

    fn fact<'a>(
        &'a self,
        query: FactQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Fact>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            self.fact_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .facts
                .iter()
                .find(|fact| {
                    fact.concept == query.concept
                        && (query.period == "latest" || fact.period == query.period)
                })
                .cloned())
        })
    }

    fn series<'a>(
        &'a self,
        query: SeriesQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Fact>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            Ok(self
                .facts
                .iter()
                .filter(|fact| fact.concept == query.concept)
                .take(query.limit)
                .cloned()
                .collect())
        })
    }

    fn versions<'a>(
        &'a self,
        query: VersionQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FilingVersion>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            self.version_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .versions
                .get(&(query.concept.clone(), query.period.clone()))
                .cloned()
                .unwrap_or_default())
        })
    }
}

/// Fact source whose every endpoint fails, for collaborator-outage tests.
pub struct FailingFactSource;

impl FactSource for FailingFactSource {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    fn filing_url(&self, ticker: &Ticker, accession: &Accession) -> String {
        format!("https://filings.example.test/{ticker}/{accession}/")
    }

    fn fact<'a>(
        &'a self,
        _query: FactQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Fact>, SourceError>> + Send + 'a>> {
        Box::pin(async { Err(SourceError::unavailable("upstream offline")) })
    }

    fn series<'a>(
        &'a self,
        _query: SeriesQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Fact>, SourceError>> + Send + 'a>> {
        Box::pin(async { Err(SourceError::unavailable("upstream offline")) })
    }

    fn versions<'a>(
        &'a self,
        _query: VersionQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FilingVersion>, SourceError>> + Send + 'a>> {
        Box::pin(async { Err(SourceError::unavailable("upstream offline")) })
    }
}
