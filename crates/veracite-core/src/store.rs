//! Concept mapping and fact lookups.
//!
//! The store maps internal metric names to filing-taxonomy concepts, pulls
//! the raw fact from the upstream source, resolves amendment status, runs
//! normalization, and composes the citation. Absent results carry a
//! machine-readable reason rather than an error: most misses are ordinary
//! business traffic, not faults.

use std::collections::HashMap;
use std::sync::Arc;

use crate::amendments::AmendmentController;
use crate::cache::ReadCache;
use crate::domain::{Citation, Fact, FactSnapshot, Frequency, Scale, Ticker};
use crate::fact_source::{FactQuery, FactSource, SeriesQuery};
use crate::normalize::UnitScaleNormalizer;

/// Accounting standards probed in order when mapping a metric.
pub const STANDARD_ORDER: &[&str] = &["us_gaap", "ifrs"];

/// Static lookup from internal metric names to taxonomy concepts, keyed by
/// accounting standard. Keys are case-sensitive. Loaded once at
/// construction; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ConceptMap {
    concepts: HashMap<String, HashMap<String, Vec<String>>>,
}

impl ConceptMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concept table distilled from common filing vocabularies.
    pub fn builtin() -> Self {
        let mut map = Self::new();
        map.insert(
            "revenue",
            "us_gaap",
            &[
                "SalesRevenueNet",
                "RevenueFromContractWithCustomerExcludingAssessedTax",
                "Revenues",
            ],
        );
        map.insert("revenue", "ifrs", &["Revenue"]);
        map.insert(
            "costOfRevenue",
            "us_gaap",
            &["CostOfGoodsAndServicesSold", "CostOfRevenue", "CostOfGoodsSold"],
        );
        map.insert("costOfRevenue", "ifrs", &["CostOfSales"]);
        map.insert("grossProfit", "us_gaap", &["GrossProfit"]);
        map.insert("grossProfit", "ifrs", &["GrossProfit"]);
        map.insert("operatingIncome", "us_gaap", &["OperatingIncomeLoss"]);
        map.insert(
            "operatingIncome",
            "ifrs",
            &["ProfitLossFromOperatingActivities"],
        );
        map.insert("netIncome", "us_gaap", &["NetIncomeLoss"]);
        map.insert("netIncome", "ifrs", &["ProfitLoss"]);
        map.insert("totalAssets", "us_gaap", &["Assets"]);
        map.insert("totalAssets", "ifrs", &["Assets"]);
        map.insert("totalLiabilities", "us_gaap", &["Liabilities"]);
        map.insert("totalLiabilities", "ifrs", &["Liabilities"]);
        map.insert(
            "cashAndEquivalents",
            "us_gaap",
            &["CashAndCashEquivalentsAtCarryingValue"],
        );
        map.insert("cashAndEquivalents", "ifrs", &["CashAndCashEquivalents"]);
        map.insert(
            "operatingCashFlow",
            "us_gaap",
            &["NetCashProvidedByUsedInOperatingActivities"],
        );
        map.insert(
            "operatingCashFlow",
            "ifrs",
            &["CashFlowsFromUsedInOperatingActivities"],
        );
        map.insert(
            "sharesOutstanding",
            "us_gaap",
            &["CommonStockSharesOutstanding"],
        );
        map.insert("sharesOutstanding", "ifrs", &["NumberOfSharesOutstanding"]);
        map
    }

    pub fn insert(&mut self, metric: &str, standard: &str, concepts: &[&str]) {
        self.concepts
            .entry(metric.to_owned())
            .or_default()
            .insert(
                standard.to_owned(),
                concepts.iter().map(|concept| (*concept).to_owned()).collect(),
            );
    }

    /// Taxonomy concepts for a metric under one standard. Case-sensitive.
    pub fn concepts_for(&self, metric: &str, standard: &str) -> &[String] {
        self.concepts
            .get(metric)
            .and_then(|standards| standards.get(standard))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains_metric(&self, metric: &str) -> bool {
        self.concepts.contains_key(metric)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

/// Outcome of a fact lookup. Misses are reasons, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum FactLookup {
    Found(Box<FactSnapshot>),
    /// The metric has no taxonomy concept under any probed standard.
    MappingNotFound,
    /// Mapped concepts exist but none returned data.
    DataNotFound,
}

impl FactLookup {
    pub fn found(&self) -> Option<&FactSnapshot> {
        match self {
            Self::Found(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<FactSnapshot> {
        match self {
            Self::Found(snapshot) => Some(*snapshot),
            _ => None,
        }
    }

    pub const fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Found(_) => None,
            Self::MappingNotFound => Some("mapping_not_found"),
            Self::DataNotFound => Some("data_not_found"),
        }
    }
}

/// Store for normalized facts with concept mapping and citations.
pub struct FactsStore {
    source: Arc<dyn FactSource>,
    normalizer: UnitScaleNormalizer,
    amendments: Arc<AmendmentController>,
    concept_map: ConceptMap,
    snapshots: ReadCache<FactSnapshot>,
    target_currency: String,
    target_scale: Scale,
}

impl FactsStore {
    pub fn new(
        source: Arc<dyn FactSource>,
        normalizer: UnitScaleNormalizer,
        amendments: Arc<AmendmentController>,
        concept_map: ConceptMap,
    ) -> Self {
        Self {
            source,
            normalizer,
            amendments,
            concept_map,
            snapshots: ReadCache::new(),
            target_currency: "USD".to_owned(),
            target_scale: Scale::Units,
        }
    }

    /// Override the canonical target currency/scale (defaults: USD, units).
    pub fn with_target(mut self, currency: &str, scale: Scale) -> Self {
        self.target_currency = currency.trim().to_ascii_uppercase();
        self.target_scale = scale;
        self
    }

    /// Look up one normalized fact for a metric.
    pub async fn get_fact(
        &self,
        ticker: &Ticker,
        metric: &str,
        period: &str,
        freq: Frequency,
    ) -> FactLookup {
        let cache_key = format!("{ticker}:{metric}:{period}:{}", freq.as_str());
        if let Some(snapshot) = self.snapshots.get(&cache_key).await {
            return FactLookup::Found(Box::new(snapshot));
        }

        let candidates = self.candidate_concepts(metric);
        if candidates.is_empty() {
            tracing::warn!(metric, "mapping-not-found: no taxonomy concept for metric");
            return FactLookup::MappingNotFound;
        }

        let mut hit: Option<Fact> = None;
        for concept in &candidates {
            let query = match FactQuery::new(ticker.clone(), concept.as_str(), period, freq) {
                Ok(query) => query,
                Err(error) => {
                    tracing::warn!(%error, concept = concept.as_str(), "invalid fact query");
                    continue;
                }
            };
            match self.source.fact(query).await {
                Ok(Some(fact)) => {
                    hit = Some(fact);
                    break;
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        %error,
                        concept = concept.as_str(),
                        "fact source failed, treating as no data"
                    );
                }
            }
        }

        let Some(fact) = hit else {
            tracing::debug!(
                ticker = %ticker,
                metric,
                "data-not-found: no fact for any candidate concept"
            );
            return FactLookup::DataNotFound;
        };

        let snapshot = self.compose_snapshot(ticker, metric, fact).await;
        self.snapshots.put(cache_key, snapshot.clone()).await;
        FactLookup::Found(Box::new(snapshot))
    }

    /// Ordered run of normalized facts for a metric. Ordering and limit are
    /// applied by the upstream source; the store does not resequence or
    /// deduplicate what it receives.
    pub async fn get_series(
        &self,
        ticker: &Ticker,
        metric: &str,
        freq: Frequency,
        limit: usize,
    ) -> Vec<FactSnapshot> {
        let candidates = self.candidate_concepts(metric);
        if candidates.is_empty() {
            tracing::warn!(metric, "mapping-not-found: no taxonomy concept for metric");
            return Vec::new();
        }

        for concept in &candidates {
            let query = match SeriesQuery::new(ticker.clone(), concept.as_str(), freq, limit) {
                Ok(query) => query,
                Err(error) => {
                    tracing::warn!(%error, concept = concept.as_str(), "invalid series query");
                    continue;
                }
            };
            let facts = match self.source.series(query).await {
                Ok(facts) => facts,
                Err(error) => {
                    tracing::warn!(
                        %error,
                        concept = concept.as_str(),
                        "series source failed, treating as no data"
                    );
                    continue;
                }
            };
            if facts.is_empty() {
                continue;
            }

            let mut snapshots = Vec::with_capacity(facts.len());
            for fact in facts {
                snapshots.push(self.compose_snapshot(ticker, metric, fact).await);
            }
            return snapshots;
        }

        Vec::new()
    }

    pub async fn clear_cache(&self) {
        self.snapshots.clear().await;
    }

    /// Candidate taxonomy concepts across the standard probe order.
    fn candidate_concepts(&self, metric: &str) -> Vec<String> {
        let mut candidates = Vec::new();
        for standard in STANDARD_ORDER {
            for concept in self.concept_map.concepts_for(metric, standard) {
                if !candidates.contains(concept) {
                    candidates.push(concept.clone());
                }
            }
        }
        candidates
    }

    async fn compose_snapshot(&self, ticker: &Ticker, metric: &str, fact: Fact) -> FactSnapshot {
        let amendment = self
            .amendments
            .amendment_status(ticker, &fact.concept, &fact.period, &fact.accession)
            .await;

        let normalization = self
            .normalizer
            .normalize_fact(
                fact.value,
                &fact.unit,
                fact.period_end(),
                &self.target_currency,
                self.target_scale,
            )
            .await;

        let citation = Citation {
            source: self.source.name().to_owned(),
            accession: amendment.accession.clone(),
            url: self.source.filing_url(ticker, &amendment.accession),
            concept: fact.concept.clone(),
            unit: fact.unit.clone(),
            scale: normalization.scaling_applied.source_scale,
            fx_used: normalization.fx_conversion.clone(),
            amended: amendment.amended,
            as_reported: amendment.as_reported,
            filed: fact.filed,
            form: fact.form.clone(),
        };

        FactSnapshot {
            ticker: ticker.clone(),
            metric: metric.to_owned(),
            value: normalization.normalized_value,
            unit: normalization.target_unit.clone(),
            period: fact.period.clone(),
            citation,
            normalization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_map_resolves_known_metrics() {
        let map = ConceptMap::builtin();
        let concepts = map.concepts_for("revenue", "us_gaap");
        assert!(concepts.contains(&"Revenues".to_owned()));
        assert_eq!(map.concepts_for("revenue", "ifrs"), ["Revenue"]);
    }

    #[test]
    fn lookups_are_case_sensitive() {
        let map = ConceptMap::builtin();
        assert!(map.concepts_for("Revenue", "us_gaap").is_empty());
        assert!(map.concepts_for("revenue", "US_GAAP").is_empty());
    }

    #[test]
    fn lookup_reasons_are_machine_readable() {
        assert_eq!(FactLookup::MappingNotFound.reason(), Some("mapping_not_found"));
        assert_eq!(FactLookup::DataNotFound.reason(), Some("data_not_found"));
    }
}
