//! Amendment and restatement control.
//!
//! A fact for one (ticker, concept, period) may have been filed more than
//! once: the original filing plus later amendments. Resolution precedence:
//! an explicit accession pin wins, then as-reported (latest non-amended),
//! then latest (which may be an amendment). Version chains are memoized and
//! never invalidated automatically; `clear_cache` gives long-lived processes
//! a refresh point.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::ReadCache;
use crate::domain::{Accession, CalendarDate, Citation, Fact, Ticker};
use crate::fact_source::{FactSource, FilingVersion, VersionQuery};
use crate::normalize::parse_unit;
use crate::ValidationError;

/// Amendment status of one filed version.
///
/// Constructed only through [`AmendmentInfo::as_filed`] and
/// [`AmendmentInfo::amendment`], which keep the invariants: `amended`
/// implies `original_accession` and `amendment_date` are present, and
/// `as_reported` implies not `amended`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendmentInfo {
    pub accession: Accession,
    pub amended: bool,
    pub as_reported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_accession: Option<Accession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amendment_date: Option<CalendarDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restatement_reason: Option<String>,
}

impl AmendmentInfo {
    /// Status for an original, unamended filing.
    pub fn as_filed(accession: Accession) -> Self {
        Self {
            accession,
            amended: false,
            as_reported: true,
            original_accession: None,
            amendment_date: None,
            restatement_reason: None,
        }
    }

    /// Status for an amendment superseding an earlier filing.
    pub fn amendment(
        accession: Accession,
        original_accession: Accession,
        amendment_date: CalendarDate,
        restatement_reason: Option<String>,
    ) -> Self {
        Self {
            accession,
            amended: true,
            as_reported: false,
            original_accession: Some(original_accession),
            amendment_date: Some(amendment_date),
            restatement_reason,
        }
    }
}

/// Fact resolved under amendment control, with its citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactWithAmendment {
    pub fact: Fact,
    pub amendment: AmendmentInfo,
    pub citation: Citation,
}

/// Resolves which filed version of a fact satisfies a request.
pub struct AmendmentController {
    source: Arc<dyn FactSource>,
    chains: ReadCache<Vec<FilingVersion>>,
}

impl AmendmentController {
    pub fn new(source: Arc<dyn FactSource>) -> Self {
        Self {
            source,
            chains: ReadCache::new(),
        }
    }

    /// Resolve a fact according to amendment-control precedence.
    ///
    /// An explicit `accession` is validated before any lookup and pins the
    /// result to that exact filed version; `as_reported` resolves the latest
    /// non-amended version; otherwise the latest version wins and carries
    /// restatement metadata when it is an amendment.
    pub async fn get_fact_with_amendment_control(
        &self,
        ticker: &Ticker,
        concept: &str,
        period: &str,
        as_reported: bool,
        accession: Option<&str>,
    ) -> Result<Option<FactWithAmendment>, ValidationError> {
        let pinned = accession.map(Accession::parse).transpose()?;

        let chain = self.version_chain(ticker, concept, period).await;

        let resolved = if let Some(pin) = pinned {
            chain
                .iter()
                .find(|version| version.fact.accession == pin)
                .map(|version| (version, AmendmentInfo::as_filed(pin.clone())))
        } else if as_reported {
            chain
                .iter()
                .rev()
                .find(|version| version.amends.is_none())
                .map(|version| (version, Self::version_status(version)))
        } else {
            chain
                .last()
                .map(|version| (version, Self::version_status(version)))
        };

        Ok(resolved.map(|(version, amendment)| {
            let citation = self.citation_for(ticker, version, &amendment);
            FactWithAmendment {
                fact: version.fact.clone(),
                amendment,
                citation,
            }
        }))
    }

    /// Chronological amendment history for a fact, oldest first.
    pub async fn get_amendment_history(
        &self,
        ticker: &Ticker,
        concept: &str,
        period: &str,
    ) -> Vec<AmendmentInfo> {
        self.version_chain(ticker, concept, period)
            .await
            .iter()
            .map(Self::version_status)
            .collect()
    }

    /// Status of the latest filed version, falling back to as-filed for the
    /// given accession when the source has no version history.
    pub async fn amendment_status(
        &self,
        ticker: &Ticker,
        concept: &str,
        period: &str,
        fallback: &Accession,
    ) -> AmendmentInfo {
        self.version_chain(ticker, concept, period)
            .await
            .last()
            .map(Self::version_status)
            .unwrap_or_else(|| AmendmentInfo::as_filed(fallback.clone()))
    }

    pub async fn clear_cache(&self) {
        self.chains.clear().await;
    }

    fn version_status(version: &FilingVersion) -> AmendmentInfo {
        match &version.amends {
            Some(original) => AmendmentInfo::amendment(
                version.fact.accession.clone(),
                original.clone(),
                version.filed,
                version.restatement_reason.clone(),
            ),
            None => AmendmentInfo::as_filed(version.fact.accession.clone()),
        }
    }

    fn citation_for(
        &self,
        ticker: &Ticker,
        version: &FilingVersion,
        amendment: &AmendmentInfo,
    ) -> Citation {
        let parsed = parse_unit(&version.fact.unit);
        Citation {
            source: self.source.name().to_owned(),
            accession: amendment.accession.clone(),
            url: self.source.filing_url(ticker, &amendment.accession),
            concept: version.fact.concept.clone(),
            unit: version.fact.unit.clone(),
            scale: parsed.scale,
            fx_used: None,
            amended: amendment.amended,
            as_reported: amendment.as_reported,
            filed: Some(version.filed),
            form: Some(version.form.clone()),
        }
    }

    /// Version chain sorted by filing date, oldest first. Collaborator
    /// failure is treated as "no data".
    async fn version_chain(
        &self,
        ticker: &Ticker,
        concept: &str,
        period: &str,
    ) -> Vec<FilingVersion> {
        let key = format!("{ticker}:{concept}:{period}");
        if let Some(chain) = self.chains.get(&key).await {
            return chain;
        }

        let query = match VersionQuery::new(ticker.clone(), concept, period) {
            Ok(query) => query,
            Err(error) => {
                tracing::warn!(%error, "invalid version query");
                return Vec::new();
            }
        };

        match self.source.versions(query).await {
            Ok(mut versions) => {
                versions.sort_by_key(|version| version.filed);
                self.chains.put(key, versions.clone()).await;
                versions
            }
            Err(error) => {
                tracing::warn!(
                    ticker = %ticker,
                    concept,
                    period,
                    %error,
                    "version source failed, treating as no data"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accession(raw: &str) -> Accession {
        Accession::parse(raw).expect("accession")
    }

    #[test]
    fn as_filed_holds_invariants() {
        let info = AmendmentInfo::as_filed(accession("0000320193-24-000006"));
        assert!(!info.amended);
        assert!(info.as_reported);
        assert!(info.original_accession.is_none());
        assert!(info.amendment_date.is_none());
    }

    #[test]
    fn amendment_holds_invariants() {
        let info = AmendmentInfo::amendment(
            accession("0000320193-24-000007"),
            accession("0000320193-24-000006"),
            CalendarDate::parse("2024-01-15").expect("date"),
            Some("revenue recognition timing".to_owned()),
        );
        assert!(info.amended);
        assert!(!info.as_reported);
        assert!(info.original_accession.is_some());
        assert!(info.amendment_date.is_some());
    }
}
