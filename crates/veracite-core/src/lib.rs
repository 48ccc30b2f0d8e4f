//! # Veracite Core
//!
//! Fact grounding and normalization for regulatory filing data: the answer
//! to "is this reported financial number correct, current, and traceable to
//! an authoritative source?"
//!
//! ## Overview
//!
//! This crate provides the grounding pipeline:
//!
//! - **Concept mapping** from internal metric names to filing-taxonomy
//!   concepts, with citation composition
//! - **Unit/scale/currency normalization** with a full audit trail
//! - **Amendment control** to pin facts to exact as-filed versions
//! - **Numeric claim verification** against time-series evidence
//! - **Unit guard** rejecting mixed-unit monetary arithmetic
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`amendments`] | Amendment/restatement resolution and history |
//! | [`cache`] | Read-through memoization |
//! | [`domain`] | Domain models (Fact, Citation, Ticker, Scale, …) |
//! | [`error`] | Core error types |
//! | [`fact_source`] | Upstream fact source collaborator trait |
//! | [`fx`] | FX conversion collaborator trait |
//! | [`grounding`] | Claim verification against time series |
//! | [`normalize`] | Unit parsing and scale/currency normalization |
//! | [`store`] | Concept mapping and fact lookups |
//! | [`unit_guard`] | Unit classification and expression guard |
//!
//! ## Quick Start
//!
//! ```rust
//! use veracite_core::{
//!     CalendarDate, ClaimOperator, ClaimVerifier, Frequency, NumericClaim, TimeSeries,
//! };
//!
//! let series = TimeSeries::new(
//!     "AAPL.revenue",
//!     Frequency::Quarterly,
//!     vec![
//!         (CalendarDate::parse("2024-03-31").expect("date"), 100.0),
//!         (CalendarDate::parse("2024-06-30").expect("date"), 110.0),
//!     ],
//! )
//! .expect("ordered series");
//!
//! let claim = NumericClaim::new("c1", "AAPL.revenue", ClaimOperator::Equal, 110.0);
//! let (evidence, all_supported) = ClaimVerifier::new().ground_claims(&[claim], &[series]);
//!
//! assert!(all_supported);
//! assert!(evidence[0].supported);
//! ```
//!
//! ## Error Handling
//!
//! Malformed input fails fast with structured errors (`ValidationError`,
//! `GuardError`); data-quality outcomes are ordinary values (`FactLookup`
//! reasons, `Evidence { supported: false, .. }`). Collaborator failures are
//! absorbed as "no data" — nothing in this crate terminates the host.
//!
//! ## Concurrency
//!
//! Every component is a pure computation over its inputs plus read-only
//! tables built at construction. The amendment and snapshot caches are the
//! only shared mutable state; both use `tokio::sync::RwLock` so concurrent
//! reads never block each other.

pub mod amendments;
pub mod cache;
pub mod domain;
pub mod error;
pub mod fact_source;
pub mod fx;
pub mod grounding;
pub mod normalize;
pub mod store;
pub mod unit_guard;

// Re-export commonly used types at crate root for convenience

// Amendment control
pub use amendments::{AmendmentController, AmendmentInfo, FactWithAmendment};

// Caching
pub use cache::ReadCache;

// Domain models
pub use domain::{
    Accession, CalendarDate, Citation, Fact, FactSnapshot, Frequency, FxConversion,
    NormalizedFact, PeriodType, Scale, ScalingApplied, Ticker,
};

// Error types
pub use error::{CoreError, ValidationError};

// Fact source collaborator contract
pub use fact_source::{
    FactQuery, FactSource, FilingVersion, SeriesQuery, SourceError, SourceErrorKind, VersionQuery,
};

// FX collaborator contract
pub use fx::{FxConverter, FxError, NoopFxConverter, StaticRateTable};

// Claim grounding
pub use grounding::{ClaimOperator, ClaimVerifier, Evidence, NumericClaim, TimeSeries};

// Normalization
pub use normalize::{canonical_currency, parse_unit, ParsedUnit, UnitScaleNormalizer};

// Facts store
pub use store::{ConceptMap, FactLookup, FactsStore, STANDARD_ORDER};

// Unit guard
pub use unit_guard::{GuardError, UnitClass, UnitClassification, UnitGuard};
