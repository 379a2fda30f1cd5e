//! Identity-based deduplication of join results.
//!
//! Neighbouring probe features usually intersect the same target features,
//! so the flattened join result contains repeats. The [`Deduplicator`]
//! flattens per-probe matches in probe order and keeps the first occurrence
//! of each identity key.
//!
//! Features without a key (attribute missing or null) cannot be proven to be
//! duplicates and are always kept; the report counts them.
//!
//! # Example
//!
//! ```
//! use geojoin::dedupe::{Deduplicator, IdentityKey};
//! use geojoin::feature::Feature;
//!
//! let ids = [1, 2, 1, 3, 2];
//! let features = ids
//!     .iter()
//!     .map(|&id| Feature::without_geometry().with_attribute("OBJECTID", id));
//!
//! let outcome = Deduplicator::new(IdentityKey::field("OBJECTID")).dedupe_features(features);
//! assert_eq!(outcome.features.len(), 3);
//! assert_eq!(outcome.report.duplicates, 2);
//! ```

mod key;
mod report;

pub use key::{FeatureKey, IdentityKey, KeyValue};
pub use report::{DedupeOutcome, DedupeReport};

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::feature::Feature;

/// Removes repeated features by identity key, keeping first occurrences.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    key: IdentityKey,
}

impl Deduplicator {
    pub fn new(key: IdentityKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    /// Flatten per-probe groups in order, then deduplicate.
    pub fn dedupe<G>(&self, groups: G) -> DedupeOutcome
    where
        G: IntoIterator<Item = Vec<Feature>>,
    {
        self.dedupe_features(groups.into_iter().flatten())
    }

    /// Deduplicate an already flat sequence.
    pub fn dedupe_features<I>(&self, features: I) -> DedupeOutcome
    where
        I: IntoIterator<Item = Feature>,
    {
        let mut seen: HashSet<FeatureKey> = HashSet::new();
        let mut kept = Vec::new();
        let mut report = DedupeReport::default();

        for feature in features {
            report.input += 1;
            match self.key.extract(&feature) {
                Some(key) => {
                    if seen.insert(key) {
                        kept.push(feature);
                    } else {
                        report.duplicates += 1;
                    }
                }
                None => {
                    report.unkeyed += 1;
                    kept.push(feature);
                }
            }
        }
        report.kept = kept.len();

        if report.unkeyed > 0 {
            warn!(
                key = %self.key,
                unkeyed = report.unkeyed,
                "Features without identity key kept as distinct"
            );
        }
        debug!(
            key = %self.key,
            input = report.input,
            kept = report.kept,
            duplicates = report.duplicates,
            "Deduplication complete"
        );

        DedupeOutcome {
            features: kept,
            report,
        }
    }
}
