//! Deduplication statistics.

use std::fmt;

use crate::feature::Feature;

/// Counts from one deduplication pass.
///
/// `input == kept + duplicates`; `unkeyed` features are included in `kept`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupeReport {
    /// Features received
    pub input: usize,
    /// Features in the output
    pub kept: usize,
    /// Features dropped because their key was already seen
    pub duplicates: usize,
    /// Features kept without an identity key
    pub unkeyed: usize,
}

impl fmt::Display for DedupeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in, {} kept, {} duplicates removed",
            self.input, self.kept, self.duplicates
        )?;
        if self.unkeyed > 0 {
            write!(f, ", {} without identity key", self.unkeyed)?;
        }
        Ok(())
    }
}

/// Deduplicated features plus the counts describing how they were obtained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupeOutcome {
    pub features: Vec<Feature>,
    pub report: DedupeReport,
}

impl DedupeOutcome {
    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }
}
