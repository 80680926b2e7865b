//! Per-category selection check.

use std::collections::BTreeSet;

use crate::cookie::codec::PreferencesRecord;

/// Categories missing a selection. Empty means the record may be saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    missing: BTreeSet<String>,
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }

    #[must_use]
    pub fn is_missing(&self, category: &str) -> bool {
        self.missing.contains(category)
    }

    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.missing.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.missing.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
    }
}

/// A category is invalid iff its consent is unset.
#[must_use]
pub fn validate(record: &PreferencesRecord) -> ValidationResult {
    ValidationResult {
        missing: record
            .iter()
            .filter(|(_, consent)| !consent.is_set())
            .map(|(category, _)| category.to_string())
            .collect(),
    }
}
