//! Consent preferences record and its cookie-value codec.
//!
//! The cookie value is a compact JSON object with one boolean per category
//! followed by the schema version:
//!
//! ```text
//! {"analytics":true,"version":1}
//! ```
//!
//! Decoding is deliberately forgiving: anything that is not a JSON object is
//! "no stored preferences", and members that are not booleans are skipped.
//! A corrupt cookie must never stop the page from loading.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::core::config::VERSION_KEY;
use crate::core::errors::{ConsentError, Result};

// ──────────────────── consent ────────────────────

/// Per-category consent choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Consent {
    /// User answered "yes".
    Accepted,
    /// User answered "no".
    Rejected,
    /// No answer yet.
    #[default]
    Unset,
}

impl Consent {
    /// `Some(bool)` for an answered category, `None` when unset.
    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Self::Accepted => Some(true),
            Self::Rejected => Some(false),
            Self::Unset => None,
        }
    }

    #[must_use]
    pub const fn is_set(self) -> bool {
        !matches!(self, Self::Unset)
    }
}

impl From<bool> for Consent {
    fn from(value: bool) -> Self {
        if value { Self::Accepted } else { Self::Rejected }
    }
}

impl From<Option<bool>> for Consent {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unset, Self::from)
    }
}

impl fmt::Display for Consent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
            Self::Unset => write!(f, "unset"),
        }
    }
}

// ──────────────────── record ────────────────────

/// A user's per-category consent plus the cookie schema version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesRecord {
    choices: BTreeMap<String, Consent>,
    version: u32,
}

impl PreferencesRecord {
    /// Empty record tagged with `version`.
    #[must_use]
    pub fn new(version: u32) -> Self {
        Self {
            choices: BTreeMap::new(),
            version,
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, category: impl Into<String>, consent: Consent) -> Self {
        self.set(category, consent);
        self
    }

    pub fn set(&mut self, category: impl Into<String>, consent: Consent) {
        self.choices.insert(category.into(), consent);
    }

    /// Consent for `category`; absent categories read as `Unset`.
    #[must_use]
    pub fn get(&self, category: &str) -> Consent {
        self.choices.get(category).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, category: &str) -> bool {
        self.choices.contains_key(category)
    }

    /// Categories and their consent, in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Consent)> {
        self.choices.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    /// Overlay the answered categories of `newer` onto `self`. Unset entries
    /// in `newer` never erase an existing answer.
    pub fn merge_from(&mut self, newer: &Self) {
        for (category, consent) in newer.iter() {
            if consent.is_set() {
                self.choices.insert(category.to_string(), consent);
            }
        }
    }
}

// ──────────────────── codec ────────────────────

#[derive(Serialize)]
struct CookieWire<'a> {
    #[serde(flatten)]
    choices: BTreeMap<&'a str, bool>,
    version: u32,
}

/// Serialize a record to its cookie value. `Unset` categories are omitted.
/// A category named `version` would collide with the version stamp and is
/// refused.
pub fn encode(record: &PreferencesRecord) -> Result<String> {
    if record.contains(VERSION_KEY) {
        return Err(ConsentError::Serialization {
            context: "consent cookie",
            details: format!("category {VERSION_KEY:?} collides with the version stamp"),
        });
    }
    let wire = CookieWire {
        choices: record
            .iter()
            .filter_map(|(cat, consent)| consent.as_bool().map(|b| (cat, b)))
            .collect(),
        version: record.version,
    };
    Ok(serde_json::to_string(&wire)?)
}

/// Parse a cookie value, reporting why it was unusable.
pub fn try_decode(cookie_value: &str) -> Result<PreferencesRecord> {
    let value: serde_json::Value =
        serde_json::from_str(cookie_value).map_err(|e| ConsentError::MalformedCookie {
            details: e.to_string(),
        })?;

    let Some(object) = value.as_object() else {
        return Err(ConsentError::MalformedCookie {
            details: format!("expected a JSON object, got {}", json_kind(&value)),
        });
    };

    let mut record = PreferencesRecord::new(0);
    for (key, member) in object {
        if key == VERSION_KEY {
            record.version = member
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0);
        } else if let Some(flag) = member.as_bool() {
            record.set(key.clone(), Consent::from(flag));
        }
    }
    Ok(record)
}

/// Parse a cookie value; malformed input yields `None`.
#[must_use]
pub fn decode(cookie_value: &str) -> Option<PreferencesRecord> {
    try_decode(cookie_value).ok()
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
