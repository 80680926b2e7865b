//! Typed activity events and the sink seam the cookies page logs through.
//!
//! The page runtime never talks to a file directly: it hands an
//! [`ActivityEvent`] to whatever [`ActivitySink`] the host supplied. The JSONL
//! writer is the production sink; [`MemorySink`] captures events for tests.

#![allow(missing_docs)]

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::errors::ConsentError;
use crate::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};

/// Events emitted by the cookies page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    PageInitialised {
        categories: Vec<String>,
        config_hash: String,
    },
    /// The markup contract was not met; no behaviour was attached.
    PageDisabled {
        code: String,
        reason: String,
    },
    PreferencesRestored {
        value: String,
        version: u32,
        current: bool,
    },
    /// The stored cookie could not be decoded and was treated as absent.
    StoredPreferencesIgnored {
        cookie: String,
        details: String,
    },
    ValidationFailed {
        missing: Vec<String>,
    },
    PreferencesSaved {
        cookie: String,
        value: String,
    },
    /// Cookies belonging to a rejected category were removed.
    CookiesCleared {
        category: String,
        cookies: Vec<String>,
    },
    Error {
        code: String,
        message: String,
    },
}

impl ActivityEvent {
    /// Build an `Error` event from a crate error.
    #[must_use]
    pub fn from_error(err: &ConsentError) -> Self {
        Self::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Destination for activity events.
pub trait ActivitySink {
    fn record(&mut self, event: ActivityEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ActivitySink for NullSink {
    fn record(&mut self, _event: ActivityEvent) {}
}

/// In-memory sink; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<ActivityEvent>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().clone()
    }

    /// Whether any recorded event matches `pred`.
    pub fn any(&self, pred: impl Fn(&ActivityEvent) -> bool) -> bool {
        self.events.lock().iter().any(pred)
    }
}

impl ActivitySink for MemorySink {
    fn record(&mut self, event: ActivityEvent) {
        self.events.lock().push(event);
    }
}

impl ActivitySink for JsonlWriter {
    fn record(&mut self, event: ActivityEvent) {
        self.write_entry(&event_to_log_entry(&event));
    }
}

fn event_to_log_entry(event: &ActivityEvent) -> LogEntry {
    match event {
        ActivityEvent::PageInitialised {
            categories,
            config_hash,
        } => {
            let mut e = LogEntry::new(EventType::PageInit, Severity::Info);
            e.categories = Some(categories.clone());
            e.details = Some(format!("config_hash={config_hash}"));
            e.ok = Some(true);
            e
        }
        ActivityEvent::PageDisabled { code, reason } => {
            let mut e = LogEntry::new(EventType::PageDisabled, Severity::Warning);
            e.error_code = Some(code.clone());
            e.error_message = Some(reason.clone());
            e.ok = Some(false);
            e
        }
        ActivityEvent::PreferencesRestored {
            value,
            version,
            current,
        } => {
            let severity = if *current {
                Severity::Info
            } else {
                Severity::Warning
            };
            let mut e = LogEntry::new(EventType::PreferencesRestored, severity);
            e.value = Some(value.clone());
            e.version = Some(*version);
            if !current {
                e.details = Some("stored consent predates the current cookie version".into());
            }
            e
        }
        ActivityEvent::StoredPreferencesIgnored { cookie, details } => {
            let mut e = LogEntry::new(EventType::StoredPreferencesIgnored, Severity::Warning);
            e.cookie = Some(cookie.clone());
            e.error_code = Some("CKP-2001".to_string());
            e.details = Some(details.clone());
            e
        }
        ActivityEvent::ValidationFailed { missing } => {
            let mut e = LogEntry::new(EventType::ValidationFailed, Severity::Info);
            e.categories = Some(missing.clone());
            e.ok = Some(false);
            e
        }
        ActivityEvent::PreferencesSaved { cookie, value } => {
            let mut e = LogEntry::new(EventType::PreferencesSaved, Severity::Info);
            e.cookie = Some(cookie.clone());
            e.value = Some(value.clone());
            e.ok = Some(true);
            e
        }
        ActivityEvent::CookiesCleared { category, cookies } => {
            let mut e = LogEntry::new(EventType::CookiesCleared, Severity::Info);
            e.categories = Some(vec![category.clone()]);
            e.details = Some(cookies.join(","));
            e
        }
        ActivityEvent::Error { code, message } => {
            let mut e = LogEntry::new(EventType::Error, Severity::Critical);
            e.error_code = Some(code.clone());
            e.error_message = Some(message.clone());
            e.ok = Some(false);
            e
        }
    }
}
