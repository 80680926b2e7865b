//! Cookie storage seam and consent-cookie persistence.
//!
//! [`CookieJar`] is the page's view of `document.cookie`. [`DocumentCookieJar`]
//! reproduces browser semantics in memory: assignments are
//! `name=value; path=/; expires=...` strings, reads scan the `a=b; c=d`
//! header, and a past `expires` deletes the cookie. Clones share one store so
//! a second page load over the same jar sees what the first one saved.
//!
//! [`ConsentStore`] applies the consent policy on top of any jar: merge new
//! choices over the stored ones, stamp the version, write with the configured
//! attributes, and remove the cookies of categories the user rejected.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;

use crate::cookie::codec::{self, Consent, PreferencesRecord};
use crate::core::config::Config;
use crate::core::errors::{ConsentError, Result};

/// `toGMTString`-style date used in `expires=` attributes.
const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Browsers refuse a cookie whose name and value together exceed this.
pub const MAX_COOKIE_BYTES: usize = 4096;

// ──────────────────── set-cookie ────────────────────

/// A single cookie assignment with its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
}

impl SetCookie {
    /// Session cookie on path `/`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            expires: None,
            secure: false,
        }
    }

    /// Assignment that deletes `name` (expiry in the past).
    #[must_use]
    pub fn expired(name: impl Into<String>) -> Self {
        Self {
            expires: Some(DateTime::<Utc>::UNIX_EPOCH),
            ..Self::new(name, "")
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Expire `days` after `now`. Past the representable date range the
    /// cookie stays a session cookie.
    #[must_use]
    pub fn expiring_in_days(mut self, days: u32, now: DateTime<Utc>) -> Self {
        self.expires =
            ChronoDuration::try_days(i64::from(days)).and_then(|d| now.checked_add_signed(d));
        self
    }

    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Render as a `document.cookie` assignment.
    #[must_use]
    pub fn to_cookie_string(&self) -> String {
        let mut out = format!("{}={}; path={}", self.name, self.value, self.path);
        if let Some(expires) = self.expires {
            out.push_str("; expires=");
            out.push_str(&expires.format(EXPIRES_FORMAT).to_string());
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }
}

// ──────────────────── jar seam ────────────────────

/// Read/write access to the browser cookie store.
pub trait CookieJar {
    /// Current value of `name`, if set and not expired.
    fn get(&self, name: &str) -> Option<String>;

    /// Store `cookie`. Fails when the store refuses the assignment.
    fn set(&mut self, cookie: SetCookie) -> Result<()>;

    fn remove(&mut self, name: &str) -> Result<()> {
        self.set(SetCookie::expired(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredCookie {
    value: String,
    expires: Option<DateTime<Utc>>,
    secure: bool,
}

/// In-memory `document.cookie`. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct DocumentCookieJar {
    cookies: Arc<Mutex<BTreeMap<String, StoredCookie>>>,
}

impl DocumentCookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a raw `document.cookie = "..."` assignment.
    ///
    /// The first `;`-separated part is `name=value`; `expires` and `Secure`
    /// attributes are honoured, others (`path`, `domain`) are accepted and
    /// ignored. Assignments without `=` are dropped, as browsers do.
    pub fn assign(&self, assignment: &str) {
        self.assign_at(assignment, Utc::now());
    }

    fn assign_at(&self, assignment: &str, now: DateTime<Utc>) {
        let mut parts = split_semicolons(assignment).into_iter();
        let Some((name, value)) = parts.next().and_then(|p| p.split_once('=')) else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let mut expires = None;
        let mut secure = false;
        for attr in parts {
            let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
            if key.trim().eq_ignore_ascii_case("expires") {
                expires = DateTime::parse_from_rfc2822(val.trim())
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc));
            } else if key.trim().eq_ignore_ascii_case("secure") {
                secure = true;
            }
        }

        let mut cookies = self.cookies.lock();
        if expires.is_some_and(|at| at <= now) {
            cookies.remove(name);
        } else {
            cookies.insert(
                name.to_string(),
                StoredCookie {
                    value: value.trim().to_string(),
                    expires,
                    secure,
                },
            );
        }
    }

    /// The `document.cookie` read form: `a=b; c=d`.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        let now = Utc::now();
        self.cookies
            .lock()
            .iter()
            .filter(|(_, c)| c.expires.is_none_or(|at| at > now))
            .map(|(name, c)| format!("{name}={}", c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Expiry recorded for `name`, if any.
    #[must_use]
    pub fn expires(&self, name: &str) -> Option<DateTime<Utc>> {
        self.cookies.lock().get(name).and_then(|c| c.expires)
    }

    /// Whether `name` was stored with the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self, name: &str) -> bool {
        self.cookies.lock().get(name).is_some_and(|c| c.secure)
    }

    /// Names of every live cookie.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let header = self.cookie_header();
        split_semicolons(&header)
            .into_iter()
            .filter_map(|pair| pair.split_once('=').map(|(n, _)| n.to_string()))
            .collect()
    }
}

impl CookieJar for DocumentCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let header = self.cookie_header();
        cookie_from_header(&header, name).map(str::to_string)
    }

    fn set(&mut self, cookie: SetCookie) -> Result<()> {
        let size = cookie.name.len() + cookie.value.len();
        if cookie.name.trim().is_empty() || size > MAX_COOKIE_BYTES {
            return Err(ConsentError::CookieRefused {
                name: cookie.name,
                details: format!("{size} bytes of name and value, limit {MAX_COOKIE_BYTES}"),
            });
        }
        self.assign(&cookie.to_cookie_string());
        Ok(())
    }
}

/// Find `name` in a `a=b; c=d` header.
#[must_use]
pub fn cookie_from_header<'h>(header: &'h str, name: &str) -> Option<&'h str> {
    split_semicolons(header).into_iter().find_map(|pair| {
        pair.split_once('=')
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| v)
    })
}

fn split_semicolons(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for idx in memchr::memchr_iter(b';', raw.as_bytes()) {
        parts.push(raw[start..idx].trim());
        start = idx + 1;
    }
    parts.push(raw[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

// ──────────────────── consent store ────────────────────

/// What the jar holds under the consent cookie name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredConsent {
    /// No consent cookie (first visit).
    Missing,
    /// Cookie present but unusable; treated as missing.
    Malformed { raw: String, details: String },
    Found(PreferencesRecord),
}

impl StoredConsent {
    #[must_use]
    pub fn into_record(self) -> Option<PreferencesRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::Missing | Self::Malformed { .. } => None,
        }
    }
}

/// Result of a successful consent write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Cookie value written (merged, versioned).
    pub value: String,
    /// Per rejected category, the cookies that were removed.
    pub cleared: Vec<(String, Vec<String>)>,
}

/// Consent-cookie policy bound to a configuration.
#[derive(Debug, Clone, Copy)]
pub struct ConsentStore<'a> {
    config: &'a Config,
}

impl<'a> ConsentStore<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie.name
    }

    pub fn read(&self, jar: &impl CookieJar) -> StoredConsent {
        let Some(raw) = jar.get(&self.config.cookie.name) else {
            return StoredConsent::Missing;
        };
        match codec::try_decode(&raw) {
            Ok(record) => StoredConsent::Found(record),
            Err(ConsentError::MalformedCookie { details }) => {
                StoredConsent::Malformed { raw, details }
            }
            Err(other) => StoredConsent::Malformed {
                raw,
                details: other.to_string(),
            },
        }
    }

    /// Configured defaults, used when nothing is stored yet.
    #[must_use]
    pub fn defaults(&self) -> PreferencesRecord {
        let mut record = PreferencesRecord::new(self.config.cookie.version);
        for (name, category) in &self.config.categories {
            record.set(name.clone(), Consent::from(category.default));
        }
        record
    }

    /// Stored consent is at least the configured schema version.
    #[must_use]
    pub fn is_current(&self, record: &PreferencesRecord) -> bool {
        record.version() >= self.config.cookie.version
    }

    /// Merge `choices` over the stored consent (or the defaults), write the
    /// cookie, and remove the cookies of every category `choices` rejects.
    pub fn write(
        &self,
        jar: &mut impl CookieJar,
        choices: &PreferencesRecord,
    ) -> Result<WriteReceipt> {
        self.write_at(jar, choices, Utc::now())
    }

    pub(crate) fn write_at(
        &self,
        jar: &mut impl CookieJar,
        choices: &PreferencesRecord,
        now: DateTime<Utc>,
    ) -> Result<WriteReceipt> {
        let mut merged = self
            .read(&*jar)
            .into_record()
            .unwrap_or_else(|| self.defaults());
        merged.merge_from(choices);
        merged.set_version(self.config.cookie.version);

        let value = codec::encode(&merged)?;
        jar.set(
            SetCookie::new(self.config.cookie.name.clone(), value.clone())
                .with_path(self.config.cookie.path.clone())
                .expiring_in_days(self.config.cookie.expiry_days, now)
                .secure(self.config.cookie.secure),
        )?;

        let mut cleared = Vec::new();
        for (category, consent) in choices.iter() {
            if consent != Consent::Rejected {
                continue;
            }
            let Some(config) = self.config.categories.get(category) else {
                continue;
            };
            let removed: Vec<String> = config
                .cookies
                .iter()
                .filter(|name| jar.get(name).is_some())
                .cloned()
                .collect();
            for name in &removed {
                jar.remove(name)?;
            }
            if !removed.is_empty() {
                cleared.push((category.to_string(), removed));
            }
        }

        Ok(WriteReceipt { value, cleared })
    }

    /// Whether `cookie_name` may be set under `consent`. The consent cookie
    /// is essential; category cookies need that category accepted; cookies no
    /// category claims are refused.
    #[must_use]
    pub fn allows_cookie(&self, cookie_name: &str, consent: Option<&PreferencesRecord>) -> bool {
        if cookie_name == self.config.cookie.name {
            return true;
        }
        let Some(category) = self.config.category_of_cookie(cookie_name) else {
            return false;
        };
        match consent {
            Some(record) => record.get(category) == Consent::Accepted,
            None => self
                .config
                .categories
                .get(category)
                .is_some_and(|c| c.default),
        }
    }

    /// Set `cookie` only when the stored consent allows it.
    pub fn set_if_allowed(&self, jar: &mut impl CookieJar, cookie: SetCookie) -> Result<bool> {
        let consent = self.read(&*jar).into_record();
        if !self.allows_cookie(&cookie.name, consent.as_ref()) {
            return Ok(false);
        }
        jar.set(cookie)?;
        Ok(true)
    }

    /// Categories known to the configuration.
    #[must_use]
    pub fn categories(&self) -> BTreeSet<&str> {
        self.config.categories.keys().map(String::as_str).collect()
    }
}
