//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use cookies_page::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{ConsentError, Result};

// Cookie
pub use crate::cookie::codec::{Consent, PreferencesRecord};
pub use crate::cookie::jar::{ConsentStore, CookieJar, DocumentCookieJar, SetCookie};

// Form
pub use crate::form::binding::{PageBinding, RadioValue, Viewport};
pub use crate::form::headless::HeadlessPage;
pub use crate::form::runtime::{CookiesPage, InitOutcome, SubmitOutcome};

// Logger
pub use crate::logger::activity::{ActivityEvent, ActivitySink, MemorySink, NullSink};
pub use crate::logger::jsonl::{JsonlConfig, JsonlWriter};
