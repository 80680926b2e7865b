#![forbid(unsafe_code)]

//! Cookies page (cookies_page): the cookie-consent preferences form of a
//! design-system documentation site.
//!
//! Three layers:
//! 1. **Consent cookie**: JSON codec and the `design_system_cookies_policy`
//!    store that merges, versions and persists preferences
//! 2. **Form**: Elm-style reducer that validates the radios and decides what
//!    the page shows
//! 3. **Runtime**: attaches the reducer to a page binding, a cookie jar and
//!    an activity log
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use cookies_page::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use cookies_page::core::config::Config;
//! use cookies_page::form::runtime::{CookiesPage, InitOutcome};
//! ```

pub mod prelude;

pub mod cookie;
pub mod core;
pub mod form;
pub mod logger;
