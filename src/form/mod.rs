//! Cookies-page form: markup seams, the Elm-style reducer, and the runtime
//! that wires both to the consent cookie.
//!
//! Layering follows `binding → model/update → runtime`: the reducer never
//! touches the page, the runtime never decides what to show.

#![allow(missing_docs)]

pub mod binding;
pub mod headless;
pub mod model;
pub mod runtime;
pub mod selections;
pub mod update;
pub mod validator;

#[cfg(test)]
mod test_properties;

pub use runtime::{CookiesPage, InitOutcome, SubmitOutcome};
