//! Consent cookie: record codec and the cookie store it is persisted in.

pub mod codec;
pub mod jar;
