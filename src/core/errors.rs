//! CKP-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, ConsentError>;

/// Top-level error type for the cookies page.
#[derive(Debug, Error)]
pub enum ConsentError {
    #[error("[CKP-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CKP-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CKP-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CKP-2001] malformed consent cookie: {details}")]
    MalformedCookie { details: String },

    #[error("[CKP-2002] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CKP-2003] cookie {name:?} refused: {details}")]
    CookieRefused { name: String, details: String },

    #[error("[CKP-3001] cookies page markup is missing {element}")]
    MissingElement { element: &'static str },

    #[error("[CKP-3002] error summary has no link for category {category:?}")]
    MissingSummaryLink { category: String },

    #[error("[CKP-3004] form group category {category:?} cannot be stored in the consent cookie")]
    InvalidCategory { category: String },

    #[error("[CKP-3003] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConsentError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CKP-1001",
            Self::MissingConfig { .. } => "CKP-1002",
            Self::ConfigParse { .. } => "CKP-1003",
            Self::MalformedCookie { .. } => "CKP-2001",
            Self::Serialization { .. } => "CKP-2002",
            Self::CookieRefused { .. } => "CKP-2003",
            Self::MissingElement { .. } => "CKP-3001",
            Self::MissingSummaryLink { .. } => "CKP-3002",
            Self::Io { .. } => "CKP-3003",
            Self::InvalidCategory { .. } => "CKP-3004",
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for ConsentError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for ConsentError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
