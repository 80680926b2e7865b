//! Configuration system: TOML file + env var overrides + compiled defaults.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{ConsentError, Result};

/// Name of the consent cookie written by the cookies page.
pub const CONSENT_COOKIE_NAME: &str = "design_system_cookies_policy";

/// Current consent cookie schema version.
pub const CONSENT_COOKIE_VERSION: u32 = 1;

/// Key reserved for the version tag inside the cookie JSON object.
pub const VERSION_KEY: &str = "version";

/// RFC 6265 `token`: visible ASCII minus separators.
static COOKIE_NAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[!#$%&'*+\-.^_`|~0-9A-Za-z]+$").ok());

static CATEGORY_NAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").ok());

/// Full cookies-page configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub cookie: CookieConfig,
    pub categories: BTreeMap<String, CategoryConfig>,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Attributes of the consent cookie itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CookieConfig {
    pub name: String,
    pub version: u32,
    pub expiry_days: u32,
    pub path: String,
    /// Append `Secure`; set when the page is served over https.
    pub secure: bool,
}

/// One consent category (e.g. `analytics`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CategoryConfig {
    /// Value assumed when no consent cookie exists yet.
    pub default: bool,
    /// Cookies set by this category; removed when the category is rejected.
    pub cookies: Vec<String>,
}

/// JSONL activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub jsonl_path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths used by the cookies page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(
            "analytics".to_string(),
            CategoryConfig {
                default: false,
                cookies: vec!["_ga".to_string(), "_gid".to_string()],
            },
        );
        Self {
            cookie: CookieConfig::default(),
            categories,
            logging: LoggingConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: CONSENT_COOKIE_NAME.to_string(),
            version: CONSENT_COOKIE_VERSION,
            expiry_days: 365,
            path: "/".to_string(),
            secure: false,
        }
    }
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            default: false,
            cookies: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let data_dir = home_dir().map_or_else(
            || PathBuf::from("/tmp/cookies-page"),
            |home| home.join(".local").join("share").join("cookies-page"),
        );
        Self {
            jsonl_path: data_dir.join("activity.jsonl"),
            fallback_path: Some(PathBuf::from("/tmp/cookies-page-activity.jsonl")),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let config_file = env_var("CKP_CONFIG_FILE").map_or_else(
            || {
                home_dir().map_or_else(
                    || PathBuf::from("/etc/cookies-page/config.toml"),
                    |home| {
                        home.join(".config")
                            .join("cookies-page")
                            .join("config.toml")
                    },
                )
            },
            PathBuf::from,
        );
        Self { config_file }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf)
                .map_err(|source| ConsentError::io(&path_buf, source))?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(ConsentError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the activity log.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Category owning `cookie_name`, if any category lists it.
    #[must_use]
    pub fn category_of_cookie(&self, cookie_name: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(_, cat)| cat.cookies.iter().any(|c| c == cookie_name))
            .map(|(name, _)| name.as_str())
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("CKP_COOKIE_NAME") {
            self.cookie.name = raw;
        }

        if let Some(raw) = lookup("CKP_COOKIE_VERSION") {
            self.cookie.version = parse_env_u32("CKP_COOKIE_VERSION", &raw)?;
        }

        if let Some(raw) = lookup("CKP_COOKIE_EXPIRY_DAYS") {
            self.cookie.expiry_days = parse_env_u32("CKP_COOKIE_EXPIRY_DAYS", &raw)?;
        }

        if let Some(raw) = lookup("CKP_COOKIE_SECURE") {
            self.cookie.secure = parse_env_bool("CKP_COOKIE_SECURE", &raw)?;
        }

        if let Some(raw) = lookup("CKP_LOG_PATH") {
            self.logging.jsonl_path = PathBuf::from(raw);
        }

        Ok(())
    }

    /// Check every value against its allowed range. [`Config::load`] runs
    /// this; a hand-built config must pass it before use.
    pub fn validate(&self) -> Result<()> {
        if !matches_pattern(&COOKIE_NAME_RE, &self.cookie.name) {
            return Err(ConsentError::InvalidConfig {
                details: format!(
                    "cookie.name {:?} is not a valid cookie token",
                    self.cookie.name
                ),
            });
        }

        if self.cookie.version == 0 {
            return Err(ConsentError::InvalidConfig {
                details: "cookie.version must be >= 1".to_string(),
            });
        }

        if !(1..=3650).contains(&self.cookie.expiry_days) {
            return Err(ConsentError::InvalidConfig {
                details: format!(
                    "cookie.expiry_days must be in [1, 3650], got {}",
                    self.cookie.expiry_days
                ),
            });
        }

        if !self.cookie.path.starts_with('/') {
            return Err(ConsentError::InvalidConfig {
                details: format!("cookie.path must start with '/', got {:?}", self.cookie.path),
            });
        }

        for (name, category) in &self.categories {
            if !is_valid_category_name(name) {
                return Err(ConsentError::InvalidConfig {
                    details: format!("category name {name:?} is not allowed"),
                });
            }
            for cookie in &category.cookies {
                if cookie == &self.cookie.name {
                    return Err(ConsentError::InvalidConfig {
                        details: format!(
                            "categories.{name}.cookies must not list the consent cookie"
                        ),
                    });
                }
                if !matches_pattern(&COOKIE_NAME_RE, cookie) {
                    return Err(ConsentError::InvalidConfig {
                        details: format!(
                            "categories.{name}.cookies entry {cookie:?} is not a valid cookie token"
                        ),
                    });
                }
            }
        }

        if self.logging.max_size_bytes == 0 || self.logging.max_rotated_files == 0 {
            return Err(ConsentError::InvalidConfig {
                details: "logging rotation limits must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Whether `name` can be a member of the consent cookie.
#[must_use]
pub fn is_valid_category_name(name: &str) -> bool {
    name != VERSION_KEY && matches_pattern(&CATEGORY_NAME_RE, name)
}

fn matches_pattern(re: &LazyLock<Option<Regex>>, value: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(value))
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u32(name: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|error| ConsentError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim()
        .parse::<bool>()
        .map_err(|error| ConsentError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}
