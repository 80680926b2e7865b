#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use cookies_page::core::config::Config;
use cookies_page::cookie::jar::DocumentCookieJar;
use cookies_page::form::headless::HeadlessPage;
use cookies_page::form::runtime::{CookiesPage, InitOutcome};
use cookies_page::logger::jsonl::{JsonlConfig, JsonlWriter};
use serde_json::Value;

pub const CONSENT_COOKIE: &str = "design_system_cookies_policy";

pub type Page = CookiesPage<HeadlessPage, DocumentCookieJar>;

/// One page load with its activity log on disk.
pub struct Visit {
    pub outcome: InitOutcome<HeadlessPage, DocumentCookieJar>,
    pub log_path: PathBuf,
}

impl Visit {
    pub fn page(self) -> Page {
        let log = self.log_path.display().to_string();
        self.outcome
            .attached()
            .unwrap_or_else(|| panic!("page did not attach; log: {log}"))
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn case_log_path(case_name: &str) -> PathBuf {
    let root = std::env::temp_dir().join("ckp-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");
    root.join(format!("{}-{}.jsonl", sanitize(case_name), now_millis()))
}

/// Load `markup` against `jar`, logging activity for `case_name`.
pub fn visit_with(case_name: &str, markup: HeadlessPage, jar: &DocumentCookieJar) -> Visit {
    let log_path = case_log_path(case_name);
    let mut config = Config::default();
    config.logging.jsonl_path = log_path.clone();
    config.logging.fallback_path = None;
    let writer = JsonlWriter::open(JsonlConfig::from(&config.logging));
    let outcome = CookiesPage::init(markup, jar.clone(), config, Box::new(writer));
    Visit { outcome, log_path }
}

/// Load the design-system cookies page (one `analytics` category).
pub fn visit(case_name: &str, jar: &DocumentCookieJar) -> Page {
    visit_with(case_name, HeadlessPage::design_system(), jar).page()
}

/// Parsed JSONL activity log.
pub fn log_events(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).expect("log line is JSON"))
        .collect()
}
