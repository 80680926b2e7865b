//! JSONL activity log for the cookies page.
//!
//! Page events are sparse and user-driven (a load, a save), so the writer
//! holds no file handle: every entry opens the log in append mode, writes one
//! complete line and closes it again. Nothing is buffered, and an external
//! rotation or deletion of the file is picked up on the next event.
//!
//! When a target cannot be written the writer steps down and stays there:
//! primary path, fallback path, stderr with a `[CKP-JSONL]` prefix, discard.

#![allow(missing_docs)]

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::LoggingConfig;
use crate::core::errors::{ConsentError, Result};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Log event types matching the cookies-page activity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageInit,
    PageDisabled,
    PreferencesRestored,
    StoredPreferencesIgnored,
    ValidationFailed,
    PreferencesSaved,
    CookiesCleared,
    Error,
}

/// A single JSONL log entry; all fields optional except `ts`, `event`, `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp, millisecond precision.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Consent cookie name involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
    /// Consent categories involved (form order).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Serialized cookie value written or read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Cookie schema version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// CKP error code if the action failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event,
            severity,
            cookie: None,
            categories: None,
            value: None,
            version: None,
            ok: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }
}

/// Where entries currently go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Primary,
    Fallback,
    Stderr,
    Discard,
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// A file that would grow past this many bytes is rotated first.
    pub max_size_bytes: u64,
    /// Rotated files kept as `<path>.1` (newest) to `<path>.N`.
    pub max_rotated_files: u32,
}

impl From<&LoggingConfig> for JsonlConfig {
    fn from(cfg: &LoggingConfig) -> Self {
        Self {
            path: cfg.jsonl_path.clone(),
            fallback_path: cfg.fallback_path.clone(),
            max_size_bytes: cfg.max_size_bytes,
            max_rotated_files: cfg.max_rotated_files,
        }
    }
}

/// Append-only JSONL writer with size rotation and a fallback chain.
#[derive(Debug)]
pub struct JsonlWriter {
    config: JsonlConfig,
    target: LogTarget,
}

impl JsonlWriter {
    /// Pick the first writable target. Opening never fails; at worst the
    /// writer reports to stderr.
    pub fn open(config: JsonlConfig) -> Self {
        let mut writer = Self {
            config,
            target: LogTarget::Primary,
        };
        while let Some(path) = writer.target_path() {
            match touch(path) {
                Ok(()) => break,
                Err(err) => writer.step_down(&err),
            }
        }
        writer
    }

    /// Append `entry` as one line to the current target.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[CKP-JSONL] serialize error: {e}");
                return;
            }
        };

        loop {
            match self.target {
                LogTarget::Primary | LogTarget::Fallback => {
                    let Some(path) = self.target_path() else {
                        self.target = LogTarget::Stderr;
                        continue;
                    };
                    match self.append(path, &line) {
                        Ok(()) => return,
                        Err(err) => self.step_down(&err),
                    }
                }
                LogTarget::Stderr => {
                    if write!(io::stderr(), "[CKP-JSONL] {line}").is_err() {
                        self.target = LogTarget::Discard;
                    }
                    return;
                }
                LogTarget::Discard => return,
            }
        }
    }

    #[must_use]
    pub const fn target(&self) -> LogTarget {
        self.target
    }

    fn target_path(&self) -> Option<&Path> {
        match self.target {
            LogTarget::Primary => Some(&self.config.path),
            LogTarget::Fallback => self.config.fallback_path.as_deref(),
            LogTarget::Stderr | LogTarget::Discard => None,
        }
    }

    fn step_down(&mut self, err: &ConsentError) {
        self.target = match self.target {
            LogTarget::Primary if self.config.fallback_path.is_some() => LogTarget::Fallback,
            LogTarget::Primary | LogTarget::Fallback => LogTarget::Stderr,
            LogTarget::Stderr | LogTarget::Discard => LogTarget::Discard,
        };
        let _ = writeln!(
            io::stderr(),
            "[CKP-JSONL] {err}; logging to {:?} from now on",
            self.target
        );
    }

    fn append(&self, path: &Path, line: &str) -> Result<()> {
        let size = fs::metadata(path).map_or(0, |m| m.len());
        if size > 0 && size + line.len() as u64 > self.config.max_size_bytes {
            rotate(path, self.config.max_rotated_files)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ConsentError::io(path, source))?;
        file.write_all(line.as_bytes())
            .map_err(|source| ConsentError::io(path, source))
    }
}

// ──────────────────────── helpers ────────────────────────

/// Create the file and its parent directories if missing.
fn touch(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConsentError::io(parent, source))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(drop)
        .map_err(|source| ConsentError::io(path, source))
}

/// `<path>` becomes `<path>.1`, older files shift up, `<path>.keep` drops off.
fn rotate(path: &Path, keep: u32) -> Result<()> {
    let _ = fs::remove_file(rotated_name(path, keep));
    for i in (1..keep).rev() {
        let _ = fs::rename(rotated_name(path, i), rotated_name(path, i + 1));
    }
    fs::rename(path, rotated_name(path, 1)).map_err(|source| ConsentError::io(path, source))
}

fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_at(path: PathBuf) -> JsonlConfig {
        JsonlConfig {
            path,
            fallback_path: None,
            max_size_bytes: 1024 * 1024,
            max_rotated_files: 3,
        }
    }

    fn blocked_dir(dir: &Path) -> PathBuf {
        let blocker = dir.join("not-a-dir");
        fs::write(&blocker, "file").unwrap();
        blocker
    }

    #[test]
    fn each_entry_is_one_complete_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let mut writer = JsonlWriter::open(config_at(path.clone()));

        let mut entry = LogEntry::new(EventType::PreferencesSaved, Severity::Info);
        entry.value = Some(r#"{"analytics":true,"version":1}"#.to_string());
        writer.write_entry(&entry);

        // Readable straight away; nothing waits in a buffer.
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["event"], "preferences_saved");
        assert_eq!(parsed["severity"], "info");
        assert_eq!(parsed["value"], r#"{"analytics":true,"version":1}"#);
        assert!(!contents.contains("\"cookie\""));
        assert!(!contents.contains("\"error_code\""));
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("activity.jsonl");
        let writer = JsonlWriter::open(config_at(path.clone()));
        assert_eq!(writer.target(), LogTarget::Primary);
        assert!(path.exists());
    }

    #[test]
    fn log_removed_between_visits_is_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let mut writer = JsonlWriter::open(config_at(path.clone()));

        writer.write_entry(&LogEntry::new(EventType::PageInit, Severity::Info));
        fs::remove_file(&path).unwrap();
        writer.write_entry(&LogEntry::new(EventType::ValidationFailed, Severity::Info));

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("validation_failed"));
        assert_eq!(writer.target(), LogTarget::Primary);
    }

    #[test]
    fn full_log_rotates_and_keeps_a_bounded_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rot.jsonl");
        let mut writer = JsonlWriter::open(JsonlConfig {
            max_size_bytes: 100,
            max_rotated_files: 2,
            ..config_at(path.clone())
        });

        for _ in 0..10 {
            writer.write_entry(&LogEntry::new(EventType::ValidationFailed, Severity::Info));
        }

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);
        assert!(rotated_name(&path, 1).exists());
        assert!(rotated_name(&path, 2).exists());
        assert!(!rotated_name(&path, 3).exists());
    }

    #[test]
    fn unwritable_primary_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = blocked_dir(dir.path());
        let fallback = dir.path().join("fallback.jsonl");
        let mut writer = JsonlWriter::open(JsonlConfig {
            fallback_path: Some(fallback.clone()),
            ..config_at(blocker.join("primary.jsonl"))
        });

        assert_eq!(writer.target(), LogTarget::Fallback);
        writer.write_entry(&LogEntry::new(EventType::PageDisabled, Severity::Warning));
        assert!(fs::read_to_string(&fallback).unwrap().contains("page_disabled"));
    }

    #[test]
    fn no_writable_path_means_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = blocked_dir(dir.path());
        let mut writer = JsonlWriter::open(JsonlConfig {
            fallback_path: Some(blocker.join("fallback.jsonl")),
            ..config_at(blocker.join("primary.jsonl"))
        });
        assert_eq!(writer.target(), LogTarget::Stderr);
        writer.write_entry(&LogEntry::new(EventType::Error, Severity::Critical));
        assert_eq!(writer.target(), LogTarget::Stderr);
    }

    #[test]
    fn primary_lost_after_open_steps_down() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let fallback = dir.path().join("fallback.jsonl");
        let mut writer = JsonlWriter::open(JsonlConfig {
            fallback_path: Some(fallback.clone()),
            ..config_at(logs.join("activity.jsonl"))
        });
        assert_eq!(writer.target(), LogTarget::Primary);

        fs::remove_dir_all(&logs).unwrap();
        fs::write(&logs, "now a file").unwrap();
        writer.write_entry(&LogEntry::new(EventType::PreferencesSaved, Severity::Info));

        assert_eq!(writer.target(), LogTarget::Fallback);
        assert!(fs::read_to_string(&fallback).unwrap().contains("preferences_saved"));
    }
}
