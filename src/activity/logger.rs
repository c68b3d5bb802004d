use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::BusdashConfig;

// ---------------------------------------------------------------------------
// Activity entry (JSONL)
// ---------------------------------------------------------------------------

/// A single line of the activity log (`~/.busdash/activity.jsonl`).
///
/// Records what happened in a dashboard session. Passwords never appear
/// here; rejected logins carry only the attempted username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    /// Event kind, e.g. `"login_accepted"` or `"navigated"`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub username: Option<String>,
    /// Kind-specific detail: a role, a section id, or a route id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

/// Session events the dashboard reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    LoginAccepted,
    LoginRejected,
    SessionStarted,
    LoggedOut,
    Navigated,
    RouteSelected,
    ScheduleApproved,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginAccepted => "login_accepted",
            Self::LoginRejected => "login_rejected",
            Self::SessionStarted => "session_started",
            Self::LoggedOut => "logged_out",
            Self::Navigated => "navigated",
            Self::RouteSelected => "route_selected",
            Self::ScheduleApproved => "schedule_approved",
        }
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Best-effort JSONL sink for session activity.
///
/// A disabled log (no path) drops every record. Write failures are ignored
/// so logging can never fail a user action.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    /// Log to the default location when `[logging] enabled` is set.
    pub fn from_config(config: &BusdashConfig) -> Self {
        if config.logging.enabled {
            Self {
                path: activity_log_path(),
            }
        } else {
            Self::disabled()
        }
    }

    pub fn to_file(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    pub fn record(&self, kind: ActivityKind, username: Option<&str>, detail: Option<&str>) {
        let Some(path) = &self.path else {
            return;
        };

        let entry = ActivityEntry {
            timestamp: Utc::now().to_rfc3339(),
            kind: kind.as_str().to_string(),
            username: username.map(|s| s.to_string()),
            detail: detail.map(|s| s.to_string()),
        };

        let _ = append_entry(path, &entry);
    }

    /// Read every entry back. Malformed lines are skipped.
    pub fn read_all(&self) -> Vec<ActivityEntry> {
        match &self.path {
            Some(path) => read_entries(path),
            None => Vec::new(),
        }
    }

    /// Entries from the last `days` days; all entries when `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<ActivityEntry> {
        let entries = self.read_all();

        let Some(days) = days else {
            return entries;
        };

        let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
        entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_entry(path: &Path, entry: &ActivityEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

fn read_entries(path: &Path) -> Vec<ActivityEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
        .collect()
}

/// Return the path to the activity log file.
pub fn activity_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".busdash").join("activity.jsonl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::to_file(dir.path().join("nested").join("activity.jsonl"));

        log.record(
            ActivityKind::LoginAccepted,
            Some("admin"),
            Some("Administrator"),
        );
        log.record(ActivityKind::Navigated, Some("admin"), Some("analytics"));

        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "login_accepted");
        assert_eq!(entries[1].detail.as_deref(), Some("analytics"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        fs::write(&path, "not json\n").unwrap();
        let log = ActivityLog::to_file(path);
        log.record(ActivityKind::LoggedOut, Some("viewer"), None);
        assert_eq!(log.read_all().len(), 1);
    }

    #[test]
    fn disabled_log_drops_everything() {
        let log = ActivityLog::disabled();
        log.record(ActivityKind::LoginRejected, Some("x"), None);
        assert!(!log.is_enabled());
        assert!(log.read_all().is_empty());
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let entry = ActivityEntry {
            timestamp: "t".to_string(),
            kind: "logged_out".to_string(),
            username: None,
            detail: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("username"));
        assert!(!json.contains("detail"));
    }
}
