//! Activity reporter — aggregates the JSONL activity log for
//! `busdash history`.

use std::collections::HashMap;

use super::logger::ActivityEntry;

/// Summary of recorded session activity.
#[derive(Debug, Default, PartialEq)]
pub struct ActivitySummary {
    pub total_events: usize,
    pub logins_accepted: usize,
    pub logins_rejected: usize,
    pub logouts: usize,
    pub approvals: usize,
    /// Navigation counts per section, most visited first.
    pub sections: Vec<(String, usize)>,
    /// Accepted logins per user, most active first.
    pub users: Vec<(String, usize)>,
}

impl ActivitySummary {
    /// Share of login attempts that were rejected, as a percentage.
    pub fn rejection_pct(&self) -> f64 {
        let attempts = self.logins_accepted + self.logins_rejected;
        if attempts == 0 {
            0.0
        } else {
            self.logins_rejected as f64 / attempts as f64 * 100.0
        }
    }
}

pub fn summarize(entries: &[ActivityEntry]) -> ActivitySummary {
    let mut summary = ActivitySummary {
        total_events: entries.len(),
        ..ActivitySummary::default()
    };
    let mut sections: HashMap<String, usize> = HashMap::new();
    let mut users: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        match entry.kind.as_str() {
            "login_accepted" => {
                summary.logins_accepted += 1;
                if let Some(user) = &entry.username {
                    *users.entry(user.clone()).or_default() += 1;
                }
            }
            "login_rejected" => summary.logins_rejected += 1,
            "logged_out" => summary.logouts += 1,
            "schedule_approved" => summary.approvals += 1,
            "navigated" => {
                if let Some(section) = &entry.detail {
                    *sections.entry(section.clone()).or_default() += 1;
                }
            }
            _ => {}
        }
    }

    summary.sections = ranked(sections);
    summary.users = ranked(users);
    summary
}

/// Sort by count descending, then name for a stable order.
fn ranked(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: &str, user: Option<&str>, detail: Option<&str>) -> ActivityEntry {
        ActivityEntry {
            timestamp: "2025-09-11T10:00:00+00:00".to_string(),
            kind: kind.to_string(),
            username: user.map(str::to_string),
            detail: detail.map(str::to_string),
        }
    }

    #[test]
    fn empty_log_summarizes_to_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary, ActivitySummary::default());
        assert_eq!(summary.rejection_pct(), 0.0);
    }

    #[test]
    fn counts_kinds_sections_and_users() {
        let entries = vec![
            entry("login_rejected", Some("admin"), None),
            entry("login_accepted", Some("admin"), Some("Administrator")),
            entry("navigated", Some("admin"), Some("analytics")),
            entry("navigated", Some("admin"), Some("news")),
            entry("navigated", Some("admin"), Some("analytics")),
            entry("schedule_approved", Some("admin"), None),
            entry("logged_out", Some("admin"), None),
            entry("login_accepted", Some("viewer"), Some("Analytics Viewer")),
            entry("login_accepted", Some("admin"), Some("Administrator")),
        ];
        let s = summarize(&entries);
        assert_eq!(s.total_events, 9);
        assert_eq!(s.logins_accepted, 3);
        assert_eq!(s.logins_rejected, 1);
        assert_eq!(s.logouts, 1);
        assert_eq!(s.approvals, 1);
        assert_eq!(s.sections[0], ("analytics".to_string(), 2));
        assert_eq!(s.users[0], ("admin".to_string(), 2));
        assert!((s.rejection_pct() - 25.0).abs() < 1e-9);
    }
}
