//! CLI command implementations for busdash.
//!
//! Provides subcommand handlers for:
//! - `busdash demo` — scripted walkthrough of a dashboard session
//! - `busdash credentials` — the demo login table
//! - `busdash routes` / `busdash route <id>` — route analytics
//! - `busdash events` / `busdash news` — calendar and news feed
//! - `busdash history` — summary of the activity log
//! - `busdash config show|init|set|reset` — configuration management

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use colored::Colorize;

use crate::activity::ActivityLog;
use crate::activity::reporter::{self, ActivitySummary};
use crate::config;
use crate::dashboard::{Dashboard, Section, Severity};
use crate::data::ReferenceData;
use crate::view::{EventCard, Frame, MetricsView, NewsCard, RouteView, format_indian};

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// busdash demo
// ---------------------------------------------------------------------------

/// Run a scripted session in virtual time and print what the user would see.
pub fn run_demo(username: &str, minutes: u32, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let data = ReferenceData::builtin();
    let password = data
        .directory
        .accounts()
        .iter()
        .find(|a| a.username == username)
        .map(|a| a.password.clone())
        .with_context(|| format!("no demo account named '{username}'"))?;

    let mut dashboard = Dashboard::new(&cfg, data, ActivityLog::from_config(&cfg));
    let login_delay = Duration::from_millis(cfg.timing.login_delay_ms);
    let nav_delay = Duration::from_millis(cfg.timing.navigation_delay_ms);
    let period = Duration::from_secs(cfg.timing.refresh_interval_secs.max(1));

    let mut frames: Vec<(String, Frame)> = Vec::new();
    let table = format == OutputFormat::Table;

    if table {
        println!("{}", "busdash Live Demo".bold().cyan());
        println!("{}", "=".repeat(60));
    }

    // 1. A rejected login
    step(table, "1", "Signing in with a wrong password...");
    if dashboard.login(username, "wrong-password").is_err() {
        print_notification(table, &dashboard.frame());
    }
    frames.push(("rejected_login".into(), dashboard.frame()));

    // 2. The real login
    step(table, "2", &format!("Signing in as {username}..."));
    let accepted = dashboard
        .login(username, &password)
        .map_err(|e| anyhow::anyhow!("demo login failed: {e}"))?;
    print_notification(table, &dashboard.frame());
    if !accepted.committed {
        dashboard.advance(login_delay);
    }
    if table {
        println!(
            "   {} {}",
            "✓".green(),
            format!("Welcome, {}", accepted.role).bold()
        );
        println!("   {} {}", "ℹ".blue(), accepted.department.dimmed());
        print_metrics(&MetricsView::from(dashboard.metrics()));
    }
    frames.push(("logged_in".into(), dashboard.frame()));

    // 3. Every section
    step(table, "3", "Touring the sections...");
    for section in Section::ALL {
        dashboard.navigate(section);
        dashboard.advance(nav_delay);
        if table {
            println!("   {} {}", "→".cyan(), section.label().bold());
        }
        match section {
            Section::Analytics => {
                let routes = &dashboard.data().routes;
                let route_ids: Vec<String> = routes.iter().map(|r| r.id.clone()).collect();
                for id in route_ids {
                    if let Some(view) = dashboard.select_route(&id)
                        && table
                    {
                        print_route_line(&view);
                    }
                }
            }
            Section::Scheduler => {
                dashboard.approve_schedule();
                print_notification(table, &dashboard.frame());
            }
            Section::Events if table => {
                for card in dashboard.data().events.iter().take(3).map(EventCard::from) {
                    println!(
                        "     {:<14} {:<18} {}",
                        card.date,
                        card.name,
                        card.impact.dimmed()
                    );
                }
            }
            Section::News if table => {
                for card in dashboard.data().news.iter().take(2).map(NewsCard::from) {
                    println!("     {} {}", card.date.dimmed(), card.title);
                }
            }
            _ => {}
        }
        frames.push((section.id().to_string(), dashboard.frame()));
    }

    // 4. Live updates
    step(
        table,
        "4",
        &format!("Letting {minutes} minute(s) pass with live updates..."),
    );
    let total = Duration::from_secs(u64::from(minutes) * 60);
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        let before = dashboard.refresh_count();
        dashboard.advance(period);
        elapsed += period;
        if table && dashboard.refresh_count() > before {
            let m = MetricsView::from(dashboard.metrics());
            println!(
                "   {} +{:>4}s  perf {}  buses {}  passengers {}  savings {}",
                "↻".cyan(),
                elapsed.as_secs(),
                m.performance,
                m.active_buses,
                m.passengers_today,
                m.weekly_savings
            );
        }
    }
    frames.push(("live_updates".into(), dashboard.frame()));

    // 5. Logout stops the loop
    step(table, "5", "Signing out...");
    dashboard.logout();
    print_notification(table, &dashboard.frame());
    let refreshes = dashboard.refresh_count();
    dashboard.advance(period * 3);
    if table {
        let stopped = dashboard.refresh_count() == refreshes && !dashboard.is_refresh_running();
        print_check(stopped, "no refreshes after logout");
        print_check(dashboard.is_consistent(), "session, view and loop agree");
    }
    frames.push(("logged_out".into(), dashboard.frame()));

    if format == OutputFormat::Json {
        let steps: Vec<serde_json::Value> = frames
            .into_iter()
            .map(|(name, frame)| serde_json::json!({ "step": name, "frame": frame }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&steps)?);
    } else {
        println!();
        println!("{}", "Demo complete.".green().bold());
    }

    Ok(())
}

fn step(table: bool, n: &str, message: &str) {
    if table {
        println!("\n{}. {}", n.bold(), message);
    }
}

fn print_notification(table: bool, frame: &Frame) {
    if !table {
        return;
    }
    if let Some(n) = &frame.notification {
        match n.severity {
            Severity::Success => println!("   {} {}", "✓".green(), n.message),
            Severity::Error => println!("   {} {}", "✗".red(), n.message),
        }
    }
}

fn print_check(ok: bool, label: &str) {
    let mark = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("   {mark} {label}");
}

fn print_metrics(m: &MetricsView) {
    let rows = [
        ("Performance today:", &m.performance),
        ("Active buses:", &m.active_buses),
        ("Passengers today:", &m.passengers_today),
        ("Weekly savings:", &m.weekly_savings),
        ("Prediction accuracy:", &m.prediction_accuracy),
        ("System uptime:", &m.system_uptime),
    ];
    for (label, value) in rows {
        println!("   {:<22} {}", label.bold(), value);
    }
}

fn print_route_line(view: &RouteView) {
    let peak = view.actual.iter().copied().max().unwrap_or(0);
    println!(
        "     {:<24} accuracy {:>6}  peak {}",
        view.name,
        view.accuracy_label,
        format_indian(u64::from(peak)).dimmed()
    );
}

// ---------------------------------------------------------------------------
// busdash credentials
// ---------------------------------------------------------------------------

pub fn run_credentials() -> Result<()> {
    let data = ReferenceData::builtin();
    println!("{}", "Demo Credentials".bold().cyan());
    println!(
        "  {:<12} {:<13} {:<20} Department",
        "Username", "Password", "Role"
    );
    println!("  {}", "-".repeat(66));
    for account in data.directory.accounts() {
        println!(
            "  {:<12} {:<13} {:<20} {}",
            account.username,
            account.password,
            account.role,
            account.department.dimmed()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// busdash routes / route <id>
// ---------------------------------------------------------------------------

pub fn run_routes(format: OutputFormat) -> Result<()> {
    let data = ReferenceData::builtin();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&data.routes)?);
        return Ok(());
    }

    println!("{}", "Routes".bold().cyan());
    println!(
        "  {:<7} {:<24} {:>6} {:>7} {:>6} {:>11} {:>9}",
        "Id", "Name", "Km", "Minutes", "Buses", "Passengers", "Accuracy"
    );
    println!("  {}", "-".repeat(76));
    for r in &data.routes {
        println!(
            "  {:<7} {:<24} {:>6} {:>7} {:>6} {:>11} {:>8}%",
            r.id,
            r.name,
            r.distance_km,
            r.travel_time_min,
            r.current_buses,
            format_indian(u64::from(r.daily_passengers)),
            r.accuracy
        );
    }
    Ok(())
}

pub fn run_route(route_id: &str, format: OutputFormat) -> Result<()> {
    let cfg = config::BusdashConfig::instant(0);
    let mut dashboard = Dashboard::new(&cfg, ReferenceData::builtin(), ActivityLog::disabled());
    let view = dashboard
        .select_route(route_id)
        .with_context(|| format!("unknown route '{route_id}'"))?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", view.name.bold().cyan());
    println!(
        "  {} {}",
        "Prediction accuracy:".bold(),
        view.accuracy_label
    );
    println!();
    println!("  {:<5} {:>8} {:>10}", "Day", "Actual", "Predicted");
    println!("  {}", "-".repeat(25));
    for ((day, actual), predicted) in view.days.iter().zip(&view.actual).zip(&view.predicted) {
        println!("  {:<5} {:>8} {:>10.0}", day, actual, predicted);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// busdash events / news
// ---------------------------------------------------------------------------

pub fn run_events(today: Option<&str>, format: OutputFormat) -> Result<()> {
    let data = ReferenceData::builtin();
    let events = match today {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("expected a YYYY-MM-DD date, got '{raw}'"))?;
            data.upcoming_events(date)
        }
        None => data.events.clone(),
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("{}", "No upcoming events.".yellow());
        return Ok(());
    }

    println!("{}", "Upcoming Events".bold().cyan());
    for card in events.iter().map(EventCard::from) {
        println!(
            "  {:<13} {:<18} {:<9} {:>5}  {}",
            card.date,
            card.name,
            card.category,
            card.impact,
            card.days_away.dimmed()
        );
    }
    Ok(())
}

pub fn run_news(format: OutputFormat) -> Result<()> {
    let data = ReferenceData::builtin();
    let cards: Vec<NewsCard> = data.news.iter().map(NewsCard::from).collect();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    println!("{}", "Transport News".bold().cyan());
    for card in cards {
        println!();
        println!(
            "  {} {}",
            card.category.to_uppercase().cyan(),
            card.date.dimmed()
        );
        println!("  {}", card.title.bold());
        println!("  {}", card.summary);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// busdash history
// ---------------------------------------------------------------------------

pub fn run_history(days: Option<u32>, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let log = ActivityLog::from_config(&cfg);
    if !log.is_enabled() {
        println!(
            "{}",
            "Activity logging is disabled ([logging] enabled = false).".yellow()
        );
        return Ok(());
    }

    let summary = reporter::summarize(&log.read_since_days(days));
    if summary.total_events == 0 {
        println!(
            "{}",
            "No activity yet. Run `busdash demo` to record a session.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_history_json(&summary)?,
        OutputFormat::Table => print_history_table(&summary),
    }
    Ok(())
}

fn print_history_table(s: &ActivitySummary) {
    println!("{}", "busdash Activity".bold().cyan());
    println!("{}", "=".repeat(40));
    println!("  {} {}", "Events:          ".bold(), s.total_events);
    println!("  {} {}", "Logins accepted: ".bold(), s.logins_accepted);
    println!(
        "  {} {} ({:.0}%)",
        "Logins rejected: ".bold(),
        s.logins_rejected,
        s.rejection_pct()
    );
    println!("  {} {}", "Logouts:         ".bold(), s.logouts);
    println!("  {} {}", "Approvals:       ".bold(), s.approvals);

    if !s.sections.is_empty() {
        println!();
        println!("{}", "Sections visited".bold().cyan());
        for (section, count) in &s.sections {
            println!("  {:<12} {:>5}", section, count);
        }
    }
    if !s.users.is_empty() {
        println!();
        println!("{}", "Sign-ins by user".bold().cyan());
        for (user, count) in &s.users {
            println!("  {:<12} {:>5}", user, count);
        }
    }
}

fn print_history_json(s: &ActivitySummary) -> Result<()> {
    let sections: Vec<_> = s
        .sections
        .iter()
        .map(|(k, v)| serde_json::json!({ "section": k, "count": v }))
        .collect();
    let users: Vec<_> = s
        .users
        .iter()
        .map(|(k, v)| serde_json::json!({ "username": k, "count": v }))
        .collect();
    let value = serde_json::json!({
        "total_events": s.total_events,
        "logins_accepted": s.logins_accepted,
        "logins_rejected": s.logins_rejected,
        "logouts": s.logouts,
        "approvals": s.approvals,
        "sections": sections,
        "users": users,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// busdash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective busdash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.busdash/config.toml");
    print_source(project_exists, ".busdash.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "BUSDASH_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            format!("{name} (not found)").dimmed()
        );
    }
}

/// Initialize a default config file at `~/.busdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parsing() {
        let cases = [
            (Some("json"), OutputFormat::Json),
            (Some("table"), OutputFormat::Table),
            (Some("csv"), OutputFormat::Table),
            (None, OutputFormat::Table),
        ];
        for (input, expected) in cases {
            assert_eq!(OutputFormat::from_str_opt(input), expected);
        }
    }

    #[test]
    fn route_command_rejects_unknown_route() {
        assert!(run_route("tp_zz", OutputFormat::Table).is_err());
        assert!(run_route("tp_pc", OutputFormat::Json).is_ok());
    }

    #[test]
    fn events_command_validates_date() {
        assert!(run_events(Some("12/09/2025"), OutputFormat::Table).is_err());
        assert!(run_events(Some("2025-10-01"), OutputFormat::Json).is_ok());
    }
}
