/// Refresh loop, metric jitter, and notification expiry tests.
use std::time::Duration;

use busdash::activity::ActivityLog;
use busdash::config::BusdashConfig;
use busdash::dashboard::Dashboard;
use busdash::data::ReferenceData;
use busdash::metrics::FLOW_JITTER;

fn dashboard(seed: u64) -> Dashboard {
    Dashboard::new(
        &BusdashConfig::instant(seed),
        ReferenceData::builtin(),
        ActivityLog::disabled(),
    )
}

const PERIOD: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Loop lifecycle
// ---------------------------------------------------------------------------

#[test]
fn loop_refreshes_once_per_period() {
    let mut d = dashboard(11);
    d.login("admin", "admin123").unwrap();
    assert_eq!(d.refresh_count(), 1);

    d.advance(Duration::from_secs(29));
    assert_eq!(d.refresh_count(), 1);
    d.advance(Duration::from_secs(1));
    assert_eq!(d.refresh_count(), 2);

    d.advance(PERIOD * 10);
    assert_eq!(d.refresh_count(), 12);
    assert!(d.is_refresh_running());
}

#[test]
fn no_refresh_after_logout() {
    let mut d = dashboard(11);
    d.login("manager", "manager123").unwrap();
    d.advance(PERIOD * 2);
    d.logout();
    let count = d.refresh_count();

    d.advance(PERIOD * 20);
    assert_eq!(d.refresh_count(), count);
    assert!(!d.is_refresh_running());
    assert!(d.is_consistent());
}

#[test]
fn relogin_runs_a_single_loop() {
    let mut d = dashboard(11);
    d.login("admin", "admin123").unwrap();
    d.login("viewer", "viewer123").unwrap();
    d.logout();
    d.login("operator", "operator123").unwrap();
    let start = d.refresh_count();

    d.advance(PERIOD * 4);
    assert_eq!(d.refresh_count(), start + 4);
}

#[test]
fn logged_out_dashboard_never_refreshes() {
    let mut d = dashboard(11);
    d.advance(PERIOD * 100);
    assert_eq!(d.refresh_count(), 0);
    assert!(d.is_consistent());
}

// ---------------------------------------------------------------------------
// Jitter bounds
// ---------------------------------------------------------------------------

#[test]
fn thousand_refreshes_stay_within_bounds() {
    let mut d = dashboard(2024);
    d.login("admin", "admin123").unwrap();
    let baseline = d.data().baseline;
    let flow = d.data().passenger_flow.clone();

    for _ in 0..1000 {
        d.advance(PERIOD);
        let m = d.metrics();
        assert!(m.within_bounds(&baseline), "out of band: {m:?}");
        assert!((0.0..=100.0).contains(&m.performance_pct));
        assert!((0.0..=100.0).contains(&m.system_uptime_pct));

        for (point, base) in d.passenger_flow().iter().zip(&flow) {
            assert_eq!(point.label, base.label);
            assert!(point.value >= 0.0);
            assert!((point.value - base.value).abs() <= FLOW_JITTER + 1e-9);
        }
    }
    assert_eq!(d.refresh_count(), 1001);
}

#[test]
fn same_seed_gives_same_metrics() {
    let mut a = dashboard(99);
    let mut b = dashboard(99);
    a.login("admin", "admin123").unwrap();
    b.login("admin", "admin123").unwrap();
    for _ in 0..5 {
        a.advance(PERIOD);
        b.advance(PERIOD);
        assert_eq!(a.metrics(), b.metrics());
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[test]
fn notification_expires_after_ttl() {
    let mut d = dashboard(5);
    d.login("admin", "admin123").unwrap();
    assert!(d.notification().is_some());

    d.advance(Duration::from_millis(2999));
    assert!(d.notification().is_some());
    d.advance(Duration::from_millis(1));
    assert!(d.notification().is_none());
}

#[test]
fn newer_notification_outlives_older_expiry() {
    let mut d = dashboard(5);
    d.login("admin", "admin123").unwrap();
    d.advance(Duration::from_millis(2000));
    d.logout();

    // The welcome message's expiry passes; the logout message stays.
    d.advance(Duration::from_millis(1500));
    assert_eq!(d.notification().unwrap().message, "Logged out successfully");

    d.advance(Duration::from_millis(1500));
    assert!(d.notification().is_none());
    assert_eq!(d.notification_history().count(), 2);
}
