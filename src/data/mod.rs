//! Static reference data for the dashboard.
//!
//! Everything the dashboard displays comes from here: the demo credential
//! directory, the route table with its analytics constants, the festival
//! calendar, the news feed, the weather snapshot, and chart baselines. The
//! data is built once at startup and never mutated.

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Accounts and roles
// ---------------------------------------------------------------------------

/// Something a role is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
    Delete,
    ManageUsers,
    ApproveSchedules,
    UpdateStatus,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Delete => write!(f, "delete"),
            Self::ManageUsers => write!(f, "manage_users"),
            Self::ApproveSchedules => write!(f, "approve_schedules"),
            Self::UpdateStatus => write!(f, "update_status"),
        }
    }
}

/// A demo login. Passwords are plaintext; this is a demonstration directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    pub department: String,
}

impl UserAccount {
    pub fn new(username: &str, password: &str, role: &str, department: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            role: role.to_string(),
            department: department.to_string(),
        }
    }

    /// Permissions granted to this account's role. Unknown roles can read.
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self.role.as_str() {
            "Administrator" => &[Read, Write, Delete, ManageUsers, ApproveSchedules],
            "Operations Manager" => &[Read, Write, ApproveSchedules],
            "Field Operator" => &[Read, UpdateStatus],
            _ => &[Read],
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// Ordered, immutable list of demo accounts.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    accounts: Vec<UserAccount>,
}

impl Directory {
    pub fn new(accounts: Vec<UserAccount>) -> Self {
        Self { accounts }
    }

    /// First account whose username and password both match exactly.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&UserAccount> {
        self.accounts
            .iter()
            .find(|a| a.username == username && a.password == password)
    }

    pub fn accounts(&self) -> &[UserAccount] {
        &self.accounts
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// A bus route with its display analytics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRecord {
    pub id: String,
    pub name: String,
    pub distance_km: u32,
    pub travel_time_min: u32,
    pub current_buses: u32,
    pub daily_passengers: u32,
    /// Displayed prediction accuracy, percent.
    pub accuracy: f64,
    /// Actual passenger demand, Monday through Sunday.
    pub weekly_demand: [u32; 7],
}

// ---------------------------------------------------------------------------
// Calendar events and news
// ---------------------------------------------------------------------------

/// Festival or holiday that shifts passenger demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub date: NaiveDate,
    pub name: String,
    /// Demand multiplier, e.g. `1.8` for an 80% surge.
    pub impact: f64,
    /// `major`, `national`, or `regional`.
    pub category: String,
    pub days_away: u32,
}

impl EventRecord {
    /// Days from `today` until the event; negative once it has passed.
    pub fn days_from(&self, today: NaiveDate) -> i64 {
        (self.date - today).num_days()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsRecord {
    pub title: String,
    pub summary: String,
    pub category: String,
    pub published: NaiveDate,
}

// ---------------------------------------------------------------------------
// Weather and chart baselines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weather {
    pub temperature_c: i32,
    pub condition: String,
    pub humidity_pct: u32,
    pub rainfall_mm: u32,
    pub weather_factor: f64,
    pub icon: String,
}

/// Baseline values for the headline statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricBaseline {
    pub performance_pct: f64,
    pub active_buses: u32,
    pub passengers_today: u32,
    pub weekly_savings: u32,
    pub prediction_accuracy_pct: f64,
    pub system_uptime_pct: f64,
}

/// One labelled point of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

fn series(points: &[(&str, f64)]) -> Vec<SeriesPoint> {
    points
        .iter()
        .map(|(label, value)| SeriesPoint {
            label: label.to_string(),
            value: *value,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Reference data bundle
// ---------------------------------------------------------------------------

/// Everything the dashboard reads, bundled for construction.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub directory: Directory,
    pub routes: Vec<RouteRecord>,
    pub events: Vec<EventRecord>,
    pub news: Vec<NewsRecord>,
    pub weather: Weather,
    pub baseline: MetricBaseline,
    /// Hourly passenger flow baseline.
    pub passenger_flow: Vec<SeriesPoint>,
    /// On-time / delayed / early split, percent.
    pub performance_breakdown: Vec<SeriesPoint>,
    /// Buses allocated per route for the next service day.
    pub allocation: Vec<SeriesPoint>,
}

impl ReferenceData {
    pub fn route(&self, id: &str) -> Option<&RouteRecord> {
        self.routes.iter().find(|r| r.id == id)
    }

    /// The event with the fewest days remaining.
    pub fn next_event(&self) -> Option<&EventRecord> {
        self.events.iter().min_by_key(|e| e.days_away)
    }

    /// Events on or after `today`, nearest first, with `days_away` recomputed.
    pub fn upcoming_events(&self, today: NaiveDate) -> Vec<EventRecord> {
        let mut upcoming: Vec<EventRecord> = self
            .events
            .iter()
            .filter_map(|e| {
                let days = u32::try_from(e.days_from(today)).ok()?;
                Some(EventRecord {
                    days_away: days,
                    ..e.clone()
                })
            })
            .collect();
        upcoming.sort_by_key(|e| e.days_away);
        upcoming
    }

    /// The Tiruppur demo data set.
    pub fn builtin() -> Self {
        Self {
            directory: Directory::new(vec![
                UserAccount::new("admin", "admin123", "Administrator", "Transport Department"),
                UserAccount::new("manager", "manager123", "Operations Manager", "Operations"),
                UserAccount::new(
                    "operator",
                    "operator123",
                    "Field Operator",
                    "Field Operations",
                ),
                UserAccount::new("viewer", "viewer123", "Analytics Viewer", "Analytics"),
            ]),
            routes: vec![
                route(
                    "tp_pc",
                    "Tiruppur to Pollachi",
                    (85, 120, 12, 2800),
                    89.2,
                    [2600, 2800, 2700, 2900, 3100, 3800, 3400],
                ),
                route(
                    "tp_cb",
                    "Tiruppur to Coimbatore",
                    (65, 90, 18, 4200),
                    91.5,
                    [3800, 4200, 3900, 4100, 4400, 5200, 4800],
                ),
                route(
                    "tp_sl",
                    "Tiruppur to Salem",
                    (113, 150, 15, 3500),
                    87.8,
                    [3200, 3500, 3300, 3400, 3700, 4500, 4100],
                ),
            ],
            events: vec![
                event((2025, 9, 12), "Ganesh Chaturthi", 1.8, "major", 1),
                event((2025, 10, 2), "Gandhi Jayanti", 1.4, "national", 21),
                event((2025, 10, 12), "Vijaya Dashami", 1.7, "major", 31),
                event((2025, 11, 1), "Diwali", 1.9, "major", 51),
                event((2025, 11, 15), "Karthikai Deepam", 1.6, "regional", 65),
                event((2025, 12, 25), "Christmas", 1.5, "national", 105),
                event((2026, 1, 14), "Thai Pusam", 1.7, "regional", 125),
                event((2026, 1, 26), "Republic Day", 1.4, "national", 137),
                event((2026, 4, 14), "Tamil New Year", 1.8, "regional", 215),
            ],
            news: vec![
                news(
                    "Tamil Nadu announces new electric bus fleet for 2025",
                    "State government plans to add 500 electric buses to improve sustainable \
                     transport across major cities",
                    "Infrastructure",
                    (2025, 9, 11),
                ),
                news(
                    "AI-powered traffic management system launched in Chennai",
                    "New intelligent system reduces traffic congestion by 25% in pilot areas \
                     using machine learning algorithms",
                    "Technology",
                    (2025, 9, 10),
                ),
                news(
                    "Rural connectivity improved with new bus routes",
                    "Transport department adds 15 new routes connecting remote villages to \
                     major economic centers",
                    "Expansion",
                    (2025, 9, 9),
                ),
                news(
                    "Digital ticketing system sees 80% adoption rate",
                    "Electronic payment systems show strong uptake among commuters, reducing \
                     boarding time by 40%",
                    "Digital",
                    (2025, 9, 8),
                ),
            ],
            weather: Weather {
                temperature_c: 29,
                condition: "Partly Cloudy".to_string(),
                humidity_pct: 68,
                rainfall_mm: 0,
                weather_factor: 1.05,
                icon: "⛅".to_string(),
            },
            baseline: MetricBaseline {
                performance_pct: 87.3,
                active_buses: 45,
                passengers_today: 8247,
                weekly_savings: 52500,
                prediction_accuracy_pct: 89.2,
                system_uptime_pct: 99.7,
            },
            passenger_flow: series(&[
                ("6AM", 120.0),
                ("8AM", 450.0),
                ("10AM", 280.0),
                ("12PM", 350.0),
                ("2PM", 320.0),
                ("4PM", 520.0),
                ("6PM", 480.0),
                ("8PM", 200.0),
            ]),
            performance_breakdown: series(&[("On Time", 75.0), ("Delayed", 15.0), ("Early", 10.0)]),
            allocation: series(&[
                ("Tiruppur-Pollachi", 15.0),
                ("Tiruppur-Coimbatore", 22.0),
                ("Tiruppur-Salem", 18.0),
            ]),
        }
    }
}

fn route(
    id: &str,
    name: &str,
    (distance_km, travel_time_min, current_buses, daily_passengers): (u32, u32, u32, u32),
    accuracy: f64,
    weekly_demand: [u32; 7],
) -> RouteRecord {
    RouteRecord {
        id: id.to_string(),
        name: name.to_string(),
        distance_km,
        travel_time_min,
        current_buses,
        daily_passengers,
        accuracy,
        weekly_demand,
    }
}

fn date((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn event(
    ymd: (i32, u32, u32),
    name: &str,
    impact: f64,
    category: &str,
    days_away: u32,
) -> EventRecord {
    EventRecord {
        date: date(ymd),
        name: name.to_string(),
        impact,
        category: category.to_string(),
        days_away,
    }
}

fn news(title: &str, summary: &str, category: &str, published: (i32, u32, u32)) -> NewsRecord {
    NewsRecord {
        title: title.to_string(),
        summary: summary.to_string(),
        category: category.to_string(),
        published: date(published),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_matches_exact_pairs_only() {
        let data = ReferenceData::builtin();
        let dir = &data.directory;
        assert_eq!(
            dir.authenticate("admin", "admin123").unwrap().role,
            "Administrator"
        );
        assert!(dir.authenticate("admin", "wrong").is_none());
        assert!(dir.authenticate("Admin", "admin123").is_none());
        assert!(dir.authenticate("admin123", "admin").is_none());
        assert!(dir.authenticate("", "").is_none());
    }

    #[test]
    fn first_match_wins_on_duplicates() {
        let dir = Directory::new(vec![
            UserAccount::new("dup", "pw", "Administrator", "A"),
            UserAccount::new("dup", "pw", "Analytics Viewer", "B"),
        ]);
        assert_eq!(dir.authenticate("dup", "pw").unwrap().department, "A");
    }

    #[test]
    fn permissions_follow_role() {
        let data = ReferenceData::builtin();
        let accounts = data.directory.accounts();
        assert!(accounts[0].can(Permission::ManageUsers));
        assert!(accounts[1].can(Permission::ApproveSchedules));
        assert!(!accounts[2].can(Permission::ApproveSchedules));
        assert!(accounts[2].can(Permission::UpdateStatus));
        assert_eq!(accounts[3].permissions(), &[Permission::Read]);
    }

    #[test]
    fn route_lookup_and_accuracy() {
        let data = ReferenceData::builtin();
        assert_eq!(data.route("tp_cb").unwrap().accuracy, 91.5);
        assert_eq!(data.route("tp_sl").unwrap().distance_km, 113);
        assert!(data.route("tp_xx").is_none());
    }

    #[test]
    fn next_event_is_nearest() {
        let data = ReferenceData::builtin();
        assert_eq!(data.next_event().unwrap().name, "Ganesh Chaturthi");
    }

    #[test]
    fn upcoming_events_drop_past_and_recompute_days() {
        let data = ReferenceData::builtin();
        let today = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let upcoming = data.upcoming_events(today);
        assert_eq!(upcoming.first().unwrap().name, "Christmas");
        assert_eq!(upcoming.first().unwrap().days_away, 24);
        assert_eq!(upcoming.len(), 4);
        assert!(upcoming.is_sorted_by_key(|e| e.days_away));
    }

    #[test]
    fn event_on_today_is_zero_days_away() {
        let data = ReferenceData::builtin();
        let today = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        let upcoming = data.upcoming_events(today);
        assert_eq!(upcoming[0].name, "Diwali");
        assert_eq!(upcoming[0].days_away, 0);
    }
}
