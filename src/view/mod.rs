//! Renderable view models.
//!
//! Pure data-to-view transformations: static records and controller state
//! go in, serializable structs with display-ready strings come out. Nothing
//! here knows about markup or styling.

use serde::Serialize;

use crate::dashboard::{Notification, Section};
use crate::data::{EventRecord, NewsRecord, RouteRecord, SeriesPoint, UserAccount, Weather};
use crate::metrics::MetricSnapshot;

/// Predicted demand is shown as this fraction of actual demand.
pub const PREDICTION_RATIO: f64 = 0.98;

/// Day labels for the weekly demand series.
pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Everything a presentation layer needs to draw the current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub screen: Screen,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Screen {
    Login(LoginScreen),
    Main(Box<MainScreen>),
}

impl Screen {
    pub fn is_main(&self) -> bool {
        matches!(self, Self::Main(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginScreen {
    pub demo_accounts: Vec<DemoCredential>,
    /// Role of an accepted login still waiting for its transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_in_as: Option<String>,
}

/// A one-click demo login button.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoCredential {
    pub username: String,
    pub password: String,
    pub role: String,
}

impl From<&UserAccount> for DemoCredential {
    fn from(account: &UserAccount) -> Self {
        Self {
            username: account.username.clone(),
            password: account.password.clone(),
            role: account.role.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainScreen {
    pub greeting: String,
    pub username: String,
    pub department: String,
    pub permissions: Vec<String>,
    pub nav: Vec<NavItem>,
    pub active_section: Section,
    pub metrics: MetricsView,
    pub passenger_flow: Vec<SeriesPoint>,
    pub demand: RouteView,
    pub performance: Vec<SeriesPoint>,
    pub allocation: Vec<SeriesPoint>,
    pub weather: WeatherView,
    pub events: Vec<EventCard>,
    pub news: Vec<NewsCard>,
    pub approval: ApprovalView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavItem {
    pub section: Section,
    pub label: String,
    pub active: bool,
}

/// Navigation bar with exactly one item marked active.
pub fn nav_items(active: Section) -> Vec<NavItem> {
    Section::ALL
        .into_iter()
        .map(|section| NavItem {
            section,
            label: section.label().to_string(),
            active: section == active,
        })
        .collect()
}

pub fn greeting(account: &UserAccount) -> String {
    format!("Welcome, {}", account.role)
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    pub performance: String,
    pub active_buses: String,
    pub passengers_today: String,
    pub weekly_savings: String,
    pub prediction_accuracy: String,
    pub system_uptime: String,
}

impl From<&MetricSnapshot> for MetricsView {
    fn from(m: &MetricSnapshot) -> Self {
        Self {
            performance: format!("{:.1}%", m.performance_pct),
            active_buses: m.active_buses.to_string(),
            passengers_today: format_indian(u64::from(m.passengers_today)),
            weekly_savings: format!("₹{}", format_indian(u64::from(m.weekly_savings))),
            prediction_accuracy: format!("{:.1}%", m.prediction_accuracy_pct),
            system_uptime: format!("{:.1}%", m.system_uptime_pct),
        }
    }
}

/// Group digits the Indian way: the last three, then pairs (`12,34,567`).
pub fn format_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Route analytics for the demand chart and accuracy badge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteView {
    pub id: String,
    pub name: String,
    pub accuracy: f64,
    pub accuracy_label: String,
    pub days: Vec<String>,
    pub actual: Vec<u32>,
    pub predicted: Vec<f64>,
}

impl From<&RouteRecord> for RouteView {
    fn from(route: &RouteRecord) -> Self {
        Self {
            id: route.id.clone(),
            name: route.name.clone(),
            accuracy: route.accuracy,
            accuracy_label: format!("{}%", route.accuracy),
            days: WEEKDAYS.iter().map(|d| d.to_string()).collect(),
            actual: route.weekly_demand.to_vec(),
            predicted: route
                .weekly_demand
                .iter()
                .map(|&v| f64::from(v) * PREDICTION_RATIO)
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Events, news, weather
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventCard {
    pub date: String,
    pub name: String,
    pub category: String,
    pub impact: String,
    pub days_away: String,
}

impl From<&EventRecord> for EventCard {
    fn from(event: &EventRecord) -> Self {
        Self {
            date: event.date.format("%-d %b %Y").to_string(),
            name: event.name.clone(),
            category: event.category.clone(),
            impact: format!("{}x", event.impact),
            days_away: format!("{} days away", event.days_away),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsCard {
    pub date: String,
    pub category: String,
    pub title: String,
    pub summary: String,
}

impl From<&NewsRecord> for NewsCard {
    fn from(news: &NewsRecord) -> Self {
        Self {
            date: news.published.format("%-d %b").to_string(),
            category: news.category.clone(),
            title: news.title.clone(),
            summary: news.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherView {
    pub summary: String,
    pub humidity: String,
    pub rainfall: String,
    pub demand_factor: String,
}

impl From<&Weather> for WeatherView {
    fn from(w: &Weather) -> Self {
        Self {
            summary: format!("{} {}°C {}", w.icon, w.temperature_c, w.condition),
            humidity: format!("{}%", w.humidity_pct),
            rainfall: format!("{} mm", w.rainfall_mm),
            demand_factor: format!("{}x", w.weather_factor),
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule approval
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalView {
    pub label: String,
    pub enabled: bool,
}

impl ApprovalView {
    pub fn new(approved: bool, permitted: bool) -> Self {
        Self {
            label: if approved {
                "Approved ✓".to_string()
            } else {
                "Approve Schedule".to_string()
            },
            enabled: permitted && !approved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReferenceData;

    #[test]
    fn indian_grouping() {
        assert_eq!(format_indian(0), "0");
        assert_eq!(format_indian(999), "999");
        assert_eq!(format_indian(8247), "8,247");
        assert_eq!(format_indian(52500), "52,500");
        assert_eq!(format_indian(123456), "1,23,456");
        assert_eq!(format_indian(12345678), "1,23,45,678");
    }

    #[test]
    fn baseline_metrics_render_like_the_dashboard() {
        let data = ReferenceData::builtin();
        let view = MetricsView::from(&MetricSnapshot::baseline(&data.baseline));
        assert_eq!(view.performance, "87.3%");
        assert_eq!(view.active_buses, "45");
        assert_eq!(view.passengers_today, "8,247");
        assert_eq!(view.weekly_savings, "₹52,500");
        assert_eq!(view.system_uptime, "99.7%");
    }

    #[test]
    fn route_view_predicts_two_percent_under_actual() {
        let data = ReferenceData::builtin();
        let view = RouteView::from(data.route("tp_cb").unwrap());
        assert_eq!(view.accuracy_label, "91.5%");
        assert_eq!(view.actual, vec![3800, 4200, 3900, 4100, 4400, 5200, 4800]);
        assert!((view.predicted[0] - 3724.0).abs() < 1e-9);
        assert_eq!(view.days.len(), 7);
    }

    #[test]
    fn event_and_news_cards_format_dates() {
        let data = ReferenceData::builtin();
        let card = EventCard::from(&data.events[0]);
        assert_eq!(card.date, "12 Sep 2025");
        assert_eq!(card.impact, "1.8x");
        assert_eq!(card.days_away, "1 days away");
        assert_eq!(EventCard::from(&data.events[1]).days_away, "21 days away");

        let mut imminent = data.events[0].clone();
        imminent.days_away = 0;
        assert_eq!(EventCard::from(&imminent).days_away, "0 days away");

        let news = NewsCard::from(&data.news[0]);
        assert_eq!(news.date, "11 Sep");
        assert_eq!(news.category, "Infrastructure");
    }

    #[test]
    fn nav_marks_exactly_one_active() {
        for section in Section::ALL {
            let items = nav_items(section);
            assert_eq!(items.iter().filter(|i| i.active).count(), 1);
            assert!(items.iter().any(|i| i.active && i.section == section));
        }
    }

    #[test]
    fn approval_view_states() {
        assert!(ApprovalView::new(false, true).enabled);
        assert!(!ApprovalView::new(true, true).enabled);
        assert!(!ApprovalView::new(false, false).enabled);
        assert_eq!(ApprovalView::new(true, true).label, "Approved ✓");
    }
}
