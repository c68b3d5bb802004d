//! The dashboard controller: session, navigation, and the refresh loop.
//!
//! One [`Dashboard`] owns all application state. User intents arrive as
//! method calls (`login`, `navigate_to_section`, ...) and time arrives
//! through [`Dashboard::advance`], which fires due timers from the
//! virtual-time [`Scheduler`]. Every deferred step re-checks state when it
//! fires, so a late login completion after a logout is a no-op.
//!
//! # States
//!
//! | Phase            | Session | Main view | Refresh loop |
//! |------------------|---------|-----------|--------------|
//! | `LoggedOut`      | none    | hidden    | stopped      |
//! | `Authenticating` | none    | hidden    | stopped      |
//! | `LoggedIn`       | set     | visible   | running      |
//!
//! `Authenticating` lasts for the login presentation delay; with a zero delay
//! a successful `login` goes straight to `LoggedIn`.

mod notification;
mod section;

pub use notification::{Notification, NotificationCenter, Severity};
pub use section::Section;

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::activity::{ActivityKind, ActivityLog};
use crate::config::BusdashConfig;
use crate::config::schema::{JitterConfig, TimingConfig};
use crate::data::{Permission, ReferenceData, SeriesPoint, UserAccount};
use crate::metrics::{self, MetricSnapshot};
use crate::scheduler::{Fired, Scheduler, TimerHandle};
use crate::view::{
    self, ApprovalView, DemoCredential, EventCard, Frame, LoginScreen, MainScreen, MetricsView,
    NewsCard, RouteView, Screen, WeatherView,
};

pub const LOGIN_FAILED_MESSAGE: &str = "Invalid credentials. Please try demo credentials.";
pub const LOGOUT_MESSAGE: &str = "Logged out successfully";
pub const APPROVAL_DENIED_MESSAGE: &str = "Your role cannot approve schedules.";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The only error a user action can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginError {
    /// No directory entry matches. Unknown users and wrong passwords are
    /// deliberately indistinguishable.
    #[error("invalid credentials")]
    CredentialMismatch,
}

/// Returned by a successful [`Dashboard::login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAccepted {
    pub username: String,
    pub role: String,
    pub department: String,
    /// Whether the main view is already showing.
    pub committed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    LoggedOut,
    Authenticating,
    LoggedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Login,
    Main,
}

/// Deferred work. Each variant is re-validated against state when it fires.
#[derive(Debug, Clone, PartialEq)]
enum Task {
    CompleteLogin,
    Navigate(Section),
    RefreshMetrics,
    ExpireNotification(u64),
    ResetApproval,
}

struct PendingLogin {
    handle: TimerHandle,
    account: UserAccount,
}

/// Everything that changes while the dashboard runs.
struct AppState {
    session: Option<UserAccount>,
    view: View,
    pending_login: Option<PendingLogin>,
    refresh_loop: Option<TimerHandle>,
    pending_nav: Option<TimerHandle>,
    approval_hold: Option<TimerHandle>,
    active_section: Section,
    selected_route: String,
    metrics: MetricSnapshot,
    passenger_flow: Vec<SeriesPoint>,
    demand: RouteView,
    allocation: Vec<SeriesPoint>,
    refresh_count: u64,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct Dashboard {
    data: ReferenceData,
    timing: TimingConfig,
    jitter: JitterConfig,
    scheduler: Scheduler<Task>,
    rng: StdRng,
    log: ActivityLog,
    notifications: NotificationCenter,
    state: AppState,
}

impl Dashboard {
    /// Build a logged-out dashboard over `data`.
    ///
    /// The first route becomes the default analytics filter. With no routes
    /// the demand view stays empty.
    pub fn new(config: &BusdashConfig, data: ReferenceData, log: ActivityLog) -> Self {
        let rng = match config.jitter.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let demand = data.routes.first().map(RouteView::from).unwrap_or_default();

        let state = AppState {
            session: None,
            view: View::Login,
            pending_login: None,
            refresh_loop: None,
            pending_nav: None,
            approval_hold: None,
            active_section: Section::default(),
            selected_route: demand.id.clone(),
            metrics: MetricSnapshot::baseline(&data.baseline),
            passenger_flow: data.passenger_flow.clone(),
            demand,
            allocation: data.allocation.clone(),
            refresh_count: 0,
        };

        Self {
            timing: config.timing.clone(),
            jitter: config.jitter.clone(),
            scheduler: Scheduler::new(),
            rng,
            log,
            notifications: NotificationCenter::default(),
            state,
            data,
        }
    }

    // -- Session --

    /// Check credentials and start the transition into the main view.
    ///
    /// A failed attempt leaves any existing session untouched. A successful
    /// one supersedes the current session or pending login.
    pub fn login(&mut self, username: &str, password: &str) -> Result<LoginAccepted, LoginError> {
        let directory = &self.data.directory;
        let Some(account) = directory.authenticate(username, password).cloned() else {
            self.notify(LOGIN_FAILED_MESSAGE, Severity::Error);
            self.log.record(ActivityKind::LoginRejected, Some(username), None);
            return Err(LoginError::CredentialMismatch);
        };

        let replaced = self.active_username();
        if self.teardown() {
            self.log.record(ActivityKind::LoggedOut, replaced.as_deref(), None);
        }

        self.notify(&format!("Welcome, {}!", account.role), Severity::Success);
        self.log.record(
            ActivityKind::LoginAccepted,
            Some(&account.username),
            Some(&account.role),
        );

        let mut accepted = LoginAccepted {
            username: account.username.clone(),
            role: account.role.clone(),
            department: account.department.clone(),
            committed: false,
        };

        let delay = Duration::from_millis(self.timing.login_delay_ms);
        if delay.is_zero() {
            self.start_session(account);
            accepted.committed = true;
        } else {
            let handle = self.scheduler.schedule_once(delay, Task::CompleteLogin);
            self.state.pending_login = Some(PendingLogin { handle, account });
        }

        Ok(accepted)
    }

    /// End the session (or abandon a pending login). No-op when logged out.
    pub fn logout(&mut self) {
        let username = self.active_username();
        if self.teardown() {
            self.notify(LOGOUT_MESSAGE, Severity::Success);
            self.log.record(ActivityKind::LoggedOut, username.as_deref(), None);
        }
    }

    // -- Navigation --

    /// Switch to the section with the given id. Unknown ids are ignored.
    pub fn navigate_to_section(&mut self, section_id: &str) {
        if let Some(section) = Section::parse(section_id) {
            self.navigate(section);
        }
    }

    /// Switch sections, after the navigation delay if one is configured.
    ///
    /// Ignored while logged out. A newer request replaces a pending one.
    pub fn navigate(&mut self, section: Section) {
        if self.state.session.is_none() {
            return;
        }

        if let Some(pending) = self.state.pending_nav.take() {
            self.scheduler.cancel(pending);
        }

        let delay = Duration::from_millis(self.timing.navigation_delay_ms);
        if delay.is_zero() {
            self.apply_navigation(section);
        } else {
            let handle = self.scheduler.schedule_once(delay, Task::Navigate(section));
            self.state.pending_nav = Some(handle);
        }
    }

    /// Alt+1..5 switch sections; anything else is ignored.
    pub fn handle_shortcut(&mut self, alt: bool, digit: u8) {
        if !alt {
            return;
        }
        if let Some(section) = Section::from_shortcut(digit) {
            self.navigate(section);
        }
    }

    /// Make `route_id` the analytics filter and return its view.
    ///
    /// Unknown ids return `None` and change nothing.
    pub fn select_route(&mut self, route_id: &str) -> Option<RouteView> {
        let view = RouteView::from(self.data.route(route_id)?);

        self.state.selected_route = view.id.clone();
        if self.state.session.is_some() && self.state.active_section == Section::Analytics {
            self.state.demand = view.clone();
        }
        if self.state.session.is_some() {
            self.log.record(ActivityKind::RouteSelected, self.username(), Some(route_id));
        }

        Some(view)
    }

    // -- Scheduler section --

    /// Approve tomorrow's schedule, if the role allows it.
    pub fn approve_schedule(&mut self) {
        let Some(account) = &self.state.session else {
            return;
        };
        if self.state.approval_hold.is_some() {
            return;
        }
        if !account.can(Permission::ApproveSchedules) {
            self.notify(APPROVAL_DENIED_MESSAGE, Severity::Error);
            return;
        }

        let username = account.username.clone();
        let message = match self.data.next_event() {
            Some(event) => format!("Schedule approved for {}!", event.date.format("%B %-d, %Y")),
            None => "Schedule approved!".to_string(),
        };
        self.notify(&message, Severity::Success);
        self.log.record(ActivityKind::ScheduleApproved, Some(&username), None);

        let hold = Duration::from_millis(self.timing.approval_reset_ms);
        if !hold.is_zero() {
            let handle = self.scheduler.schedule_once(hold, Task::ResetApproval);
            self.state.approval_hold = Some(handle);
        }
    }

    // -- Time --

    /// Let `dt` of virtual time pass, firing every timer that comes due.
    pub fn advance(&mut self, dt: Duration) {
        let until = self.scheduler.now().saturating_add(dt);
        while let Some(fired) = self.scheduler.pop_due(until) {
            self.dispatch(fired);
        }
        self.scheduler.advance_to(until);
    }

    fn dispatch(&mut self, fired: Fired<Task>) {
        match fired.task {
            Task::CompleteLogin => {
                let current = self
                    .state
                    .pending_login
                    .as_ref()
                    .is_some_and(|p| p.handle.id() == fired.id);
                if current && let Some(pending) = self.state.pending_login.take() {
                    self.start_session(pending.account);
                }
            }
            Task::Navigate(section) => {
                let current = self
                    .state
                    .pending_nav
                    .as_ref()
                    .is_some_and(|h| h.id() == fired.id);
                if current {
                    self.state.pending_nav = None;
                    if self.state.session.is_some() {
                        self.apply_navigation(section);
                    }
                }
            }
            Task::RefreshMetrics => {
                let current = self
                    .state
                    .refresh_loop
                    .as_ref()
                    .is_some_and(|h| h.id() == fired.id);
                if current && self.state.session.is_some() {
                    self.refresh_metrics(fired.occurrences);
                }
            }
            Task::ExpireNotification(id) => {
                self.notifications.expire(id);
            }
            Task::ResetApproval => {
                let current = self
                    .state
                    .approval_hold
                    .as_ref()
                    .is_some_and(|h| h.id() == fired.id);
                if current {
                    self.state.approval_hold = None;
                }
            }
        }
    }

    // -- Internal transitions --

    /// Commit a session: main view, default section, fresh metrics, loop on.
    fn start_session(&mut self, account: UserAccount) {
        self.log.record(
            ActivityKind::SessionStarted,
            Some(&account.username),
            Some(&account.role),
        );

        self.state.session = Some(account);
        self.state.view = View::Main;
        self.state.active_section = Section::default();
        self.recompute_demand();
        self.state.allocation = self.data.allocation.clone();
        self.refresh_metrics(1);

        let period = Duration::from_secs(self.timing.refresh_interval_secs);
        let handle = self.scheduler.schedule_every(period, Task::RefreshMetrics);
        self.state.refresh_loop = Some(handle);
    }

    /// Cancel every session-scoped timer, then clear the session.
    ///
    /// Returns whether there was a session or pending login to tear down.
    fn teardown(&mut self) -> bool {
        let mut ended = false;

        if let Some(handle) = self.state.refresh_loop.take() {
            self.scheduler.cancel(handle);
        }
        if let Some(pending) = self.state.pending_login.take() {
            self.scheduler.cancel(pending.handle);
            ended = true;
        }
        if let Some(handle) = self.state.pending_nav.take() {
            self.scheduler.cancel(handle);
        }
        if let Some(handle) = self.state.approval_hold.take() {
            self.scheduler.cancel(handle);
        }

        if self.state.session.take().is_some() {
            ended = true;
        }
        self.state.view = View::Login;

        ended
    }

    fn apply_navigation(&mut self, section: Section) {
        self.state.active_section = section;
        match section {
            Section::Analytics => self.recompute_demand(),
            Section::Scheduler => self.state.allocation = self.data.allocation.clone(),
            _ => {}
        }
        self.log.record(ActivityKind::Navigated, self.username(), Some(section.id()));
    }

    fn recompute_demand(&mut self) {
        if let Some(route) = self.data.route(&self.state.selected_route) {
            self.state.demand = RouteView::from(route);
        }
    }

    /// Recompute metrics for `ticks` elapsed refresh periods. Snapshots are
    /// drawn fresh from the baseline, so only the latest one is computed.
    fn refresh_metrics(&mut self, ticks: u64) {
        let baseline = &self.data.baseline;
        self.state.metrics = MetricSnapshot::jittered(baseline, &self.jitter, &mut self.rng);
        let flow = &self.data.passenger_flow;
        self.state.passenger_flow = metrics::jitter_series(flow, &mut self.rng);
        self.state.refresh_count = self.state.refresh_count.saturating_add(ticks);
    }

    fn notify(&mut self, message: &str, severity: Severity) {
        let ttl = Duration::from_millis(self.timing.notification_ttl_ms);
        let expires_at = self.scheduler.now().saturating_add(ttl);
        let id = self
            .notifications
            .push(message.to_string(), severity, expires_at);
        // Expiry checks the slot by id, so the handle is never cancelled.
        let _ = self
            .scheduler
            .schedule_once(ttl, Task::ExpireNotification(id));
    }

    fn username(&self) -> Option<&str> {
        self.state.session.as_ref().map(|a| a.username.as_str())
    }

    /// User of the current session or pending login.
    fn active_username(&self) -> Option<String> {
        self.state
            .session
            .as_ref()
            .or(self.state.pending_login.as_ref().map(|p| &p.account))
            .map(|a| a.username.clone())
    }

    // -- Queries --

    pub fn phase(&self) -> Phase {
        if self.state.session.is_some() {
            Phase::LoggedIn
        } else if self.state.pending_login.is_some() {
            Phase::Authenticating
        } else {
            Phase::LoggedOut
        }
    }

    pub fn session(&self) -> Option<&UserAccount> {
        self.state.session.as_ref()
    }

    pub fn is_main_view_visible(&self) -> bool {
        self.state.view == View::Main
    }

    /// Whether the periodic refresh timer is registered with the scheduler.
    pub fn is_refresh_running(&self) -> bool {
        self.state
            .refresh_loop
            .as_ref()
            .is_some_and(|h| self.scheduler.is_pending(h.id()))
    }

    /// Session ⇔ main view ⇔ refresh loop.
    pub fn is_consistent(&self) -> bool {
        let session = self.state.session.is_some();
        session == self.is_main_view_visible() && session == self.is_refresh_running()
    }

    pub fn active_section(&self) -> Section {
        self.state.active_section
    }

    pub fn selected_route(&self) -> &str {
        &self.state.selected_route
    }

    pub fn metrics(&self) -> &MetricSnapshot {
        &self.state.metrics
    }

    pub fn passenger_flow(&self) -> &[SeriesPoint] {
        &self.state.passenger_flow
    }

    /// Number of metric refreshes so far, including the one at login.
    pub fn refresh_count(&self) -> u64 {
        self.state.refresh_count
    }

    pub fn is_schedule_approved(&self) -> bool {
        self.state.approval_hold.is_some()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notifications.current()
    }

    pub fn notification_history(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.history()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    // -- Rendering --

    /// View models for whatever is on screen right now.
    pub fn frame(&self) -> Frame {
        Frame {
            screen: self.screen(),
            notification: self.notifications.current().cloned(),
        }
    }

    pub fn screen(&self) -> Screen {
        match (&self.state.session, self.state.view) {
            (Some(account), View::Main) => Screen::Main(Box::new(self.main_screen(account))),
            _ => Screen::Login(LoginScreen {
                demo_accounts: self
                    .data
                    .directory
                    .accounts()
                    .iter()
                    .map(DemoCredential::from)
                    .collect(),
                signing_in_as: self
                    .state
                    .pending_login
                    .as_ref()
                    .map(|p| p.account.role.clone()),
            }),
        }
    }

    fn main_screen(&self, account: &UserAccount) -> MainScreen {
        MainScreen {
            greeting: view::greeting(account),
            username: account.username.clone(),
            department: account.department.clone(),
            permissions: account
                .permissions()
                .iter()
                .map(|p| p.to_string())
                .collect(),
            nav: view::nav_items(self.state.active_section),
            active_section: self.state.active_section,
            metrics: MetricsView::from(&self.state.metrics),
            passenger_flow: self.state.passenger_flow.clone(),
            demand: self.state.demand.clone(),
            performance: self.data.performance_breakdown.clone(),
            allocation: self.state.allocation.clone(),
            weather: WeatherView::from(&self.data.weather),
            events: self.data.events.iter().map(EventCard::from).collect(),
            news: self.data.news.iter().map(NewsCard::from).collect(),
            approval: ApprovalView::new(
                self.state.approval_hold.is_some(),
                account.can(Permission::ApproveSchedules),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn instant() -> Dashboard {
        Dashboard::new(
            &BusdashConfig::instant(42),
            ReferenceData::builtin(),
            ActivityLog::disabled(),
        )
    }

    fn staged() -> Dashboard {
        let mut config = BusdashConfig::default();
        config.jitter.seed = Some(42);
        Dashboard::new(&config, ReferenceData::builtin(), ActivityLog::disabled())
    }

    #[test]
    fn starts_logged_out_and_consistent() {
        let d = instant();
        assert_eq!(d.phase(), Phase::LoggedOut);
        assert!(d.is_consistent());
        assert!(!d.screen().is_main());
    }

    #[test]
    fn instant_login_commits_synchronously() {
        let mut d = instant();
        let accepted = d.login("admin", "admin123").unwrap();
        assert!(accepted.committed);
        assert_eq!(accepted.role, "Administrator");
        assert_eq!(d.phase(), Phase::LoggedIn);
        assert_eq!(d.refresh_count(), 1);
        assert!(d.is_consistent());
    }

    #[test]
    fn staged_login_waits_for_delay() {
        let mut d = staged();
        let accepted = d.login("viewer", "viewer123").unwrap();
        assert!(!accepted.committed);
        assert_eq!(d.phase(), Phase::Authenticating);
        assert!(d.is_consistent());

        d.advance(Duration::from_millis(999));
        assert_eq!(d.phase(), Phase::Authenticating);
        d.advance(Duration::from_millis(1));
        assert_eq!(d.phase(), Phase::LoggedIn);
        assert!(d.is_consistent());
    }

    #[test]
    fn teardown_cancels_every_session_timer() {
        let mut d = staged();
        d.login("admin", "admin123").unwrap();
        d.advance(Duration::from_secs(1));
        d.navigate(Section::News);
        d.approve_schedule();
        // loop + pending nav + approval hold + notification expiries
        assert!(d.scheduler.pending() >= 3);
        d.logout();
        assert!(d.state.refresh_loop.is_none());
        assert!(d.state.pending_nav.is_none());
        assert!(d.state.approval_hold.is_none());
        d.advance(Duration::from_secs(10));
        assert_eq!(d.scheduler.pending(), 0);
    }

    #[test]
    fn advancing_by_duration_max_saturates_the_clock() {
        let mut d = instant();
        d.login("admin", "admin123").unwrap();
        d.advance(Duration::MAX);
        assert_eq!(d.now(), Duration::MAX);
        assert!(d.refresh_count() > 1);
        assert!(d.notification().is_none());
        assert!(d.is_consistent());

        // The clock is pinned; later work still runs without panicking.
        let count = d.refresh_count();
        d.advance(Duration::from_secs(60));
        assert_eq!(d.refresh_count(), count);
        d.navigate(Section::Events);
        assert_eq!(d.active_section(), Section::Events);
        d.logout();
        d.advance(Duration::from_secs(1));
        assert!(d.notification().is_none());
        assert!(d.is_consistent());
    }

    #[test]
    fn skipped_periods_are_counted_with_one_refresh() {
        let mut d = instant();
        d.login("admin", "admin123").unwrap();
        d.advance(Duration::from_secs(3));
        let period = Duration::from_secs(d.timing.refresh_interval_secs);
        d.advance(period * 1000);
        assert_eq!(d.refresh_count(), 1001);
        assert!(d.metrics().within_bounds(&d.data.baseline));
    }
}
