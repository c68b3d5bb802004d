//! Single-threaded virtual-time timer queue.
//!
//! Deferred work is registered as plain data (`T`) rather than as callbacks,
//! so the owner can dispatch fired tasks against its own state without
//! borrowing tricks. Time only moves when the owner says so: callers pop due
//! tasks one at a time with [`Scheduler::pop_due`] and may schedule or cancel
//! other timers in between, then settle the clock with
//! [`Scheduler::advance_to`].
//!
//! Handles returned for scheduled timers are move-only. Cancelling consumes
//! the handle, so a timer can be cancelled at most once per registration.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Copyable identity of a registered timer, carried by fired tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Owning handle for a registered timer.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a handle leaves the timer running with no way to cancel it"]
pub struct TimerHandle(TimerId);

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.0
    }
}

/// A task whose due time has been reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub id: TimerId,
    /// Virtual time at which the last coalesced occurrence was due.
    pub due: Duration,
    /// Consecutive occurrences folded into this firing. Always 1 for
    /// one-shot timers.
    pub occurrences: u64,
    pub task: T,
}

#[derive(Debug)]
struct Entry<T> {
    /// `None` once a periodic timer's next occurrence would lie past
    /// `Duration::MAX`. The timer stays registered but never fires again.
    due: Option<Duration>,
    period: Option<Duration>,
    task: T,
}

/// Deterministic timer queue over a virtual clock.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    entries: BTreeMap<TimerId, Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run `task` once, `delay` from now.
    pub fn schedule_once(&mut self, delay: Duration, task: T) -> TimerHandle {
        self.insert(self.now.saturating_add(delay), None, task)
    }

    /// Run `task` every `period`, first occurrence one period from now.
    ///
    /// A zero period is bumped to one millisecond so a periodic timer can
    /// never fire twice at the same instant.
    pub fn schedule_every(&mut self, period: Duration, task: T) -> TimerHandle {
        let period = period.max(Duration::from_millis(1));
        self.insert(self.now.saturating_add(period), Some(period), task)
    }

    /// Cancel a timer. Returns `false` if it already fired (one-shot only).
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.entries.remove(&handle.0).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of registered timers.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Pop the earliest task due at or before `until`.
    ///
    /// Ties are broken by registration order. The clock moves to the task's
    /// due time. One-shot timers are removed; periodic timers are re-armed
    /// after this firing, so a single periodic timer never has two
    /// occurrences outstanding.
    ///
    /// Back-to-back occurrences of a periodic timer with no other timer due
    /// in between are folded into one [`Fired`] whose `occurrences` counts
    /// them, so a large jump costs one dispatch instead of one per period.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<T>> {
        let due_entries = self
            .entries
            .iter()
            .filter_map(|(id, e)| Some((e.due.filter(|due| *due <= until)?, *id)));
        let (due, id) = due_entries.clone().min()?;
        let next_other = due_entries.filter(|(_, other)| *other != id).min();

        let entry = self.entries.get_mut(&id)?;
        let task = entry.task.clone();
        let (last, occurrences) = match entry.period {
            Some(period) => {
                let (last, occurrences) = catch_up(due, period, until, next_other);
                entry.due = last.checked_add(period);
                (last, occurrences)
            }
            None => {
                self.entries.remove(&id);
                (due, 1)
            }
        };

        self.now = self.now.max(last);
        Some(Fired {
            id,
            due: last,
            occurrences,
            task,
        })
    }

    /// Move the clock forward to `to`. Never moves it backwards.
    pub fn advance_to(&mut self, to: Duration) {
        self.now = self.now.max(to);
    }

    fn insert(&mut self, due: Duration, period: Option<Duration>, task: T) -> TimerHandle {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = Some(due);
        self.entries.insert(id, Entry { due, period, task });
        TimerHandle(id)
    }
}

/// Occurrences of a periodic timer first due at `due` that fire before
/// `next_other` (the earliest other due timer, which always sorts after
/// `due`) and no later than `until`. Returns the last occurrence's due time
/// and the count, which is at least one.
fn catch_up(
    due: Duration,
    period: Duration,
    until: Duration,
    next_other: Option<(Duration, TimerId)>,
) -> (Duration, u64) {
    let period_ns = period.as_nanos();
    let count = match next_other {
        // Occurrences strictly before the other timer's due time.
        Some((other_due, _)) if other_due > due => (other_due - due).as_nanos().div_ceil(period_ns),
        Some(_) => 1,
        None => (until - due).as_nanos() / period_ns + 1,
    };
    let occurrences = u64::try_from(count).unwrap_or(u64::MAX);
    let offset = period_ns.saturating_mul(count - 1);
    let last = from_nanos(due.as_nanos().saturating_add(offset)).unwrap_or(due);
    (last, occurrences)
}

fn from_nanos(nanos: u128) -> Option<Duration> {
    let secs = u64::try_from(nanos / 1_000_000_000).ok()?;
    let subsec = u32::try_from(nanos % 1_000_000_000).ok()?;
    Some(Duration::new(secs, subsec))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn drain(s: &mut Scheduler<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some(f) = s.pop_due(until) {
            fired.push(f.task);
        }
        s.advance_to(until);
        fired
    }

    #[test]
    fn one_shot_fires_once_at_due_time() {
        let mut s = Scheduler::new();
        let _h = s.schedule_once(ms(100), "a");
        assert!(drain(&mut s, ms(99)).is_empty());
        assert_eq!(drain(&mut s, ms(100)), vec!["a"]);
        assert!(drain(&mut s, ms(1000)).is_empty());
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn fires_in_due_then_registration_order() {
        let mut s = Scheduler::new();
        let _b = s.schedule_once(ms(50), "b");
        let _a = s.schedule_once(ms(10), "a");
        let _c = s.schedule_once(ms(50), "c");
        assert_eq!(drain(&mut s, ms(60)), vec!["a", "b", "c"]);
    }

    #[test]
    fn periodic_catch_up_is_coalesced() {
        let mut s = Scheduler::new();
        let _h = s.schedule_every(ms(30), "tick");
        let fired = s.pop_due(ms(95)).unwrap();
        assert_eq!(fired.occurrences, 3);
        assert_eq!(fired.due, ms(90));
        assert_eq!(s.now(), ms(90));
        assert!(s.pop_due(ms(95)).is_none());

        let fired = s.pop_due(ms(120)).unwrap();
        assert_eq!((fired.due, fired.occurrences), (ms(120), 1));
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn coalescing_stops_at_other_timers() {
        let mut s = Scheduler::new();
        let _t = s.schedule_every(ms(30), "tick");
        let _a = s.schedule_once(ms(75), "a");
        let _b = s.schedule_once(ms(120), "b");

        let mut fired = Vec::new();
        while let Some(f) = s.pop_due(ms(200)) {
            fired.push((f.task, f.due, f.occurrences));
        }
        assert_eq!(
            fired,
            vec![
                ("tick", ms(60), 2),
                ("a", ms(75), 1),
                ("tick", ms(90), 1),
                ("tick", ms(120), 1),
                ("b", ms(120), 1),
                ("tick", ms(180), 2),
            ]
        );
    }

    #[test]
    fn delays_saturate_at_duration_max() {
        let mut s = Scheduler::new();
        s.advance_to(Duration::MAX - ms(10));
        let _a = s.schedule_once(Duration::MAX, "a");
        let _t = s.schedule_every(Duration::MAX, "tick");
        assert_eq!(drain(&mut s, Duration::MAX), vec!["a", "tick"]);
        assert_eq!(s.now(), Duration::MAX);
    }

    #[test]
    fn periodic_timer_parks_when_next_due_overflows() {
        let mut s = Scheduler::new();
        let h = s.schedule_every(ms(30), "tick");
        let fired = s.pop_due(Duration::MAX).unwrap();
        assert!(fired.occurrences > 1);
        assert!(s.pop_due(Duration::MAX).is_none());
        // Still registered, so the owner sees the loop as running.
        assert!(s.is_pending(h.id()));
        assert!(s.cancel(h));
    }

    #[test]
    fn cancel_stops_periodic_timer() {
        let mut s = Scheduler::new();
        let h = s.schedule_every(ms(30), "tick");
        assert_eq!(drain(&mut s, ms(30)).len(), 1);
        assert!(s.cancel(h));
        assert!(drain(&mut s, ms(300)).is_empty());
    }

    #[test]
    fn cancel_after_fire_reports_false() {
        let mut s = Scheduler::new();
        let h = s.schedule_once(ms(5), "a");
        drain(&mut s, ms(5));
        assert!(!s.is_pending(h.id()));
        assert!(!s.cancel(h));
    }

    #[test]
    fn clock_moves_to_each_due_time_while_draining() {
        let mut s = Scheduler::new();
        let _a = s.schedule_once(ms(10), "a");
        let _b = s.schedule_once(ms(40), "b");
        let first = s.pop_due(ms(100)).unwrap();
        assert_eq!(first.due, ms(10));
        assert_eq!(s.now(), ms(10));
        // Work scheduled mid-drain is relative to the popped task's time.
        let _c = s.schedule_once(ms(5), "c");
        assert_eq!(s.pop_due(ms(100)).unwrap().task, "c");
        assert_eq!(s.pop_due(ms(100)).unwrap().task, "b");
    }

    #[test]
    fn zero_period_is_bumped() {
        let mut s = Scheduler::new();
        let _h = s.schedule_every(Duration::ZERO, "t");
        let fired = s.pop_due(ms(3)).unwrap();
        assert_eq!((fired.due, fired.occurrences), (ms(3), 3));
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.advance_to(ms(100));
        s.advance_to(ms(50));
        assert_eq!(s.now(), ms(100));
    }
}
