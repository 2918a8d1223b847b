//! Cancellable recurring timers.
//!
//! The engine is single-threaded and never blocks: a [`Scheduler`] only
//! records timers and reports which periods have elapsed when polled. The
//! owner of the simulation state drains those ticks on its own thread.
//!
//! Tokens are never reused, so a tick for a cancelled or replaced timer can
//! always be recognized as stale.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Handle of a scheduled recurring timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// One elapsed period of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub token: TimerToken,
    /// Scheduler time at which this period elapsed, in milliseconds
    pub due_ms: u64,
}

/// Source of recurring timer ticks
pub trait Scheduler {
    /// Start a timer firing every `every`, first after one full period
    fn schedule(&mut self, every: Duration) -> TimerToken;

    /// Cancel a timer; unknown or already cancelled tokens are ignored
    fn cancel(&mut self, token: TimerToken);

    /// Current scheduler time in milliseconds
    fn now_ms(&self) -> u64;

    /// Drain every elapsed period up to `now_ms()`, ordered by due time
    fn poll_due(&mut self) -> Vec<Tick>;

    /// Number of live timers
    fn active_timers(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    period_ms: u64,
    next_due_ms: u64,
}

/// Timer bookkeeping shared by the scheduler implementations
#[derive(Debug, Default)]
struct TimerTable {
    next_id: u64,
    timers: BTreeMap<TimerToken, Timer>,
}

impl TimerTable {
    fn insert(&mut self, now_ms: u64, every: Duration) -> TimerToken {
        self.next_id += 1;
        let token = TimerToken(self.next_id);
        // a zero period would fire forever within a single poll
        let period_ms = (every.as_millis() as u64).max(1);
        self.timers.insert(
            token,
            Timer {
                period_ms,
                next_due_ms: now_ms + period_ms,
            },
        );
        token
    }

    fn remove(&mut self, token: TimerToken) {
        self.timers.remove(&token);
    }

    fn drain_due(&mut self, now_ms: u64) -> Vec<Tick> {
        let mut ticks = Vec::new();
        for (token, timer) in self.timers.iter_mut() {
            while timer.next_due_ms <= now_ms {
                ticks.push(Tick {
                    token: *token,
                    due_ms: timer.next_due_ms,
                });
                timer.next_due_ms += timer.period_ms;
            }
        }
        ticks.sort_by_key(|tick| (tick.due_ms, tick.token));
        ticks
    }
}

/// Virtual-clock scheduler; time only moves through [`ManualScheduler::advance`].
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now_ms: u64,
    table: TimerTable,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the virtual clock forward
    pub fn advance(&mut self, by: Duration) {
        self.now_ms += by.as_millis() as u64;
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, every: Duration) -> TimerToken {
        self.table.insert(self.now_ms, every)
    }

    fn cancel(&mut self, token: TimerToken) {
        self.table.remove(token);
    }

    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn poll_due(&mut self) -> Vec<Tick> {
        self.table.drain_due(self.now_ms)
    }

    fn active_timers(&self) -> usize {
        self.table.timers.len()
    }
}

/// Wall-clock scheduler measuring time since its creation
#[derive(Debug)]
pub struct SystemScheduler {
    started: Instant,
    table: TimerTable,
}

impl SystemScheduler {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            table: TimerTable::default(),
        }
    }

    /// Time until the earliest live timer is due, `None` without timers
    pub fn until_next_due(&self) -> Option<Duration> {
        let now = self.now_ms();
        self.table
            .timers
            .values()
            .map(|timer| timer.next_due_ms.saturating_sub(now))
            .min()
            .map(Duration::from_millis)
    }
}

impl Default for SystemScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for SystemScheduler {
    fn schedule(&mut self, every: Duration) -> TimerToken {
        let now = self.now_ms();
        self.table.insert(now, every)
    }

    fn cancel(&mut self, token: TimerToken) {
        self.table.remove(token);
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn poll_due(&mut self) -> Vec<Tick> {
        let now = self.now_ms();
        self.table.drain_due(now)
    }

    fn active_timers(&self) -> usize {
        self.table.timers.len()
    }
}
