//! Caller-owned watch over an externally rendered document.
//!
//! The renderer is fired through a one-way webhook and writes its result back
//! to a link field on the deal record; the only way to observe completion is
//! to re-read that field. This machine owns the bookkeeping for that loop:
//! attempt budget, terminal states, and manual re-checks. It is pure state;
//! the async driver that actually sleeps and reads lives with the CRM client
//! so the timer stays injectable in tests.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Interval and attempt budget for one watch. The defaults give up after
/// roughly five minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self { interval: DEFAULT_POLL_INTERVAL, max_attempts: DEFAULT_MAX_ATTEMPTS }
    }
}

impl WatchPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self { interval, max_attempts }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WatchState {
    Idle,
    /// `attempt` counts polls consumed so far.
    Polling { attempt: u32 },
    Linked { link: String },
    TimedOut { attempts: u32 },
}

impl WatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Linked { .. } | Self::TimedOut { .. })
    }
}

/// What one input did to the machine. `Linked` is emitted at most once per
/// machine, which is what lets the driver surface its success notification
/// exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    Started,
    /// Poll came back empty; budget remains.
    Pending { attempt: u32 },
    Linked { link: String },
    TimedOut { attempts: u32 },
    /// Input that cannot move the machine (poll after a terminal state,
    /// double start, manual miss after timeout).
    Ignored,
}

#[derive(Clone, Debug)]
pub struct WatchMachine {
    policy: WatchPolicy,
    state: WatchState,
    polls: u32,
}

impl WatchMachine {
    pub fn new(policy: WatchPolicy) -> Self {
        Self { policy, state: WatchState::Idle, polls: 0 }
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn policy(&self) -> WatchPolicy {
        self.policy
    }

    /// Scheduled polls consumed so far. Manual checks never count.
    pub fn attempts_used(&self) -> u32 {
        self.polls
    }

    /// Trigger accepted; start consuming the poll budget.
    pub fn begin(&mut self) -> WatchEvent {
        match self.state {
            WatchState::Idle => {
                self.state = WatchState::Polling { attempt: 0 };
                WatchEvent::Started
            }
            _ => WatchEvent::Ignored,
        }
    }

    /// Record the result of one scheduled poll.
    pub fn record_poll(&mut self, link: Option<&str>) -> WatchEvent {
        if !matches!(self.state, WatchState::Polling { .. }) {
            return WatchEvent::Ignored;
        }

        self.polls += 1;
        if let Some(link) = normalize_link(link) {
            return self.link_found(link);
        }

        if self.polls >= self.policy.max_attempts {
            self.state = WatchState::TimedOut { attempts: self.polls };
            WatchEvent::TimedOut { attempts: self.polls }
        } else {
            self.state = WatchState::Polling { attempt: self.polls };
            WatchEvent::Pending { attempt: self.polls }
        }
    }

    /// Record an on-demand check. Allowed in any state, never consumes the
    /// poll budget, and may resolve a timed-out watch; a linked watch is
    /// final.
    pub fn record_manual_check(&mut self, link: Option<&str>) -> WatchEvent {
        if matches!(self.state, WatchState::Linked { .. }) {
            return WatchEvent::Ignored;
        }

        match normalize_link(link) {
            Some(link) => self.link_found(link),
            None => match self.state {
                WatchState::Polling { attempt } => WatchEvent::Pending { attempt },
                _ => WatchEvent::Ignored,
            },
        }
    }

    fn link_found(&mut self, link: &str) -> WatchEvent {
        self.state = WatchState::Linked { link: link.to_owned() };
        WatchEvent::Linked { link: link.to_owned() }
    }
}

/// The record store reports "no link yet" as either an absent property or an
/// empty string; both mean pending.
fn normalize_link(link: Option<&str>) -> Option<&str> {
    let link = link?.trim();
    if link.is_empty() {
        None
    } else {
        Some(link)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{WatchEvent, WatchMachine, WatchPolicy, WatchState};

    fn machine(max_attempts: u32) -> WatchMachine {
        WatchMachine::new(WatchPolicy::new(Duration::from_secs(3), max_attempts))
    }

    #[test]
    fn defaults_give_a_five_minute_budget() {
        let policy = WatchPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(3));
        assert_eq!(policy.max_attempts, 100);
    }

    #[test]
    fn link_on_seventh_poll_transitions_to_linked_once() {
        let mut watch = machine(100);
        assert_eq!(watch.begin(), WatchEvent::Started);

        for attempt in 1..=6 {
            assert_eq!(watch.record_poll(None), WatchEvent::Pending { attempt });
        }
        assert_eq!(
            watch.record_poll(Some("https://files.example.com/proposal.pdf")),
            WatchEvent::Linked { link: "https://files.example.com/proposal.pdf".to_owned() }
        );
        assert!(watch.state().is_terminal());
        assert_eq!(watch.attempts_used(), 7);

        // Any further input is ignored; Linked fires at most once.
        assert_eq!(watch.record_poll(Some("https://other.example.com")), WatchEvent::Ignored);
        assert_eq!(
            watch.record_manual_check(Some("https://other.example.com")),
            WatchEvent::Ignored
        );
        assert_eq!(
            watch.state(),
            &WatchState::Linked { link: "https://files.example.com/proposal.pdf".to_owned() }
        );
    }

    #[test]
    fn budget_exhaustion_times_out_exactly_at_the_ceiling() {
        let mut watch = machine(100);
        watch.begin();

        for attempt in 1..100 {
            assert_eq!(watch.record_poll(None), WatchEvent::Pending { attempt });
        }
        assert_eq!(watch.record_poll(None), WatchEvent::TimedOut { attempts: 100 });
        assert_eq!(watch.state(), &WatchState::TimedOut { attempts: 100 });
        assert_eq!(watch.attempts_used(), 100);

        // The budget stays spent.
        assert_eq!(watch.record_poll(None), WatchEvent::Ignored);
    }

    #[test]
    fn manual_check_does_not_consume_the_poll_budget() {
        let mut watch = machine(3);
        watch.begin();
        assert_eq!(watch.record_poll(None), WatchEvent::Pending { attempt: 1 });

        for _ in 0..10 {
            assert_eq!(watch.record_manual_check(None), WatchEvent::Pending { attempt: 1 });
        }

        assert_eq!(watch.record_poll(None), WatchEvent::Pending { attempt: 2 });
        assert_eq!(watch.record_poll(None), WatchEvent::TimedOut { attempts: 3 });
    }

    #[test]
    fn manual_check_resolves_a_timed_out_watch() {
        let mut watch = machine(1);
        watch.begin();
        assert_eq!(watch.record_poll(None), WatchEvent::TimedOut { attempts: 1 });

        assert_eq!(watch.record_manual_check(None), WatchEvent::Ignored);
        assert_eq!(
            watch.record_manual_check(Some("https://files.example.com/late.pdf")),
            WatchEvent::Linked { link: "https://files.example.com/late.pdf".to_owned() }
        );
        assert_eq!(
            watch.state(),
            &WatchState::Linked { link: "https://files.example.com/late.pdf".to_owned() }
        );
    }

    #[test]
    fn manual_check_may_link_before_the_watch_begins() {
        let mut watch = machine(100);
        assert_eq!(
            watch.record_manual_check(Some("https://files.example.com/early.pdf")),
            WatchEvent::Linked { link: "https://files.example.com/early.pdf".to_owned() }
        );
        assert_eq!(watch.begin(), WatchEvent::Ignored);
    }

    #[test]
    fn empty_and_whitespace_links_mean_pending() {
        let mut watch = machine(100);
        watch.begin();
        assert_eq!(watch.record_poll(Some("")), WatchEvent::Pending { attempt: 1 });
        assert_eq!(watch.record_poll(Some("   ")), WatchEvent::Pending { attempt: 2 });
        assert_eq!(watch.attempts_used(), 2);
    }

    #[test]
    fn double_begin_is_ignored() {
        let mut watch = machine(100);
        assert_eq!(watch.begin(), WatchEvent::Started);
        watch.record_poll(None);
        assert_eq!(watch.begin(), WatchEvent::Ignored);
        assert_eq!(watch.state(), &WatchState::Polling { attempt: 1 });
    }
}
