//! Async driver for the link watch.
//!
//! Owns the sleep/read/record loop around [`WatchMachine`]: one read per tick,
//! the next tick only after the previous read resolved, cancellation observed
//! between ticks. The timer is a trait object so tests drive the loop without
//! real delays.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use proforma_core::domain::deal::DealId;
use proforma_core::watch::{WatchEvent, WatchMachine, WatchPolicy};

use crate::gateway::{CrmGateway, GatewayError};

#[async_trait]
pub trait PollTimer: Send + Sync {
    async fn pause(&self, interval: Duration);
}

/// Production timer; plain `tokio::time::sleep`.
pub struct TokioTimer;

#[async_trait]
impl PollTimer for TokioTimer {
    async fn pause(&self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

/// Terminal result of one watch run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchOutcome {
    Linked { link: String, attempts: u32 },
    TimedOut { attempts: u32 },
    Cancelled { attempts: u32 },
}

pub struct LinkWatcher<G: ?Sized> {
    gateway: Arc<G>,
    timer: Arc<dyn PollTimer>,
    policy: WatchPolicy,
}

impl<G: CrmGateway + ?Sized> LinkWatcher<G> {
    pub fn new(gateway: Arc<G>, policy: WatchPolicy) -> Self {
        Self::with_timer(gateway, policy, Arc::new(TokioTimer))
    }

    pub fn with_timer(gateway: Arc<G>, policy: WatchPolicy, timer: Arc<dyn PollTimer>) -> Self {
        Self { gateway, timer, policy }
    }

    /// Polls the deal's link field until linked, timed out, or cancelled.
    ///
    /// The first read happens one interval after the call. A dropped cancel
    /// sender counts as cancellation: the hosting context went away and the
    /// loop must not outlive it. Transient read failures consume an attempt
    /// and the loop keeps going, so the wall-clock bound holds regardless of
    /// record-store health; an unknown deal is fatal.
    pub async fn watch(
        &self,
        deal_id: &DealId,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<WatchOutcome, GatewayError> {
        let mut machine = WatchMachine::new(self.policy);
        machine.begin();
        info!(
            event_name = "watch.start",
            deal_id = %deal_id,
            interval_secs = self.policy.interval.as_secs(),
            max_attempts = self.policy.max_attempts,
            "watching for proposal link"
        );

        if *cancel.borrow() {
            return Ok(self.cancelled(deal_id, &machine));
        }

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        return Ok(self.cancelled(deal_id, &machine));
                    }
                }
                _ = self.timer.pause(self.policy.interval) => {
                    let link = match self.gateway.proposal_link(deal_id).await {
                        Ok(link) => link,
                        Err(error @ GatewayError::DealNotFound(_)) => return Err(error),
                        Err(error) => {
                            warn!(
                                event_name = "watch.read_failed",
                                deal_id = %deal_id,
                                error = %error,
                                "link read failed, counting the attempt"
                            );
                            None
                        }
                    };

                    match machine.record_poll(link.as_deref()) {
                        WatchEvent::Linked { link } => {
                            let attempts = machine.attempts_used();
                            info!(
                                event_name = "watch.linked",
                                deal_id = %deal_id,
                                attempts,
                                "proposal link found"
                            );
                            return Ok(WatchOutcome::Linked { link, attempts });
                        }
                        WatchEvent::TimedOut { attempts } => {
                            warn!(
                                event_name = "watch.timed_out",
                                deal_id = %deal_id,
                                attempts,
                                "document is taking longer than expected"
                            );
                            return Ok(WatchOutcome::TimedOut { attempts });
                        }
                        WatchEvent::Pending { attempt } => {
                            debug!(
                                event_name = "watch.tick",
                                deal_id = %deal_id,
                                attempt,
                                "no link yet"
                            );
                        }
                        WatchEvent::Started | WatchEvent::Ignored => {}
                    }
                }
            }
        }
    }

    fn cancelled(&self, deal_id: &DealId, machine: &WatchMachine) -> WatchOutcome {
        let attempts = machine.attempts_used();
        info!(event_name = "watch.cancelled", deal_id = %deal_id, attempts, "watch cancelled");
        WatchOutcome::Cancelled { attempts }
    }
}
