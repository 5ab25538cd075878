// Copyright 2025 Cowboy AI, LLC.

//! Customer-side status polling
//!
//! The only suspending behavior in the workflow: after placing an
//! order the customer's session fetches it on a fixed interval until
//! the status moves, the session ends, or an optional time bound
//! elapses. A loop with a cancellation signal, never sleep-then-recurse.

use crate::errors::DomainResult;
use crate::identifiers::OrderId;
use crate::lifecycle::OrderStatus;
use crate::order::Order;
use crate::repository::OrderRepository;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Polling parameters
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between consecutive fetches
    pub interval: Duration,

    /// Give up after this much waiting; `None` leaves the bound to the
    /// cancellation signal, which is tied to the session's lifetime
    pub max_duration: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_duration: None,
        }
    }
}

/// How a poll ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The status left the initial one; carries the fresh order
    Ready(Order),
    /// The cancellation signal fired before any change
    Cancelled,
    /// The time bound elapsed with the status unchanged
    Expired,
}

/// Poll the store until the order's status leaves `initial`
///
/// One fetch per tick and nothing else; polling mutates no order
/// state. The changed order comes back inside [`PollOutcome::Ready`],
/// so callers render it without a second fetch. Transient store
/// failures are logged and retried on the next tick, an unknown id
/// aborts with [`crate::errors::DomainError::NotFound`]. Cancellation
/// is observed between fetches via the watch channel; a dropped sender
/// counts as cancellation too.
pub async fn poll_until_status_leaves<R: OrderRepository>(
    repository: &R,
    order_id: OrderId,
    initial: OrderStatus,
    config: &PollConfig,
    mut cancel: watch::Receiver<bool>,
) -> DomainResult<PollOutcome> {
    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let started = Instant::now();
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match repository.fetch_by_id(order_id).await {
                    Ok(order) => {
                        let status = order.status();
                        if status != initial {
                            debug!("Order {} status moved to {}", order_id, status);
                            return Ok(PollOutcome::Ready(order));
                        }
                        debug!("Order {} still {}", order_id, status);
                    }
                    Err(e) if e.is_retryable() => {
                        warn!("Order {} poll failed, retrying next tick: {}", order_id, e);
                    }
                    Err(e) => return Err(e),
                }

                if let Some(max) = config.max_duration {
                    if started.elapsed() >= max {
                        return Ok(PollOutcome::Expired);
                    }
                }
            }
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    debug!("Order {} poll cancelled", order_id);
                    return Ok(PollOutcome::Cancelled);
                }
            }
        }
    }
}
