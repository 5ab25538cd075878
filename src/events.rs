// Copyright (c) 2025 - Cowboy AI, LLC.

//! Domain events for the order workflow
//!
//! Events are immutable facts emitted after a command succeeds. The
//! intake flow and the two lifecycle transitions each have one, plus
//! one for customer quantity edits while the order still waits and one
//! for every measurement save staff make.

use crate::identifiers::OrderId;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Base trait for all domain events
///
/// # Examples
///
/// ```rust
/// use atelier_domain::events::DomainEvent;
/// use atelier_domain::identifiers::OrderId;
///
/// #[derive(Debug)]
/// struct ReminderSent {
///     order_id: OrderId,
/// }
///
/// impl DomainEvent for ReminderSent {
///     fn order_id(&self) -> OrderId {
///         self.order_id
///     }
///
///     fn event_type(&self) -> &'static str {
///         "ReminderSent"
///     }
/// }
///
/// let event = ReminderSent { order_id: OrderId::from_raw(7) };
/// assert_eq!(event.event_type(), "ReminderSent");
/// assert_eq!(event.version(), "v1");
/// ```
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// The order this event relates to
    fn order_id(&self) -> OrderId;

    /// Event type name
    fn event_type(&self) -> &'static str;

    /// Schema version
    fn version(&self) -> &'static str {
        "v1"
    }
}

/// A customer submitted a valid order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OrderPlaced {
    /// Repository-assigned order id
    pub order_id: OrderId,
    /// Total at placement time
    pub total_price: u32,
    /// When the order was placed
    pub occurred_at: DateTime<Utc>,
}

impl OrderPlaced {
    /// Record a placement that just happened
    pub fn new(order_id: OrderId, total_price: u32) -> Self {
        Self {
            order_id,
            total_price,
            occurred_at: Utc::now(),
        }
    }
}

impl DomainEvent for OrderPlaced {
    fn order_id(&self) -> OrderId {
        self.order_id
    }

    fn event_type(&self) -> &'static str {
        "OrderPlaced"
    }
}

/// The customer changed quantities while the order was still waiting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuantitiesAdjusted {
    /// The edited order
    pub order_id: OrderId,
    /// Total after the edit
    pub total_price: u32,
    /// When the edit happened
    pub occurred_at: DateTime<Utc>,
}

impl QuantitiesAdjusted {
    /// Record a quantity edit that just happened
    pub fn new(order_id: OrderId, total_price: u32) -> Self {
        Self {
            order_id,
            total_price,
            occurred_at: Utc::now(),
        }
    }
}

impl DomainEvent for QuantitiesAdjusted {
    fn order_id(&self) -> OrderId {
        self.order_id
    }

    fn event_type(&self) -> &'static str {
        "QuantitiesAdjusted"
    }
}

/// Staff saved measurement values, whether or not the save finalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MeasurementsRecorded {
    /// The order being measured
    pub order_id: OrderId,
    /// When the save happened
    pub occurred_at: DateTime<Utc>,
}

impl MeasurementsRecorded {
    /// Record a measurement save that just happened
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            occurred_at: Utc::now(),
        }
    }
}

impl DomainEvent for MeasurementsRecorded {
    fn order_id(&self) -> OrderId {
        self.order_id
    }

    fn event_type(&self) -> &'static str {
        "MeasurementsRecorded"
    }
}

/// Staff finished measuring: the order moved Waiting to Measured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OrderMeasured {
    /// The measured order
    pub order_id: OrderId,
    /// When measurement was finalized
    pub occurred_at: DateTime<Utc>,
}

impl OrderMeasured {
    /// Record a measurement that just finalized
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            occurred_at: Utc::now(),
        }
    }
}

impl DomainEvent for OrderMeasured {
    fn order_id(&self) -> OrderId {
        self.order_id
    }

    fn event_type(&self) -> &'static str {
        "OrderMeasured"
    }
}

/// The customer confirmed the measured order: Measured to Completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OrderConfirmed {
    /// The confirmed order
    pub order_id: OrderId,
    /// When the confirmation happened
    pub occurred_at: DateTime<Utc>,
}

impl OrderConfirmed {
    /// Record a confirmation that just happened
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            occurred_at: Utc::now(),
        }
    }
}

impl DomainEvent for OrderConfirmed {
    fn order_id(&self) -> OrderId {
        self.order_id
    }

    fn event_type(&self) -> &'static str {
        "OrderConfirmed"
    }
}
