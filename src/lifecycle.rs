//! Order status lifecycle
//!
//! Status moves one way: `Waiting → Measured → Completed`. The enum
//! serializes lowercase to match the persisted record shape, while
//! [`State::name`] keeps the variant spelling for logs and error
//! messages.

use crate::state_machine::{State, StateTransitions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an order sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed by the customer, measurements not yet recorded
    Waiting,
    /// Staff has recorded measurements; awaiting customer confirmation
    Measured,
    /// Terminal state: customer confirmed the measured order
    Completed,
}

impl OrderStatus {
    /// Lowercase form used in the persisted record
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Measured => "measured",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl State for OrderStatus {
    fn name(&self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Measured => "Measured",
            Self::Completed => "Completed",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl StateTransitions for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Waiting => vec![Self::Measured],
            Self::Measured => vec![Self::Completed],
            Self::Completed => vec![],
        }
    }
}
