//! State machine primitives for domain lifecycles
//!
//! The order status and the customer session phase are both small linear
//! state machines. This module provides the shared pieces: a [`State`]
//! trait describing a state's identity and terminality, a
//! [`StateTransitions`] trait declaring the legal edges, and
//! [`apply_transition`] which guards an edge and produces the
//! [`StateTransition`] record that aggregates append to their history.

use crate::errors::{DomainError, DomainResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Declares the legal transitions out of each state
///
/// # Examples
///
/// ```rust
/// use atelier_domain::state_machine::{State, StateTransitions};
///
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// enum Gate {
///     Open,
///     Closed,
/// }
///
/// impl State for Gate {
///     fn name(&self) -> &'static str {
///         match self {
///             Gate::Open => "Open",
///             Gate::Closed => "Closed",
///         }
///     }
/// }
///
/// impl StateTransitions for Gate {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         self != target
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Gate::Open => vec![Gate::Closed],
///             Gate::Closed => vec![Gate::Open],
///         }
///     }
/// }
///
/// let gate = Gate::Open;
/// assert!(gate.can_transition_to(&Gate::Closed));
/// assert!(!gate.can_transition_to(&Gate::Open));
/// ```
pub trait StateTransitions: State {
    /// Check if a transition to the target state is valid
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Get all valid target states from this state
    fn valid_transitions(&self) -> Vec<Self>;
}

/// Record of a state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StateTransition<S> {
    /// The state before the transition
    pub from: S,
    /// The state after the transition
    pub to: S,
    /// Unique identifier for this transition instance
    pub transition_id: Uuid,
    /// When the transition occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Validate a transition and produce its history record
///
/// Terminal states admit no outgoing edges. The caller applies the
/// returned record (set the new state, append to history); nothing is
/// mutated here.
pub fn apply_transition<S: StateTransitions>(
    current: &S,
    target: S,
) -> DomainResult<StateTransition<S>> {
    if current.is_terminal() || !current.can_transition_to(&target) {
        return Err(DomainError::InvalidStateTransition {
            from: current.name().to_string(),
            to: target.name().to_string(),
        });
    }

    Ok(StateTransition {
        from: current.clone(),
        to: target,
        transition_id: Uuid::new_v4(),
        timestamp: chrono::Utc::now(),
    })
}
