//! Customer session state: explicit phases instead of scattered flags
//!
//! A session is a value passed through request handling. Its phase is a
//! small state machine over the customer-facing steps; the one backward
//! edge is Confirm back to Input, for the "fix it" button on the
//! confirmation screen. Order status maps onto the tail of the phase
//! chain, which is how the poll loop moves a waiting session forward.

use crate::address::ResolvedAddress;
use crate::errors::{DomainError, DomainResult};
use crate::identifiers::{OrderId, SessionId};
use crate::lifecycle::OrderStatus;
use crate::order::OrderDraft;
use crate::state_machine::{apply_transition, State, StateTransition, StateTransitions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The customer-facing step within the order flow
///
/// Distinct from [`OrderStatus`]: the first three phases exist before
/// any order does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CustomerPhase {
    /// Credential entry
    Login,
    /// Filling the intake form
    Input,
    /// Reviewing the draft before submission
    Confirm,
    /// Order placed, polling until staff measures it
    AwaitingMeasurement,
    /// Reviewing the measured order
    FinalConfirm,
    /// Confirmed, nothing left to do
    Done,
}

impl CustomerPhase {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Input => "input",
            Self::Confirm => "confirm",
            Self::AwaitingMeasurement => "awaiting_measurement",
            Self::FinalConfirm => "final_confirm",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CustomerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl State for CustomerPhase {
    fn name(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Input => "Input",
            Self::Confirm => "Confirm",
            Self::AwaitingMeasurement => "AwaitingMeasurement",
            Self::FinalConfirm => "FinalConfirm",
            Self::Done => "Done",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl StateTransitions for CustomerPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Login => vec![Self::Input],
            Self::Input => vec![Self::Confirm],
            // The confirmation screen can send the customer back to edit
            Self::Confirm => vec![Self::Input, Self::AwaitingMeasurement],
            Self::AwaitingMeasurement => vec![Self::FinalConfirm],
            Self::FinalConfirm => vec![Self::Done],
            Self::Done => vec![],
        }
    }
}

/// The phase a session should sit in given its order's status
pub fn phase_for_status(status: OrderStatus) -> CustomerPhase {
    match status {
        OrderStatus::Waiting => CustomerPhase::AwaitingMeasurement,
        OrderStatus::Measured => CustomerPhase::FinalConfirm,
        OrderStatus::Completed => CustomerPhase::Done,
    }
}

/// Environment variable holding the expected user id
pub const USER_ID_ENV: &str = "ATELIER_USER_ID";

/// Environment variable holding the expected password
pub const PASSWORD_ENV: &str = "ATELIER_PASSWORD";

/// The single shared credential pair both apps authenticate against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedCredentials {
    /// Expected user id
    pub user_id: String,
    /// Expected password
    pub password: String,
}

impl SharedCredentials {
    /// Build the expected pair, typically from deployment configuration
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: password.into(),
        }
    }

    /// Read the expected pair from `ATELIER_USER_ID` / `ATELIER_PASSWORD`
    pub fn from_env() -> DomainResult<Self> {
        let user_id = std::env::var(USER_ID_ENV)
            .map_err(|_| DomainError::validation(format!("{USER_ID_ENV} is not set")))?;
        let password = std::env::var(PASSWORD_ENV)
            .map_err(|_| DomainError::validation(format!("{PASSWORD_ENV} is not set")))?;
        Ok(Self { user_id, password })
    }

    /// Check a submitted pair
    pub fn verify(&self, user_id: &str, password: &str) -> bool {
        self.user_id == user_id && self.password == password
    }
}

/// One customer's in-progress interaction with the order flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSession {
    /// Session identity
    pub id: SessionId,

    /// Current phase
    phase: CustomerPhase,

    /// The order this session placed, once one exists
    order_id: Option<OrderId>,

    /// In-progress draft; survives a failed submit so the customer can
    /// correct and resubmit
    draft: Option<OrderDraft>,

    /// Address resolved by an explicit lookup, cached so a trip back to
    /// the input form does not repeat the call
    address: Option<ResolvedAddress>,
}

impl CustomerSession {
    /// A fresh session at the login screen
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            phase: CustomerPhase::Login,
            order_id: None,
            draft: None,
            address: None,
        }
    }

    /// Current phase
    pub fn phase(&self) -> CustomerPhase {
        self.phase
    }

    /// The placed order's id, if any
    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    /// Authenticate against the shared pair and enter the input phase
    pub fn login(
        &mut self,
        expected: &SharedCredentials,
        user_id: &str,
        password: &str,
    ) -> DomainResult<()> {
        if !expected.verify(user_id, password) {
            return Err(DomainError::validation("User id or password is incorrect"));
        }
        self.advance(CustomerPhase::Input)?;
        Ok(())
    }

    /// Move to a phase, guarded by the phase machine
    pub fn advance(
        &mut self,
        target: CustomerPhase,
    ) -> DomainResult<StateTransition<CustomerPhase>> {
        let transition = apply_transition(&self.phase, target)?;
        self.phase = transition.to;
        Ok(transition)
    }

    /// Keep the draft across a round trip or a failed submit
    pub fn stash_draft(&mut self, draft: OrderDraft) {
        self.draft = Some(draft);
    }

    /// Take the stashed draft back for editing or resubmission
    pub fn take_draft(&mut self) -> Option<OrderDraft> {
        self.draft.take()
    }

    /// Cache a lookup result for input-form pre-fill
    pub fn cache_address(&mut self, address: ResolvedAddress) {
        self.address = Some(address);
    }

    /// The cached lookup result, if any
    pub fn resolved_address(&self) -> Option<&ResolvedAddress> {
        self.address.as_ref()
    }

    /// Record the placed order and drop the consumed draft
    pub fn attach_order(&mut self, order_id: OrderId) {
        self.order_id = Some(order_id);
        self.draft = None;
    }

    /// Advance the waiting tail of the phase chain to match an observed
    /// order status
    ///
    /// Returns the transitions performed, oldest first; an unchanged
    /// status performs none. Only sessions already past submission can
    /// observe a status.
    pub fn observe_status(
        &mut self,
        status: OrderStatus,
    ) -> DomainResult<Vec<StateTransition<CustomerPhase>>> {
        if !matches!(
            self.phase,
            CustomerPhase::AwaitingMeasurement | CustomerPhase::FinalConfirm | CustomerPhase::Done
        ) {
            return Err(DomainError::validation(
                "Session has not submitted an order yet",
            ));
        }

        let target = phase_for_status(status);
        let mut transitions = Vec::new();
        while self.phase != target {
            let next = match self.phase {
                CustomerPhase::AwaitingMeasurement => CustomerPhase::FinalConfirm,
                CustomerPhase::FinalConfirm => CustomerPhase::Done,
                // target is behind us; the status never moves backward
                _ => break,
            };
            transitions.push(self.advance(next)?);
        }
        Ok(transitions)
    }
}

impl Default for CustomerSession {
    fn default() -> Self {
        Self::new()
    }
}
