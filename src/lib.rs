//! # Atelier Domain
//!
//! Order state machine and product-configuration-driven form model for a
//! school tailoring workflow: a customer places a garment order, staff
//! records physical measurements against it, and the customer confirms
//! the measured result.
//!
//! The moving parts:
//! - **Product catalog**: a declarative per-product schema (kind, field
//!   domains, price) that drives both validation and form building
//! - **Order aggregate**: customer info, line items, a derived total
//!   that always equals its recomputation, and the lifecycle status
//! - **Patches**: every mutation is a partial update naming only the
//!   touched fields, validated in full before anything is written
//! - **Form model**: derives the editable field list per role, from
//!   customer intake through staff measurement to the final read-only view
//! - **Lifecycle**: Waiting, then Measured, then Completed; linear, no
//!   reverse edges, completeness-guarded, idempotent at the end
//! - **Handlers**: command handlers push changes through the repository
//!   and emit events; query handlers read and project
//! - **Collaborators**: the order repository and the address lookup are
//!   traits, with an in-process store and a zipcloud client provided
//!
//! ## Design principles
//!
//! 1. **Validate, then write**: a patch or draft either applies in full
//!    or leaves the stored record untouched
//! 2. **Patches, not overwrites**: concurrent staff and customer edits
//!    merge per field instead of clobbering each other
//! 3. **Status as the coarse gate**: who may change what is decided by
//!    where the order sits in its lifecycle
//! 4. **Declarative schema over branching**: adding a product shape is
//!    one new kind variant, not new form code

#![warn(missing_docs)]

pub mod address;
pub mod catalog;
pub mod command_handlers;
pub mod commands;
pub mod errors;
pub mod events;
pub mod form;
pub mod identifiers;
pub mod lifecycle;
pub mod order;
pub mod patch;
pub mod poll;
pub mod query_handlers;
pub mod repository;
pub mod session;
pub mod state_machine;
#[cfg(feature = "zipcloud")]
pub mod zipcloud;

// Re-export core types
pub use address::{normalize_zipcode, AddressLookup, ResolvedAddress, StaticAddressLookup, Zipcode};
pub use catalog::{
    format_numeric, FieldName, NumericRange, ProductCatalog, ProductKind, ProductSpec,
    SizeDomain,
};
pub use command_handlers::{EventPublisher, MockEventPublisher, OrderCommandHandler};
pub use commands::{AdjustQuantities, ConfirmOrder, PlaceOrder, RecordMeasurements};
pub use errors::{DomainError, DomainResult, MissingMeasurement};
pub use events::{
    DomainEvent, MeasurementsRecorded, OrderConfirmed, OrderMeasured, OrderPlaced,
    QuantitiesAdjusted,
};
pub use form::{
    draft_from_submission, fields_for, final_view, intake_form, measurement_form,
    FieldControl, FieldValue, FormField, FormRole, FormSubmission, FormView,
    CUSTOMER_QUANTITY_MAX,
};
pub use identifiers::{OrderId, ProductKey, SessionId};
pub use lifecycle::OrderStatus;
pub use order::{
    CustomerProfile, LineItem, Order, OrderDraft, ValidatedOrder, QUANTITY_MAX,
};
pub use patch::{LineItemPatch, OrderPatch};
pub use poll::{
    poll_until_status_leaves, PollConfig, PollOutcome, DEFAULT_POLL_INTERVAL,
};
pub use query_handlers::{FinalReview, OrderQueryHandler};
pub use repository::{InMemoryOrderRepository, OrderRepository, OrderSummary};
pub use session::{
    phase_for_status, CustomerPhase, CustomerSession, SharedCredentials, PASSWORD_ENV,
    USER_ID_ENV,
};
pub use state_machine::{apply_transition, State, StateTransition, StateTransitions};
#[cfg(feature = "zipcloud")]
pub use zipcloud::ZipcloudClient;
