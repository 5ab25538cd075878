//! Commands for the order workflow
//!
//! Commands are thin, serializable requests. All behavior lives in
//! [`crate::command_handlers`]; a command only says what the caller
//! wants done and to which order.

use crate::identifiers::{OrderId, ProductKey};
use crate::order::OrderDraft;
use crate::patch::OrderPatch;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Customer submits a new order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrder {
    /// The draft as entered on the intake form
    pub draft: OrderDraft,
}

impl PlaceOrder {
    /// Wrap a draft for submission
    pub fn new(draft: OrderDraft) -> Self {
        Self { draft }
    }
}

/// Customer changes quantities while the order is still waiting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustQuantities {
    /// The order being edited
    pub order_id: OrderId,
    /// New quantity per touched product; untouched products keep theirs
    pub quantities: IndexMap<ProductKey, u8>,
}

impl AdjustQuantities {
    /// Build from (product, quantity) pairs
    pub fn new<K, I>(order_id: OrderId, pairs: I) -> Self
    where
        K: Into<ProductKey>,
        I: IntoIterator<Item = (K, u8)>,
    {
        Self {
            order_id,
            quantities: pairs.into_iter().map(|(k, q)| (k.into(), q)).collect(),
        }
    }
}

/// Staff records measurement fields, optionally finalizing the order
/// as measured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeasurements {
    /// The order being measured
    pub order_id: OrderId,
    /// Field changes, one line patch per touched product
    pub patch: OrderPatch,
    /// Request the Waiting to Measured transition with this save
    #[serde(default)]
    pub finalize: bool,
}

impl RecordMeasurements {
    /// A progressive save that leaves the status alone
    pub fn new(order_id: OrderId, patch: OrderPatch) -> Self {
        Self {
            order_id,
            patch,
            finalize: false,
        }
    }

    /// Also request the transition to Measured
    pub fn finalizing(mut self) -> Self {
        self.finalize = true;
        self
    }
}

/// Customer confirms the measured order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmOrder {
    /// The order being confirmed
    pub order_id: OrderId,
}

impl ConfirmOrder {
    /// Confirm the given order
    pub fn new(order_id: OrderId) -> Self {
        Self { order_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::LineItemPatch;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_adjust_quantities_from_pairs() {
        let command = AdjustQuantities::new(OrderId::from_raw(3), [("shirt", 2), ("vest", 0)]);

        assert_eq!(command.order_id.as_u64(), 3);
        assert_eq!(command.quantities.len(), 2);
        assert_eq!(command.quantities[&ProductKey::from("shirt")], 2);
    }

    #[test]
    fn test_record_measurements_finalizing() {
        let patch = OrderPatch::new().line("pants", LineItemPatch::quantity_only(1));
        let command = RecordMeasurements::new(OrderId::from_raw(1), patch.clone());
        assert!(!command.finalize);

        let finalizing = command.finalizing();
        assert!(finalizing.finalize);
        assert_eq!(finalizing.patch, patch);
    }

    #[test]
    fn test_commands_serde_round_trip() {
        let command = AdjustQuantities::new(OrderId::from_raw(7), [("shirt", 3)]);
        let json = serde_json::to_string(&command).unwrap();
        let back: AdjustQuantities = serde_json::from_str(&json).unwrap();
        assert_eq!(back, command);

        // finalize defaults to false when absent
        let json = serde_json::json!({"order_id": 1, "patch": {}});
        let back: RecordMeasurements = serde_json::from_value(json).unwrap();
        assert!(!back.finalize);
        assert!(back.patch.is_empty());
    }
}
