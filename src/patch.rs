// Copyright 2025 Cowboy AI, LLC.

//! Partial updates for orders
//!
//! Callers never send a whole order back; they send an [`OrderPatch`]
//! naming just the fields they touched. `None` means "leave as stored",
//! so a staff member editing one product's waist cannot erase another
//! product's memo. [`crate::order::Order::apply_patch`] owns the
//! validate-then-commit semantics; this module is the data shape and
//! the raw per-field merge.

use crate::identifiers::ProductKey;
use crate::lifecycle::OrderStatus;
use crate::order::LineItem;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Field-level update for one line item
///
/// Every field is optional; only the `Some` fields overwrite stored
/// values. A patch can set a field but never clear one back to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LineItemPatch {
    /// New quantity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u8>,

    /// New size label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// New waist value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waist: Option<f64>,

    /// New length text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,

    /// New style variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// New memo text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl LineItemPatch {
    /// A patch carrying only a quantity change
    pub fn quantity_only(quantity: u8) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }

    /// Whether the patch touches nothing
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none()
            && self.size.is_none()
            && self.waist.is_none()
            && self.length.is_none()
            && self.subtype.is_none()
            && self.memo.is_none()
    }

    /// Overwrite the `Some` fields onto a stored line item
    pub fn merge_into(&self, item: &mut LineItem) {
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(size) = &self.size {
            item.size = Some(size.clone());
        }
        if let Some(waist) = self.waist {
            item.waist = Some(waist);
        }
        if let Some(length) = &self.length {
            item.length = Some(length.clone());
        }
        if let Some(subtype) = &self.subtype {
            item.subtype = Some(subtype.clone());
        }
        if let Some(memo) = &self.memo {
            item.memo = Some(memo.clone());
        }
    }
}

/// Partial update for an order: touched line items plus an optional
/// status change, applied atomically
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OrderPatch {
    /// Line item patches keyed by product
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub items: IndexMap<ProductKey, LineItemPatch>,

    /// Requested status, when the update also moves the lifecycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl OrderPatch {
    /// An empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line item patch
    pub fn line(mut self, key: impl Into<ProductKey>, patch: LineItemPatch) -> Self {
        self.items.insert(key.into(), patch);
        self
    }

    /// Quantity-only patches for several products at once
    pub fn quantities<K, I>(pairs: I) -> Self
    where
        K: Into<ProductKey>,
        I: IntoIterator<Item = (K, u8)>,
    {
        let mut patch = Self::new();
        for (key, quantity) in pairs {
            patch
                .items
                .insert(key.into(), LineItemPatch::quantity_only(quantity));
        }
        patch
    }

    /// Also request the `Measured` status
    pub fn finalize_measured(mut self) -> Self {
        self.status = Some(OrderStatus::Measured);
        self
    }

    /// A patch that only confirms the order
    pub fn confirmation() -> Self {
        Self {
            items: IndexMap::new(),
            status: Some(OrderStatus::Completed),
        }
    }

    /// Whether the patch changes nothing at all
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.status.is_none()
    }
}
