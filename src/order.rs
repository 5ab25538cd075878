//! Order aggregate: customer profile, line items, derived total, status
//!
//! An [`Order`] is born from an [`OrderDraft`] that passed
//! [`OrderDraft::validate_for_insert`]; the repository assigns the id
//! and calls [`ValidatedOrder::into_order`]. All later mutation flows
//! through [`Order::apply_patch`], which validates the whole patch
//! before committing any of it, keeps `total_price` equal to its
//! recomputation, and guards status transitions.

use crate::catalog::{FieldName, ProductCatalog, ProductSpec};
use crate::errors::{DomainError, DomainResult, MissingMeasurement};
use crate::identifiers::{OrderId, ProductKey};
use crate::lifecycle::OrderStatus;
use crate::patch::OrderPatch;
use crate::state_machine::{apply_transition, StateTransition};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Upper bound on any line item quantity
pub const QUANTITY_MAX: u8 = 20;

/// Customer contact block of an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CustomerProfile {
    /// Customer name (required, non-empty)
    pub name: String,

    /// Postal code, digits only once normalized
    pub zipcode: String,

    /// Delivery address (required, non-empty)
    pub address: String,

    /// Phone number (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Email address (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl CustomerProfile {
    /// Create a profile with the required fields
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zipcode: String::new(),
            address: address.into(),
            phone: None,
            email: None,
        }
    }

    /// Set the postal code
    pub fn with_zipcode(mut self, zipcode: impl Into<String>) -> Self {
        self.zipcode = zipcode.into();
        self
    }

    /// Set the phone number
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Set the email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// One product's quantity and measurement fields within an order
///
/// Which optional fields may carry a value is dictated by the product's
/// [`crate::catalog::ProductKind`]; a field outside the kind is a
/// validation error, not silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LineItem {
    /// Ordered quantity, `0..=QUANTITY_MAX`
    pub quantity: u8,

    /// Size label (QtySizeMemo products)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Waist value (Pants products)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waist: Option<f64>,

    /// Free-text length (Pants products)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,

    /// Style variant, when the product spec declares one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Free-text memo, unconstrained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl LineItem {
    /// A line item with only a quantity set
    pub fn with_quantity(quantity: u8) -> Self {
        Self {
            quantity,
            ..Self::default()
        }
    }

    /// Whether the given field holds a usable (non-blank) value
    pub fn has_value(&self, field: FieldName) -> bool {
        match field {
            FieldName::Size => self.size.as_deref().is_some_and(|s| !s.trim().is_empty()),
            FieldName::Waist => self.waist.is_some(),
            FieldName::Length => self.length.as_deref().is_some_and(|s| !s.trim().is_empty()),
            FieldName::Subtype => self
                .subtype
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty()),
            // Quantity always has a value; memos are never required
            FieldName::Quantity | FieldName::Memo => true,
        }
    }
}

/// Check a line item against its product's declared shape and domains
fn validate_line_item(spec: &ProductSpec, item: &LineItem) -> DomainResult<()> {
    let key = spec.key.as_str();

    if item.quantity > QUANTITY_MAX {
        return Err(DomainError::validation(format!(
            "Quantity {} for {key} exceeds the maximum of {QUANTITY_MAX}",
            item.quantity
        )));
    }

    if let Some(size) = &item.size {
        let domain = spec.size_domain().ok_or_else(|| {
            DomainError::validation(format!("Product {key} has no size field"))
        })?;
        if !domain.contains(size) {
            return Err(DomainError::OutOfDomainValue {
                product: key.to_string(),
                field: FieldName::Size.as_str().to_string(),
                value: size.clone(),
            });
        }
    }

    if let Some(waist) = item.waist {
        let domain = spec.waist_domain().ok_or_else(|| {
            DomainError::validation(format!("Product {key} has no waist field"))
        })?;
        if !domain.contains(waist) {
            return Err(DomainError::OutOfDomainValue {
                product: key.to_string(),
                field: FieldName::Waist.as_str().to_string(),
                value: crate::catalog::format_numeric(waist),
            });
        }
    }

    if item.length.is_some() && spec.length_hint().is_none() {
        return Err(DomainError::validation(format!(
            "Product {key} has no length field"
        )));
    }

    if let Some(subtype) = &item.subtype {
        let domain = spec.subtype_domain.as_ref().ok_or_else(|| {
            DomainError::validation(format!("Product {key} has no subtype field"))
        })?;
        if !domain.iter().any(|s| s == subtype) {
            return Err(DomainError::OutOfDomainValue {
                product: key.to_string(),
                field: FieldName::Subtype.as_str().to_string(),
                value: subtype.clone(),
            });
        }
    }

    Ok(())
}

/// Sum of quantity times unit price across the item map
fn compute_total(
    catalog: &ProductCatalog,
    items: &IndexMap<ProductKey, LineItem>,
) -> DomainResult<u32> {
    let mut total = 0u32;
    for (key, item) in items {
        let spec = catalog.resolve(key)?;
        total += u32::from(item.quantity) * spec.price;
    }
    Ok(total)
}

/// Required measurement fields still blank on quantity>0 line items
fn missing_in(
    catalog: &ProductCatalog,
    items: &IndexMap<ProductKey, LineItem>,
) -> DomainResult<Vec<MissingMeasurement>> {
    let mut missing = Vec::new();
    for (key, item) in items {
        if item.quantity == 0 {
            continue;
        }
        let spec = catalog.resolve(key)?;
        for field in spec.required_measurement_fields() {
            if !item.has_value(field) {
                missing.push(MissingMeasurement::new(key.as_str(), field.as_str()));
            }
        }
    }
    Ok(missing)
}

/// An order as entered by the customer, before insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Customer contact block
    pub customer: CustomerProfile,

    /// Line items keyed by product, catalog order
    pub items: IndexMap<ProductKey, LineItem>,
}

impl OrderDraft {
    /// Start a draft for a customer
    pub fn new(customer: CustomerProfile) -> Self {
        Self {
            customer,
            items: IndexMap::new(),
        }
    }

    /// Set a product's quantity, creating the line item if absent
    pub fn set_quantity(&mut self, key: impl Into<ProductKey>, quantity: u8) {
        self.items.entry(key.into()).or_default().quantity = quantity;
    }

    /// Builder form of [`OrderDraft::set_quantity`]
    pub fn with_quantity(mut self, key: impl Into<ProductKey>, quantity: u8) -> Self {
        self.set_quantity(key, quantity);
        self
    }

    /// Set a product's size, for specs that collect size at intake
    pub fn set_size(&mut self, key: impl Into<ProductKey>, size: impl Into<String>) {
        self.items.entry(key.into()).or_default().size = Some(size.into());
    }

    /// Validate the draft for insertion
    ///
    /// Requires a non-empty name and address and a positive total, and
    /// checks every line item against its product spec. Nothing is
    /// written on failure; the draft can be corrected and resubmitted.
    pub fn validate_for_insert(self, catalog: &ProductCatalog) -> DomainResult<ValidatedOrder> {
        if self.customer.name.trim().is_empty() {
            return Err(DomainError::validation("Name is required"));
        }
        if self.customer.address.trim().is_empty() {
            return Err(DomainError::validation("Address is required"));
        }

        for (key, item) in &self.items {
            let spec = catalog.resolve(key)?;
            validate_line_item(spec, item)?;
        }

        let total_price = compute_total(catalog, &self.items)?;
        if total_price == 0 {
            return Err(DomainError::validation(
                "Order must contain at least one item",
            ));
        }

        Ok(ValidatedOrder {
            customer: self.customer,
            items: self.items,
            total_price,
        })
    }
}

/// A draft that passed insertion validation
///
/// Only [`OrderDraft::validate_for_insert`] constructs this, so holding
/// one proves the invariants held at validation time. The repository
/// turns it into an [`Order`] once an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    customer: CustomerProfile,
    items: IndexMap<ProductKey, LineItem>,
    total_price: u32,
}

impl ValidatedOrder {
    /// The computed total price
    pub fn total_price(&self) -> u32 {
        self.total_price
    }

    /// The customer block
    pub fn customer(&self) -> &CustomerProfile {
        &self.customer
    }

    /// The validated line items
    pub fn items(&self) -> &IndexMap<ProductKey, LineItem> {
        &self.items
    }

    /// Materialize the order under a repository-assigned id
    pub fn into_order(self, id: OrderId) -> Order {
        let now = Utc::now();
        Order {
            id,
            customer: self.customer,
            status: OrderStatus::Waiting,
            total_price: self.total_price,
            items: self.items,
            created_at: now,
            updated_at: now,
            version: 1,
            transition_history: Vec::new(),
        }
    }
}

/// The order aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Order {
    id: OrderId,

    #[serde(flatten)]
    customer: CustomerProfile,

    status: OrderStatus,

    #[serde(rename = "totalPrice")]
    total_price: u32,

    items: IndexMap<ProductKey, LineItem>,

    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,

    #[serde(default)]
    version: u64,

    #[serde(default)]
    transition_history: Vec<StateTransition<OrderStatus>>,
}

impl Order {
    /// Repository-assigned id
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Customer contact block
    pub fn customer(&self) -> &CustomerProfile {
        &self.customer
    }

    /// Current lifecycle status
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Stored total price
    pub fn total_price(&self) -> u32 {
        self.total_price
    }

    /// Line items keyed by product
    pub fn items(&self) -> &IndexMap<ProductKey, LineItem> {
        &self.items
    }

    /// One line item, if present
    pub fn line(&self, key: &ProductKey) -> Option<&LineItem> {
        self.items.get(key)
    }

    /// Mutation counter, bumped on every successful change
    pub fn version(&self) -> u64 {
        self.version
    }

    /// When the order was inserted
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the order last changed
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Recorded status transitions, oldest first
    pub fn history(&self) -> &[StateTransition<OrderStatus>] {
        &self.transition_history
    }

    /// Recompute the total from the current items
    ///
    /// The stored total must always equal this; [`Order::apply_patch`]
    /// maintains that.
    pub fn recompute_total(&self, catalog: &ProductCatalog) -> DomainResult<u32> {
        compute_total(catalog, &self.items)
    }

    /// Required measurement fields still blank on quantity>0 items
    pub fn missing_measurements(
        &self,
        catalog: &ProductCatalog,
    ) -> DomainResult<Vec<MissingMeasurement>> {
        missing_in(catalog, &self.items)
    }

    /// Apply a partial update
    ///
    /// The whole patch is validated against the catalog before any field
    /// is written; on error the order is untouched. Field merges are
    /// per-field (untouched fields keep their stored values), the total
    /// is recomputed, and a requested status change runs through the
    /// lifecycle guards: `Measured` requires completeness, `Completed`
    /// re-confirmation is a no-op, and field changes on a completed
    /// order are refused.
    ///
    /// Returns the status transition, if one occurred.
    pub fn apply_patch(
        &mut self,
        catalog: &ProductCatalog,
        patch: &OrderPatch,
    ) -> DomainResult<Option<StateTransition<OrderStatus>>> {
        if !patch.items.is_empty() && self.status == OrderStatus::Completed {
            return Err(DomainError::OrderLocked {
                id: self.id.as_u64(),
            });
        }

        // Merge and validate every touched line before committing any
        let mut candidate = self.items.clone();
        for (key, line_patch) in &patch.items {
            let spec = catalog.resolve(key)?;
            let mut merged = candidate.get(key).cloned().unwrap_or_default();
            line_patch.merge_into(&mut merged);
            validate_line_item(spec, &merged)?;
            candidate.insert(key.clone(), merged);
        }

        let transition = match patch.status {
            Some(target) if target != self.status => {
                let transition = apply_transition(&self.status, target)?;
                if target == OrderStatus::Measured {
                    let missing = missing_in(catalog, &candidate)?;
                    if !missing.is_empty() {
                        return Err(DomainError::IncompleteMeasurement { missing });
                    }
                }
                Some(transition)
            }
            _ => None,
        };

        if patch.items.is_empty() && transition.is_none() {
            // Nothing to do; notably, re-confirming a completed order
            return Ok(None);
        }

        self.items = candidate;
        self.total_price = compute_total(catalog, &self.items)?;
        if let Some(transition) = &transition {
            self.status = transition.to;
            self.transition_history.push(transition.clone());
        }
        self.version += 1;
        self.updated_at = Utc::now();

        Ok(transition)
    }
}
