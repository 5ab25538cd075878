// Copyright 2025 Cowboy AI, LLC.

//! Order persistence: the repository contract and an in-process
//! implementation
//!
//! The backing store is an external collaborator; handlers and the poll
//! loop only see [`OrderRepository`]. Updates are targeted partial
//! merges, never whole-record overwrites, so a staff measurement
//! session and a customer quantity edit can touch the same order
//! without clobbering each other's fields.

use crate::catalog::ProductCatalog;
use crate::errors::{DomainError, DomainResult};
use crate::identifiers::OrderId;
use crate::lifecycle::OrderStatus;
use crate::order::{Order, ValidatedOrder};
use crate::patch::OrderPatch;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// One row of the staff order listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OrderSummary {
    /// Order id
    pub id: OrderId,
    /// Customer name
    pub name: String,
    /// Current lifecycle status
    pub status: OrderStatus,
}

/// Persistence contract for orders
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a validated draft and assign the next id
    async fn insert(&self, validated: ValidatedOrder) -> DomainResult<OrderId>;

    /// Fetch one order; an absent id is [`DomainError::NotFound`]
    async fn fetch_by_id(&self, id: OrderId) -> DomainResult<Order>;

    /// Merge a partial update into a stored order and return the
    /// merged result
    ///
    /// The merge carries the full patch semantics: per-field overwrite,
    /// total recomputation, and lifecycle guards.
    async fn update_fields(&self, id: OrderId, patch: &OrderPatch) -> DomainResult<Order>;

    /// Listing rows for every order, ordered by id ascending
    async fn list_summaries(&self) -> DomainResult<Vec<OrderSummary>>;
}

/// Map-backed repository for tests and single-process deployments
///
/// Ids ascend from 1 in insertion order. The catalog is held so merges
/// validate fields and recompute totals the same way any real backend
/// must before persisting.
#[derive(Clone)]
pub struct InMemoryOrderRepository {
    catalog: Arc<ProductCatalog>,
    orders: Arc<RwLock<BTreeMap<u64, Order>>>,
}

impl InMemoryOrderRepository {
    /// Create an empty repository over a catalog
    pub fn new(catalog: Arc<ProductCatalog>) -> Self {
        Self {
            catalog,
            orders: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, validated: ValidatedOrder) -> DomainResult<OrderId> {
        let mut orders = self.orders.write().unwrap();
        let next = orders.keys().next_back().copied().unwrap_or(0) + 1;
        let id = OrderId::from_raw(next);
        orders.insert(next, validated.into_order(id));
        Ok(id)
    }

    async fn fetch_by_id(&self, id: OrderId) -> DomainResult<Order> {
        self.orders
            .read()
            .unwrap()
            .get(&id.as_u64())
            .cloned()
            .ok_or(DomainError::NotFound { id: id.as_u64() })
    }

    async fn update_fields(&self, id: OrderId, patch: &OrderPatch) -> DomainResult<Order> {
        let mut orders = self.orders.write().unwrap();
        let order = orders
            .get_mut(&id.as_u64())
            .ok_or(DomainError::NotFound { id: id.as_u64() })?;
        order.apply_patch(&self.catalog, patch)?;
        Ok(order.clone())
    }

    async fn list_summaries(&self) -> DomainResult<Vec<OrderSummary>> {
        let orders = self.orders.read().unwrap();
        // BTreeMap iteration gives ascending ids for free
        Ok(orders
            .values()
            .map(|order| OrderSummary {
                id: order.id(),
                name: order.customer().name.clone(),
                status: order.status(),
            })
            .collect())
    }
}
