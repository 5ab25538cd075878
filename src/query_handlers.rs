//! Query handlers for the order workflow
//!
//! The read side: fetch one order, its bare status for polling, the
//! staff listing, and the two form projections. Queries never mutate
//! and never publish; repeating one any number of times observes the
//! same stored state.

use crate::catalog::ProductCatalog;
use crate::errors::DomainResult;
use crate::form::{self, FormView};
use crate::identifiers::OrderId;
use crate::lifecycle::OrderStatus;
use crate::order::{CustomerProfile, Order};
use crate::repository::{OrderRepository, OrderSummary};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Final confirmation page: who ordered, displayed over the locked form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinalReview {
    /// Name and shipping address as placed
    pub customer: CustomerProfile,
    /// Read-only snapshot of every ordered line
    pub view: FormView,
}

/// Read-side access to orders and their form projections
pub struct OrderQueryHandler<R: OrderRepository> {
    repository: Arc<R>,
    catalog: Arc<ProductCatalog>,
}

impl<R: OrderRepository> OrderQueryHandler<R> {
    /// Create a handler over a repository and catalog
    pub fn new(repository: Arc<R>, catalog: Arc<ProductCatalog>) -> Self {
        Self {
            repository,
            catalog,
        }
    }

    /// Fetch one order in full
    pub async fn order(&self, id: OrderId) -> DomainResult<Order> {
        self.repository.fetch_by_id(id).await
    }

    /// Fetch just the status, the primitive the customer poll loop uses
    pub async fn status(&self, id: OrderId) -> DomainResult<OrderStatus> {
        Ok(self.repository.fetch_by_id(id).await?.status())
    }

    /// Staff listing, ordered by id ascending
    pub async fn summaries(&self) -> DomainResult<Vec<OrderSummary>> {
        self.repository.list_summaries().await
    }

    /// Editable measurement sheet for staff
    pub async fn measurement_view(&self, id: OrderId) -> DomainResult<FormView> {
        let order = self.repository.fetch_by_id(id).await?;
        Ok(form::measurement_form(&self.catalog, &order))
    }

    /// Read-only final confirmation page for the customer
    pub async fn final_view(&self, id: OrderId) -> DomainResult<FinalReview> {
        let order = self.repository.fetch_by_id(id).await?;
        Ok(FinalReview {
            customer: order.customer().clone(),
            view: form::final_view(&self.catalog, &order),
        })
    }
}
