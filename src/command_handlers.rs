// Copyright 2025 Cowboy AI, LLC.

//! Command handlers for the order workflow
//!
//! Handlers validate a command against the loaded order, push the
//! change through the repository as a partial update, and emit events
//! once the store accepted it. Publishing is best effort: a failed
//! publish is logged as a warning and the accepted change still
//! returns Ok. Role rules live here: the customer edit gate and the
//! staff finalize flag are handler concerns, while field and lifecycle
//! rules belong to the aggregate itself.

use crate::catalog::ProductCatalog;
use crate::commands::{AdjustQuantities, ConfirmOrder, PlaceOrder, RecordMeasurements};
use crate::errors::{DomainError, DomainResult};
use crate::events::{
    DomainEvent, MeasurementsRecorded, OrderConfirmed, OrderMeasured, OrderPlaced,
    QuantitiesAdjusted,
};
use crate::identifiers::OrderId;
use crate::lifecycle::OrderStatus;
use crate::order::Order;
use crate::patch::OrderPatch;
use crate::repository::OrderRepository;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Event publisher trait for handlers to emit events
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    fn publish_events(&self, events: Vec<Box<dyn DomainEvent>>) -> DomainResult<()>;
}

/// Mock event publisher for testing
#[derive(Clone)]
pub struct MockEventPublisher {
    published_events: Arc<RwLock<Vec<(String, OrderId)>>>,
}

impl Default for MockEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEventPublisher {
    /// Create a new mock event publisher for testing
    pub fn new() -> Self {
        Self {
            published_events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get all published events for verification in tests
    pub fn get_published_events(&self) -> Vec<(String, OrderId)> {
        // Only the type name and order id are tracked, to avoid cloning
        // trait objects.
        self.published_events.read().unwrap().clone()
    }
}

impl EventPublisher for MockEventPublisher {
    fn publish_events(&self, events: Vec<Box<dyn DomainEvent>>) -> DomainResult<()> {
        let mut published = self.published_events.write().unwrap();
        for event in events {
            published.push((event.event_type().to_string(), event.order_id()));
        }
        Ok(())
    }
}

/// Handles every order command against one repository and catalog
pub struct OrderCommandHandler<R: OrderRepository> {
    repository: Arc<R>,
    catalog: Arc<ProductCatalog>,
    publisher: Arc<dyn EventPublisher>,
}

impl<R: OrderRepository> OrderCommandHandler<R> {
    /// Create a handler over a repository, catalog, and publisher
    pub fn new(
        repository: Arc<R>,
        catalog: Arc<ProductCatalog>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            catalog,
            publisher,
        }
    }

    /// Publish accepted-change events, logging instead of failing
    fn publish(&self, events: Vec<Box<dyn DomainEvent>>) {
        if let Err(e) = self.publisher.publish_events(events) {
            warn!("Event publish failed: {}", e);
        }
    }

    /// Validate and insert a customer draft
    ///
    /// Returns only the assigned id; the caller fetches when it needs
    /// the stored record.
    pub async fn place_order(&self, command: PlaceOrder) -> DomainResult<OrderId> {
        let validated = command.draft.validate_for_insert(&self.catalog)?;
        let total_price = validated.total_price();
        let id = self.repository.insert(validated).await?;

        info!("Order {} placed with total {}", id, total_price);
        self.publish(vec![Box::new(OrderPlaced::new(id, total_price))]);
        Ok(id)
    }

    /// Customer quantity edit, allowed only while the order waits
    pub async fn adjust_quantities(&self, command: AdjustQuantities) -> DomainResult<Order> {
        let current = self.repository.fetch_by_id(command.order_id).await?;
        if current.status() != OrderStatus::Waiting {
            return Err(DomainError::validation(format!(
                "Order {} is already being measured and can no longer be edited",
                command.order_id
            )));
        }

        let patch = OrderPatch::quantities(command.quantities);
        let updated = self.repository.update_fields(command.order_id, &patch).await?;

        debug!(
            "Order {} quantities adjusted, total now {}",
            updated.id(),
            updated.total_price()
        );
        self.publish(vec![Box::new(QuantitiesAdjusted::new(
            updated.id(),
            updated.total_price(),
        ))]);
        Ok(updated)
    }

    /// Staff measurement save, optionally finalizing to Measured
    ///
    /// A progressive save (finalize off) just merges fields. With
    /// finalize on, the store applies the completeness guard and the
    /// Waiting to Measured transition atomically with the fields.
    /// Every accepted save emits [`MeasurementsRecorded`]; the
    /// finalizing one adds [`OrderMeasured`].
    pub async fn record_measurements(
        &self,
        command: RecordMeasurements,
    ) -> DomainResult<Order> {
        let before = self.repository.fetch_by_id(command.order_id).await?;

        let mut patch = command.patch;
        if command.finalize {
            patch.status = Some(OrderStatus::Measured);
        }
        let updated = self.repository.update_fields(command.order_id, &patch).await?;

        let mut events: Vec<Box<dyn DomainEvent>> =
            vec![Box::new(MeasurementsRecorded::new(updated.id()))];
        if before.status() == OrderStatus::Waiting && updated.status() == OrderStatus::Measured {
            info!("Order {} measured", updated.id());
            events.push(Box::new(OrderMeasured::new(updated.id())));
        }
        self.publish(events);
        Ok(updated)
    }

    /// Customer final confirmation, idempotent once completed
    pub async fn confirm_order(&self, command: ConfirmOrder) -> DomainResult<Order> {
        let before = self.repository.fetch_by_id(command.order_id).await?;
        let updated = self
            .repository
            .update_fields(command.order_id, &OrderPatch::confirmation())
            .await?;

        if before.status() == OrderStatus::Measured && updated.status() == OrderStatus::Completed
        {
            info!("Order {} confirmed", updated.id());
            self.publish(vec![Box::new(OrderConfirmed::new(updated.id()))]);
        }
        Ok(updated)
    }
}
