use std::sync::Arc;
use std::time::Duration;

use atelier_domain::{
    poll_until_status_leaves, AdjustQuantities, ConfirmOrder, CustomerProfile, DomainError,
    DomainEvent, DomainResult, EventPublisher, InMemoryOrderRepository, LineItemPatch,
    MockEventPublisher, OrderCommandHandler, OrderDraft, OrderPatch, OrderQueryHandler,
    OrderStatus, PlaceOrder, PollConfig, PollOutcome, ProductCatalog, ProductKey,
    RecordMeasurements,
};
use mockall::mock;
use tokio::sync::watch;

struct Workflow {
    commands: OrderCommandHandler<InMemoryOrderRepository>,
    queries: OrderQueryHandler<InMemoryOrderRepository>,
    repository: Arc<InMemoryOrderRepository>,
    publisher: MockEventPublisher,
}

fn workflow() -> Workflow {
    let catalog = Arc::new(ProductCatalog::standard());
    let repository = Arc::new(InMemoryOrderRepository::new(catalog.clone()));
    let publisher = MockEventPublisher::new();
    Workflow {
        commands: OrderCommandHandler::new(
            repository.clone(),
            catalog.clone(),
            Arc::new(publisher.clone()),
        ),
        queries: OrderQueryHandler::new(repository.clone(), catalog),
        repository,
        publisher,
    }
}

fn key(s: &str) -> ProductKey {
    ProductKey::from(s)
}

fn taro_draft() -> OrderDraft {
    OrderDraft::new(
        CustomerProfile::new("Taro", "Kitashirakawa, Sakyo-ku, Kyoto").with_zipcode("6068267"),
    )
    .with_quantity("shirt", 2)
}

#[tokio::test]
async fn customer_places_order_and_waits() {
    let w = workflow();

    let id = w
        .commands
        .place_order(PlaceOrder::new(taro_draft()))
        .await
        .expect("place order");
    assert_eq!(id.as_u64(), 1);

    let order = w.queries.order(id).await.expect("fetch");
    assert_eq!(order.status(), OrderStatus::Waiting);
    assert_eq!(order.total_price(), 4000);
    assert_eq!(order.version(), 1);
    assert_eq!(order.customer().name, "Taro");

    let summaries = w.queries.summaries().await.expect("list");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, id);
    assert_eq!(summaries[0].name, "Taro");
    assert_eq!(summaries[0].status, OrderStatus::Waiting);

    assert_eq!(
        w.publisher.get_published_events(),
        vec![("OrderPlaced".to_string(), id)]
    );
}

#[tokio::test]
async fn quantities_stay_editable_until_measurement_begins() {
    let w = workflow();
    let id = w
        .commands
        .place_order(PlaceOrder::new(taro_draft()))
        .await
        .expect("place order");

    let updated = w
        .commands
        .adjust_quantities(AdjustQuantities::new(id, [("shirt", 3), ("vest", 1)]))
        .await
        .expect("adjust while waiting");
    assert_eq!(updated.total_price(), 3 * 2000 + 4000);
    assert_eq!(updated.version(), 2);

    // Staff takes over and finalizes
    let patch = OrderPatch::new()
        .line(
            "shirt",
            LineItemPatch {
                size: Some("M".into()),
                ..LineItemPatch::default()
            },
        )
        .line(
            "vest",
            LineItemPatch {
                size: Some("L".into()),
                ..LineItemPatch::default()
            },
        );
    w.commands
        .record_measurements(RecordMeasurements::new(id, patch).finalizing())
        .await
        .expect("finalize measurement");

    let err = w
        .commands
        .adjust_quantities(AdjustQuantities::new(id, [("shirt", 1)]))
        .await
        .expect_err("customer edits are closed once measuring starts");
    assert!(err.to_string().contains("can no longer be edited"));

    // The rejected edit left nothing behind
    let order = w.queries.order(id).await.expect("fetch");
    assert_eq!(order.line(&key("shirt")).expect("shirt line").quantity, 3);
    assert_eq!(order.status(), OrderStatus::Measured);
}

#[tokio::test]
async fn staff_measures_progressively_then_finalizes() {
    let w = workflow();
    let draft = OrderDraft::new(CustomerProfile::new("Taro", "Kyoto"))
        .with_quantity("pants", 1)
        .with_quantity("shirt", 2);
    let id = w
        .commands
        .place_order(PlaceOrder::new(draft))
        .await
        .expect("place order");

    // First visit: waist and a fitting note, no finalize
    let first = OrderPatch::new().line(
        "pants",
        LineItemPatch {
            waist: Some(70.0),
            memo: Some("cuffs doubled".into()),
            ..LineItemPatch::default()
        },
    );
    let after_first = w
        .commands
        .record_measurements(RecordMeasurements::new(id, first))
        .await
        .expect("progressive save");
    assert_eq!(after_first.status(), OrderStatus::Waiting);
    assert_eq!(after_first.version(), 2);

    // Second visit fills the rest and finalizes; the note survives
    let second = OrderPatch::new()
        .line(
            "pants",
            LineItemPatch {
                length: Some("73".into()),
                ..LineItemPatch::default()
            },
        )
        .line(
            "shirt",
            LineItemPatch {
                size: Some("M".into()),
                ..LineItemPatch::default()
            },
        );
    let after_second = w
        .commands
        .record_measurements(RecordMeasurements::new(id, second).finalizing())
        .await
        .expect("finalize");
    assert_eq!(after_second.status(), OrderStatus::Measured);

    let pants = after_second.line(&key("pants")).expect("pants line");
    assert_eq!(pants.waist, Some(70.0));
    assert_eq!(pants.length.as_deref(), Some("73"));
    assert_eq!(pants.memo.as_deref(), Some("cuffs doubled"));

    let events: Vec<String> = w
        .publisher
        .get_published_events()
        .into_iter()
        .map(|(event_type, _)| event_type)
        .collect();
    assert_eq!(
        events,
        vec![
            "OrderPlaced",
            "MeasurementsRecorded",
            "MeasurementsRecorded",
            "OrderMeasured",
        ]
    );
}

#[tokio::test]
async fn finalize_rejects_incomplete_measurements() {
    let w = workflow();
    let draft = OrderDraft::new(CustomerProfile::new("Taro", "Kyoto")).with_quantity("blazer", 1);
    let id = w
        .commands
        .place_order(PlaceOrder::new(draft))
        .await
        .expect("place order");

    let err = w
        .commands
        .record_measurements(RecordMeasurements::new(id, OrderPatch::new()).finalizing())
        .await
        .expect_err("blazer size is still missing");
    match &err {
        DomainError::IncompleteMeasurement { missing } => {
            assert_eq!(missing.len(), 1);
            assert_eq!(missing[0].product, "blazer");
            assert_eq!(missing[0].field, "size");
        }
        other => panic!("Expected IncompleteMeasurement, got {other:?}"),
    }

    // Nothing moved and nothing was emitted beyond the placement
    let order = w.queries.order(id).await.expect("fetch");
    assert_eq!(order.status(), OrderStatus::Waiting);
    assert_eq!(order.version(), 1);
    assert_eq!(w.publisher.get_published_events().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn customer_poll_observes_measurement() {
    let Workflow {
        commands,
        queries,
        repository,
        ..
    } = workflow();
    let draft = OrderDraft::new(CustomerProfile::new("Taro", "Kyoto")).with_quantity("necktie", 2);
    let id = commands
        .place_order(PlaceOrder::new(draft))
        .await
        .expect("place order");

    // Staff finishes while the customer is polling
    let staff = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(7)).await;
        commands
            .record_measurements(RecordMeasurements::new(id, OrderPatch::new()).finalizing())
            .await
            .expect("finalize");
    });

    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let config = PollConfig {
        interval: Duration::from_secs(5),
        max_duration: None,
    };
    let outcome =
        poll_until_status_leaves(&*repository, id, OrderStatus::Waiting, &config, cancel_rx)
            .await
            .expect("poll");
    match outcome {
        PollOutcome::Ready(measured) => assert_eq!(measured.status(), OrderStatus::Measured),
        other => panic!("Expected Ready, got {other:?}"),
    }
    staff.await.expect("staff task");

    // Polling only reads; the single staff write accounts for the version
    let order = queries.order(id).await.expect("fetch");
    assert_eq!(order.version(), 2);
    assert_eq!(order.status(), OrderStatus::Measured);
}

#[tokio::test]
async fn confirmation_requires_measurement_and_is_idempotent() {
    let w = workflow();
    let draft = OrderDraft::new(CustomerProfile::new("Taro", "Kyoto")).with_quantity("necktie", 1);
    let id = w
        .commands
        .place_order(PlaceOrder::new(draft))
        .await
        .expect("place order");

    let err = w
        .commands
        .confirm_order(ConfirmOrder::new(id))
        .await
        .expect_err("nothing to confirm while waiting");
    assert_eq!(
        err.to_string(),
        "Invalid state transition from Waiting to Completed"
    );

    w.commands
        .record_measurements(RecordMeasurements::new(id, OrderPatch::new()).finalizing())
        .await
        .expect("finalize");
    let confirmed = w
        .commands
        .confirm_order(ConfirmOrder::new(id))
        .await
        .expect("confirm");
    assert_eq!(confirmed.status(), OrderStatus::Completed);
    let version = confirmed.version();

    // A second confirmation changes nothing and emits nothing new
    let again = w
        .commands
        .confirm_order(ConfirmOrder::new(id))
        .await
        .expect("re-confirm");
    assert_eq!(again.status(), OrderStatus::Completed);
    assert_eq!(again.version(), version);

    let confirmations = w
        .publisher
        .get_published_events()
        .into_iter()
        .filter(|(event_type, _)| event_type == "OrderConfirmed")
        .count();
    assert_eq!(confirmations, 1);
}

#[tokio::test]
async fn completed_orders_reject_field_changes() {
    let w = workflow();
    let draft = OrderDraft::new(CustomerProfile::new("Taro", "Kyoto")).with_quantity("pants", 1);
    let id = w
        .commands
        .place_order(PlaceOrder::new(draft))
        .await
        .expect("place order");

    let measure = OrderPatch::new().line(
        "pants",
        LineItemPatch {
            waist: Some(67.0),
            length: Some("70".into()),
            ..LineItemPatch::default()
        },
    );
    w.commands
        .record_measurements(RecordMeasurements::new(id, measure).finalizing())
        .await
        .expect("finalize");
    w.commands
        .confirm_order(ConfirmOrder::new(id))
        .await
        .expect("confirm");

    let late = OrderPatch::new().line(
        "pants",
        LineItemPatch {
            memo: Some("shorten after all".into()),
            ..LineItemPatch::default()
        },
    );
    let err = w
        .commands
        .record_measurements(RecordMeasurements::new(id, late))
        .await
        .expect_err("completed orders are closed");
    assert!(matches!(err, DomainError::OrderLocked { .. }));
}

#[tokio::test]
async fn status_history_records_each_transition_once() {
    let w = workflow();
    let id = w
        .commands
        .place_order(PlaceOrder::new(taro_draft()))
        .await
        .expect("place order");

    let measure = OrderPatch::new().line(
        "shirt",
        LineItemPatch {
            size: Some("S".into()),
            ..LineItemPatch::default()
        },
    );
    w.commands
        .record_measurements(RecordMeasurements::new(id, measure).finalizing())
        .await
        .expect("finalize");
    w.commands
        .confirm_order(ConfirmOrder::new(id))
        .await
        .expect("confirm");

    let order = w.queries.order(id).await.expect("fetch");
    let steps: Vec<(OrderStatus, OrderStatus)> =
        order.history().iter().map(|t| (t.from, t.to)).collect();
    assert_eq!(
        steps,
        vec![
            (OrderStatus::Waiting, OrderStatus::Measured),
            (OrderStatus::Measured, OrderStatus::Completed),
        ]
    );
    assert!(order
        .history()
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
    assert_eq!(order.version(), 3);
}

mock! {
    Publisher {}

    impl EventPublisher for Publisher {
        fn publish_events(&self, events: Vec<Box<dyn DomainEvent>>) -> DomainResult<()>;
    }
}

#[tokio::test]
async fn placement_publishes_exactly_one_event_batch() {
    let catalog = Arc::new(ProductCatalog::standard());
    let repository = Arc::new(InMemoryOrderRepository::new(catalog.clone()));

    let mut publisher = MockPublisher::new();
    publisher
        .expect_publish_events()
        .withf(|events| events.len() == 1 && events[0].event_type() == "OrderPlaced")
        .times(1)
        .returning(|_| Ok(()));

    let handler = OrderCommandHandler::new(repository, catalog, Arc::new(publisher));
    handler
        .place_order(PlaceOrder::new(taro_draft()))
        .await
        .expect("place order");

    // A rejected draft reaches neither the store nor the publisher
    let empty = OrderDraft::new(CustomerProfile::new("", "Kyoto"));
    let err = handler
        .place_order(PlaceOrder::new(empty))
        .await
        .expect_err("invalid draft");
    assert!(err.is_validation_error());
}
