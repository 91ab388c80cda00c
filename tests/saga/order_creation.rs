use std::sync::Arc;

use storefront_saga::{
    topics, CartClient, InMemoryCart, InMemoryModelStore, InMemoryQueue, ModelStore,
    OrderCreationWorkflow, OrderIntentEvent, Order, OutboxRecord, PayType, PaymentStatus,
    PublishMode, SagaError, ShippingRequest,
};

use crate::support::*;

fn workflow<S: ModelStore>(
    store: S,
    cart: Arc<dyn CartClient>,
    publisher: Arc<dyn storefront_saga::Publisher>,
) -> OrderCreationWorkflow<S> {
    OrderCreationWorkflow::new(store, identity(), cart, publisher)
}

#[test]
fn commit_failure_publishes_nothing_and_keeps_cart() {
    let store = FailingStore::default();
    let cart = InMemoryCart::new();
    let queue = InMemoryQueue::new();
    fill_cart(&cart, ada().id);

    let err = workflow(store.clone(), Arc::new(cart.clone()), Arc::new(queue.clone()))
        .create_order(ADA_TOKEN, &shipping(PayType::Card))
        .unwrap_err();

    assert!(matches!(err, SagaError::Persistence(_)));
    assert_eq!(err.status_code(), 500);
    assert!(queue.is_empty());
    assert_eq!(store.inner.count("orders"), 0);
    assert_eq!(cart.items(ada().id).unwrap().len(), 2);
}

#[test]
fn failed_cart_clear_is_a_warning() {
    let store = InMemoryModelStore::new();
    let cart = StickyCart::default();
    let queue = InMemoryQueue::new();
    fill_cart(&cart.inner, ada().id);

    let placed = workflow(store.clone(), Arc::new(cart), Arc::new(queue.clone()))
        .create_order(ADA_TOKEN, &shipping(PayType::Card))
        .unwrap();

    assert!(placed.success);
    assert_eq!(placed.warnings.len(), 1);
    assert!(placed.warnings[0].contains("cart"));
    assert_eq!(store.count("orders"), 1);
    assert_eq!(queue.find_all_by_type(topics::ORDER_INTENT).len(), 1);
}

#[test]
fn lost_publish_in_direct_mode_strands_order_with_warning() {
    let store = InMemoryModelStore::new();
    let cart = InMemoryCart::new();
    let queue = InMemoryQueue::new();
    let publisher = Arc::new(FlakyPublisher::down(queue.clone()));
    fill_cart(&cart, ada().id);

    let placed = workflow(store.clone(), Arc::new(cart), publisher.clone())
        .create_order(ADA_TOKEN, &shipping(PayType::Card))
        .unwrap();

    assert!(placed.success);
    assert_eq!(publisher.attempts(), 1);
    assert!(placed.warnings.iter().any(|w| w.contains("not published")));
    assert!(queue.is_empty());

    let order = store
        .get_model::<Order>(&placed.order_id.to_string())
        .unwrap()
        .unwrap()
        .data;
    assert_eq!(order.payment().status, PaymentStatus::Pending);
}

#[test]
fn outbox_mode_never_touches_the_bus_directly() {
    let store = InMemoryModelStore::new();
    let cart = InMemoryCart::new();
    let publisher = Arc::new(FlakyPublisher::down(InMemoryQueue::new()));
    fill_cart(&cart, ada().id);

    let placed = workflow(store.clone(), Arc::new(cart), publisher.clone())
        .with_publish_mode(PublishMode::Outbox)
        .create_order(ADA_TOKEN, &shipping(PayType::Card))
        .unwrap();

    assert!(placed.warnings.is_empty());
    assert_eq!(publisher.attempts(), 0);

    let records = store.find_models::<OutboxRecord>(&|_| true).unwrap();
    assert_eq!(records.len(), 1);
    let intent: OrderIntentEvent = records[0].data.to_event().decode().unwrap();
    assert_eq!(intent.order_id, placed.order_id);
    assert_eq!(intent.amount, 230.0);
}

#[test]
fn order_snapshot_is_independent_of_later_cart_changes() {
    let store = InMemoryModelStore::new();
    let cart = InMemoryCart::new();
    fill_cart(&cart, ada().id);

    let placed = workflow(store.clone(), Arc::new(cart.clone()), Arc::new(InMemoryQueue::new()))
        .create_order(ADA_TOKEN, &shipping(PayType::WalletA))
        .unwrap();
    fill_cart(&cart, ada().id);

    let order = store
        .get_model::<Order>(&placed.order_id.to_string())
        .unwrap()
        .unwrap()
        .data;
    let quantities: Vec<u32> = order.items().iter().map(|i| i.quantity).collect();
    assert_eq!(quantities, vec![2, 1]);
    assert_eq!(order.payment().amount, order.grand_total());
    assert_eq!(order.payment().pay_type, PayType::WalletA);
    assert_eq!(order.shipping_details().name, "Ada Lovelace");
}

#[test]
fn order_ids_increase() {
    let store = InMemoryModelStore::new();
    let cart = InMemoryCart::new();
    let flow = workflow(store, Arc::new(cart.clone()), Arc::new(InMemoryQueue::new()));

    fill_cart(&cart, ada().id);
    let first = flow.create_order(ADA_TOKEN, &shipping(PayType::Card)).unwrap();
    fill_cart(&cart, ada().id);
    let second = flow.create_order(ADA_TOKEN, &shipping(PayType::Card)).unwrap();

    assert!(second.order_id > first.order_id);
}

#[test]
fn invalid_requests_fail_before_any_lookup() {
    let store = InMemoryModelStore::new();
    let flow = workflow(store.clone(), Arc::new(InMemoryCart::new()), Arc::new(InMemoryQueue::new()));

    let request = ShippingRequest {
        phone: String::new(),
        ..shipping(PayType::Card)
    };
    // Unknown token would fail with UserNotFound; validation comes first.
    let err = flow.create_order("tok-unknown", &request).unwrap_err();
    assert!(matches!(err, SagaError::Validation(_)));
    assert_eq!(err.status_code(), 400);
    assert_eq!(store.count("orders"), 0);
}
