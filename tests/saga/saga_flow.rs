//! End-to-end runs of the whole choreography over the in-memory bus.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use storefront_saga::microsvc::Session;
use storefront_saga::{
    topics, Event, InMemoryCart, InMemoryModelStore, InMemoryQueue, ModelStore, Order,
    OrderIntentEvent, OutboxStatus, OutboxRecord, PayType, PaymentOutcomeEvent, PaymentStatus,
    PublishMode, Publisher, RuntimeStats, SagaConfig, SagaRuntime,
};

use crate::support::*;

const SETTLE: Duration = Duration::from_secs(3);

struct World {
    store: InMemoryModelStore,
    queue: InMemoryQueue,
    cart: InMemoryCart,
    runtime: SagaRuntime<InMemoryModelStore>,
}

fn start(mode: PublishMode) -> World {
    start_with(SagaConfig {
        publish_mode: mode,
        ..SagaConfig::default()
    })
}

fn start_with(config: SagaConfig) -> World {
    let store = InMemoryModelStore::new();
    let queue = InMemoryQueue::new();
    let cart = InMemoryCart::new();
    let runtime = SagaRuntime::start(
        &config,
        store.clone(),
        queue.clone(),
        identity(),
        Arc::new(cart.clone()),
    )
    .unwrap();
    World {
        store,
        queue,
        cart,
        runtime,
    }
}

impl World {
    fn checkout(&self, pay_type: &str) -> i64 {
        fill_cart(&self.cart, ada().id);
        let result = self
            .runtime
            .orders()
            .dispatch(
                "order.create",
                json!({
                    "name": "Ada Lovelace",
                    "phone": "555-0100",
                    "email": "ada@example.com",
                    "address": "12 Analytical Row",
                    "payType": pay_type,
                }),
                Session::bearer(ADA_TOKEN),
            )
            .unwrap();
        assert_eq!(result["success"], json!(true));
        assert_eq!(result["message"], json!("Order placed successfully"));
        result["orderId"].as_i64().unwrap()
    }

    fn order(&self, id: i64) -> Order {
        self.store
            .get_model::<Order>(&id.to_string())
            .unwrap()
            .unwrap()
            .data
    }

    fn wait_for_status(&self, id: i64, status: PaymentStatus) -> bool {
        wait_until(SETTLE, || self.order(id).payment().status == status)
    }

    /// Wait until the lanes' live statistics satisfy `condition`, then shut down.
    fn shutdown_when(self, condition: impl Fn(&RuntimeStats) -> bool) -> RuntimeStats {
        assert!(wait_until(SETTLE, || condition(&self.runtime.stats())));
        self.runtime.shutdown()
    }
}

fn card_order_settles_to_success(mode: PublishMode) {
    let world = start(mode);
    let order_id = world.checkout("CARD");

    let placed = world.order(order_id);
    assert_eq!(placed.total_price(), 250.0);
    assert_eq!(placed.grand_total(), 230.0);

    assert!(world.wait_for_status(order_id, PaymentStatus::Success));
    let settled = world.order(order_id);
    assert_eq!(
        settled.payment().message.as_deref(),
        Some("Payment completed successfully")
    );
    assert_eq!(settled.payment().transaction_id, placed.payment().transaction_id);

    let intents = world.queue.find_all_by_type(topics::ORDER_INTENT);
    assert_eq!(intents.len(), 1);
    let intent: OrderIntentEvent = intents[0].decode().unwrap();
    assert_eq!(intent.amount, 230.0);

    let outcomes = world.queue.find_all_by_type(topics::PAYMENT_OUTCOME);
    let outcome: PaymentOutcomeEvent = outcomes[0].decode().unwrap();
    assert_eq!(outcome.payment_status, PaymentStatus::Success);
    assert_eq!(outcome.amount, 230.0);

    let stats = world.shutdown_when(|s| s.outcomes.handled == 1);
    assert_eq!(stats.intents.handled, 1);
}

#[test]
fn card_checkout_direct_mode() {
    card_order_settles_to_success(PublishMode::Direct);
}

#[test]
fn card_checkout_outbox_mode() {
    card_order_settles_to_success(PublishMode::Outbox);
}

#[test]
fn outbox_record_is_marked_published() {
    let world = start(PublishMode::Outbox);
    let order_id = world.checkout("CARD");
    assert!(world.wait_for_status(order_id, PaymentStatus::Success));

    let record = world
        .store
        .get_model::<OutboxRecord>(&format!("{}:{}", topics::ORDER_INTENT, order_id))
        .unwrap()
        .unwrap()
        .data;
    assert_eq!(record.status, OutboxStatus::Published);

    let stats = world.runtime.shutdown();
    assert_eq!(stats.relay.map(|r| r.messages_published), Some(1));
}

#[test]
fn wallet_a_is_canceled() {
    let world = start(PublishMode::Direct);
    let order_id = world.checkout("WALLET_A");

    assert!(world.wait_for_status(order_id, PaymentStatus::Canceled));
    assert_eq!(
        world.order(order_id).payment().message.as_deref(),
        Some("Payment was canceled by user")
    );
    world.runtime.shutdown();
}

#[test]
fn wallet_b_stays_pending_with_message() {
    let world = start(PublishMode::Direct);
    let order_id = world.checkout("NAGAD");

    assert!(wait_until(SETTLE, || {
        world.order(order_id).payment().message.as_deref() == Some("Payment is in pending state")
    }));
    assert_eq!(world.order(order_id).payment().status, PaymentStatus::Pending);
    assert_eq!(world.order(order_id).payment().pay_type, PayType::WalletB);
    world.runtime.shutdown();
}

#[test]
fn duplicate_outcome_delivery_is_idempotent() {
    let world = start(PublishMode::Direct);
    let order_id = world.checkout("CARD");
    assert!(world.wait_for_status(order_id, PaymentStatus::Success));
    let before = world.store.raw("orders", &order_id.to_string()).unwrap();

    let outcome = world.queue.find_all_by_type(topics::PAYMENT_OUTCOME)[0].clone();
    world.queue.publish(outcome).unwrap();

    let store = world.store.clone();
    let stats = world.shutdown_when(|s| s.outcomes.handled == 2);
    assert_eq!(stats.outcomes.dropped, 0);
    assert_eq!(store.raw("orders", &order_id.to_string()).unwrap(), before);
}

#[test]
fn late_conflicting_outcome_is_discarded() {
    let world = start(PublishMode::Direct);
    let order_id = world.checkout("CARD");
    assert!(world.wait_for_status(order_id, PaymentStatus::Success));

    let late = PaymentOutcomeEvent {
        user_id: ada().id,
        order_id,
        amount: 230.0,
        message: "Payment was canceled by user".into(),
        payment_status: PaymentStatus::Canceled,
        pay_type: PayType::Card,
    };
    world
        .queue
        .publish(Event::json("late-1", topics::PAYMENT_OUTCOME, order_id.to_string(), &late).unwrap())
        .unwrap();

    let store = world.store.clone();
    let stats = world.shutdown_when(|s| s.outcomes.handled == 2);
    assert_eq!(stats.outcomes.dropped, 0);
    let order = store.get_model::<Order>(&order_id.to_string()).unwrap().unwrap().data;
    assert_eq!(order.payment().status, PaymentStatus::Success);
}

#[test]
fn outcome_for_unknown_order_is_dropped_without_writes() {
    let world = start_with(SagaConfig {
        dead_letter: true,
        ..SagaConfig::default()
    });

    let stray = PaymentOutcomeEvent {
        user_id: 9,
        order_id: 4242,
        amount: 1.0,
        message: "Payment completed successfully".into(),
        payment_status: PaymentStatus::Success,
        pay_type: PayType::Card,
    };
    world
        .queue
        .publish(Event::json(stray.event_id(), topics::PAYMENT_OUTCOME, "4242", &stray).unwrap())
        .unwrap();

    let dlq = topics::dead_letter(topics::PAYMENT_OUTCOME);
    assert!(wait_until(SETTLE, || !world.queue.find_all_by_type(&dlq).is_empty()));

    let stats = world.runtime.shutdown();
    assert_eq!(stats.outcomes.dropped, 1);
    assert_eq!(stats.outcomes.redelivered, 0);
    assert_eq!(stats.outcomes.dead_lettered, 1);
    assert_eq!(world.store.count("orders"), 0);
}

#[test]
fn unknown_payment_method_intent_is_dropped() {
    let world = start(PublishMode::Direct);

    let intent = OrderIntentEvent {
        order_id: 77,
        user_id: ada().id,
        amount: 12.0,
        pay_type: PayType::from("CRYPTO"),
        message: "An order has been created for user 1".into(),
    };
    world
        .queue
        .publish(Event::json(intent.event_id(), topics::ORDER_INTENT, "77", &intent).unwrap())
        .unwrap();

    let queue = world.queue.clone();
    let stats = world.shutdown_when(|s| s.intents.dropped == 1);
    assert_eq!(stats.intents.handled, 0);
    assert_eq!(stats.intents.redelivered, 0);
    assert!(queue.find_all_by_type(topics::PAYMENT_OUTCOME).is_empty());
}

#[test]
fn create_response_carries_warnings() {
    let world = start(PublishMode::Direct);
    fill_cart(&world.cart, ada().id);

    let result: Value = world
        .runtime
        .orders()
        .dispatch(
            "order.create",
            json!({
                "name": "Ada Lovelace",
                "phone": "555-0100",
                "email": "ada@example.com",
                "address": "12 Analytical Row",
                "payType": "CARD",
            }),
            Session::bearer(ADA_TOKEN),
        )
        .unwrap();
    assert_eq!(result["warnings"], json!([]));
    world.runtime.shutdown();
}
