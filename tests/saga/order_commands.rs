//! The order command service driven through `dispatch`, as the HTTP
//! transport would.

use std::sync::Arc;

use serde_json::{json, Value};
use storefront_saga::microsvc::{HandlerError, Service, Session};
use storefront_saga::order::{self, OrderService};
use storefront_saga::{
    topics, Event, InMemoryCart, InMemoryModelStore, InMemoryQueue, PaymentStatus, SagaError,
};

use crate::support::*;

fn orders() -> (Service<OrderService<InMemoryModelStore>>, InMemoryCart) {
    let cart = InMemoryCart::new();
    let service = order::service(OrderService::new(
        InMemoryModelStore::new(),
        identity(),
        Arc::new(cart.clone()),
        Arc::new(InMemoryQueue::new()),
    ));
    (service, cart)
}

fn checkout_input() -> Value {
    json!({
        "name": "Ada Lovelace",
        "phone": "555-0100",
        "email": "ada@example.com",
        "address": "12 Analytical Row",
        "payType": "BKASH",
    })
}

fn place(service: &Service<OrderService<InMemoryModelStore>>, cart: &InMemoryCart) -> i64 {
    fill_cart(cart, ada().id);
    service
        .dispatch("order.create", checkout_input(), Session::bearer(ADA_TOKEN))
        .unwrap()["orderId"]
        .as_i64()
        .unwrap()
}

#[test]
fn registers_every_order_command() {
    let (service, _) = orders();
    assert_eq!(
        service.commands(),
        vec!["order.create", "order.delete", "order.get", "order.list"]
    );
    assert_eq!(service.topics(), vec!["payment-outcome"]);
}

#[test]
fn create_requires_a_bearer_token() {
    let (service, cart) = orders();
    fill_cart(&cart, ada().id);

    let err = service
        .dispatch("order.create", checkout_input(), Session::new())
        .unwrap_err();
    assert!(matches!(err, HandlerError::Unauthorized(_)));
    assert_eq!(err.status_code(), 401);
}

#[test]
fn create_with_unknown_token_is_user_not_found() {
    let (service, cart) = orders();
    fill_cart(&cart, ada().id);

    let err = service
        .dispatch("order.create", checkout_input(), Session::bearer("tok-stranger"))
        .unwrap_err();
    assert_eq!(err, HandlerError::Saga(SagaError::UserNotFound));
    assert_eq!(err.to_string(), "User not found");
}

#[test]
fn create_with_empty_cart_is_rejected() {
    let (service, _) = orders();

    let err = service
        .dispatch("order.create", checkout_input(), Session::bearer(ADA_TOKEN))
        .unwrap_err();
    assert_eq!(err, HandlerError::Saga(SagaError::EmptyCart));
    assert_eq!(err.to_string(), "There are no products in your cart");
    assert_eq!(service.repo().store().count("orders"), 0);
}

#[test]
fn create_guard_requires_all_shipping_fields() {
    let (service, _) = orders();

    let err = service
        .dispatch(
            "order.create",
            json!({ "name": "Ada", "payType": "CARD" }),
            Session::bearer(ADA_TOKEN),
        )
        .unwrap_err();
    assert!(matches!(err, HandlerError::GuardRejected(_)));
}

#[test]
fn list_is_scoped_to_caller_and_newest_first() {
    let (service, cart) = orders();
    let first = place(&service, &cart);
    let second = place(&service, &cart);

    let mine = service
        .dispatch("order.list", json!({}), Session::bearer(ADA_TOKEN))
        .unwrap();
    let ids: Vec<i64> = mine["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first]);

    let theirs = service
        .dispatch("order.list", json!({}), Session::bearer(GRACE_TOKEN))
        .unwrap();
    assert_eq!(theirs["orders"], json!([]));
}

#[test]
fn get_hides_other_users_orders() {
    let (service, cart) = orders();
    let id = place(&service, &cart);

    let own = service
        .dispatch("order.get", json!({ "orderId": id }), Session::bearer(ADA_TOKEN))
        .unwrap();
    assert_eq!(own["order"]["grandTotal"], json!(230.0));
    assert_eq!(own["order"]["payment"]["status"], json!("PENDING"));
    assert_eq!(own["order"]["payment"]["payType"], json!("WALLET_A"));

    let err = service
        .dispatch("order.get", json!({ "orderId": id }), Session::bearer(GRACE_TOKEN))
        .unwrap_err();
    assert_eq!(err, HandlerError::Saga(SagaError::OrderNotFound(id)));
    assert_eq!(err.status_code(), 404);
}

#[test]
fn delete_removes_own_order() {
    let (service, cart) = orders();
    let id = place(&service, &cart);

    service
        .dispatch("order.delete", json!({ "orderId": id }), Session::bearer(ADA_TOKEN))
        .unwrap();
    let err = service
        .dispatch("order.get", json!({ "orderId": id }), Session::bearer(ADA_TOKEN))
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

fn outcome_event(order_id: i64, status: &str, message: &str) -> Event {
    let outcome = json!({
        "userId": ada().id,
        "orderId": order_id,
        "amount": 230.0,
        "message": message,
        "paymentStatus": status,
        "payType": "WALLET_A",
    });
    Event::with_string_payload(
        format!("payment-outcome:{order_id}"),
        topics::PAYMENT_OUTCOME,
        outcome.to_string(),
    )
}

#[test]
fn outcome_event_reports_reconciliation() {
    let (service, cart) = orders();
    let id = place(&service, &cart);
    let event = outcome_event(id, "CANCELED", "Payment was canceled by user");

    let first = service.dispatch_event(&event).unwrap();
    assert_eq!(first["result"], json!("applied"));

    let again = service.dispatch_event(&event).unwrap();
    assert_eq!(again["result"], json!("duplicate"));
}

#[test]
fn outcome_cannot_be_dispatched_as_a_command() {
    let (service, cart) = orders();
    let id = place(&service, &cart);
    let forged = json!({
        "userId": ada().id,
        "orderId": id,
        "amount": 0.0,
        "message": "Payment completed successfully",
        "paymentStatus": "SUCCESS",
        "payType": "WALLET_A",
    });

    for session in [Session::new(), Session::bearer(ADA_TOKEN)] {
        let err = service
            .dispatch("payment-outcome", forged.clone(), session)
            .unwrap_err();
        assert_eq!(err, HandlerError::UnknownCommand("payment-outcome".into()));
    }

    let order = service.repo().queries().get_order(ada().id, id).unwrap();
    assert_eq!(order.payment().status, PaymentStatus::Pending);
    assert_eq!(order.payment().message, None);

    // the genuine outcome still lands afterwards
    let genuine = outcome_event(id, "CANCELED", "Payment was canceled by user");
    assert_eq!(service.dispatch_event(&genuine).unwrap()["result"], json!("applied"));
    let order = service.repo().queries().get_order(ada().id, id).unwrap();
    assert_eq!(order.payment().status, PaymentStatus::Canceled);
}
