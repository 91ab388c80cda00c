//! HTTP transport over the order command service.
//!
//! Starts an axum server and exercises it with reqwest.

use std::sync::Arc;

use serde_json::{json, Value};
use storefront_saga::microsvc::{self, Service};
use storefront_saga::order::{self, OrderQueries, OrderService};
use storefront_saga::{InMemoryCart, InMemoryModelStore, InMemoryQueue, PaymentStatus};

use crate::support::*;

fn order_service(cart: &InMemoryCart) -> Arc<Service<OrderService<InMemoryModelStore>>> {
    order_service_on(InMemoryModelStore::new(), cart)
}

fn order_service_on(
    store: InMemoryModelStore,
    cart: &InMemoryCart,
) -> Arc<Service<OrderService<InMemoryModelStore>>> {
    Arc::new(order::service(OrderService::new(
        store,
        identity(),
        Arc::new(cart.clone()),
        Arc::new(InMemoryQueue::new()),
    )))
}

/// Bind to port 0 and return the actual address.
async fn start_server(service: Arc<Service<OrderService<InMemoryModelStore>>>) -> String {
    let app = microsvc::router(service);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn checkout_body() -> Value {
    json!({
        "name": "Ada Lovelace",
        "phone": "555-0100",
        "email": "ada@example.com",
        "address": "12 Analytical Row",
        "payType": "CARD",
    })
}

#[tokio::test]
async fn health_lists_order_commands() {
    let base = start_server(order_service(&InMemoryCart::new())).await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    let commands = body["commands"].as_array().unwrap();
    assert!(commands.iter().any(|c| c == "order.create"));
    assert!(commands.iter().any(|c| c == "order.list"));
    assert!(!commands.iter().any(|c| c == "payment-outcome"));
}

#[tokio::test]
async fn create_then_get_with_bearer_token() {
    let cart = InMemoryCart::new();
    fill_cart(&cart, ada().id);
    let base = start_server(order_service(&cart)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/order.create"))
        .bearer_auth(ADA_TOKEN)
        .json(&checkout_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let placed: Value = resp.json().await.unwrap();
    assert_eq!(placed["success"], true);
    let order_id = placed["orderId"].as_i64().unwrap();

    let resp = client
        .post(format!("{base}/order.get"))
        .bearer_auth(ADA_TOKEN)
        .json(&json!({ "orderId": order_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["order"]["payment"]["status"], "PENDING");
    assert_eq!(body["order"]["grandTotal"], 230.0);
}

#[tokio::test]
async fn missing_token_returns_401() {
    let cart = InMemoryCart::new();
    fill_cart(&cart, ada().id);
    let base = start_server(order_service(&cart)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/order.create"))
        .json(&checkout_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn empty_cart_returns_400_with_message() {
    let base = start_server(order_service(&InMemoryCart::new())).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/order.create"))
        .bearer_auth(ADA_TOKEN)
        .json(&checkout_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "There are no products in your cart");
}

#[tokio::test]
async fn foreign_order_returns_404() {
    let cart = InMemoryCart::new();
    fill_cart(&cart, ada().id);
    let base = start_server(order_service(&cart)).await;
    let client = reqwest::Client::new();

    let placed: Value = client
        .post(format!("{base}/order.create"))
        .bearer_auth(ADA_TOKEN)
        .json(&checkout_body())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base}/order.get"))
        .bearer_auth(GRACE_TOKEN)
        .json(&json!({ "orderId": placed["orderId"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn payment_outcome_is_not_reachable_over_http() {
    let store = InMemoryModelStore::new();
    let cart = InMemoryCart::new();
    fill_cart(&cart, ada().id);
    let base = start_server(order_service_on(store.clone(), &cart)).await;
    let client = reqwest::Client::new();

    let mut body = checkout_body();
    body["payType"] = json!("WALLET_A");
    let placed: Value = client
        .post(format!("{base}/order.create"))
        .bearer_auth(ADA_TOKEN)
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = placed["orderId"].as_i64().unwrap();

    for authorized in [false, true] {
        let mut request = client.post(format!("{base}/payment-outcome")).json(&json!({
            "userId": ada().id,
            "orderId": order_id,
            "amount": 0.0,
            "message": "Payment completed successfully",
            "paymentStatus": "SUCCESS",
            "payType": "WALLET_A",
        }));
        if authorized {
            request = request.bearer_auth(ADA_TOKEN);
        }
        let resp = request.send().await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    let order = OrderQueries::new(store).get_order(ada().id, order_id).unwrap();
    assert_eq!(order.payment().status, PaymentStatus::Pending);
}
