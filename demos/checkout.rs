//! Runs the saga in-process: three checkouts, one per payment method, each
//! settled by the payment side over the in-memory bus.
//!
//! ```text
//! RUST_LOG=debug STOREFRONT_PUBLISH_MODE=outbox cargo run --example checkout
//! ```

use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;
use storefront_saga::microsvc::Session;
use storefront_saga::{
    init_tracing, CartItem, InMemoryCart, InMemoryModelStore, InMemoryQueue, PaymentStatus,
    SagaConfig, SagaRuntime, StaticIdentity, UserProfile,
};

const TOKEN: &str = "tok-demo";

fn main() -> Result<(), Box<dyn Error>> {
    let config = SagaConfig::from_env()?;
    init_tracing(&config.log_filter);

    let user = UserProfile {
        id: 1,
        username: "demo".into(),
        email: "demo@example.com".into(),
    };
    let user_id = user.id;
    let cart = InMemoryCart::new();
    let runtime = SagaRuntime::start(
        &config,
        InMemoryModelStore::new(),
        InMemoryQueue::new(),
        Arc::new(StaticIdentity::new().with_user(TOKEN, user)),
        Arc::new(cart.clone()),
    )?;

    let mut placed = Vec::new();
    for pay_type in ["CARD", "WALLET_A", "WALLET_B"] {
        cart.add_item(
            user_id,
            CartItem {
                product_id: 101,
                unit_price: 100.0,
                discount_pct: 10,
                quantity: 2,
            },
        );
        let response = runtime.orders().dispatch(
            "order.create",
            json!({
                "name": "Demo Customer",
                "phone": "555-0100",
                "email": "demo@example.com",
                "address": "1 Example Street",
                "payType": pay_type,
            }),
            Session::bearer(TOKEN),
        )?;
        println!("{pay_type}: {response}");
        if let Some(id) = response["orderId"].as_i64() {
            placed.push(id);
        }
    }

    let queries = runtime.orders().repo().queries();
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        let settled = placed.iter().all(|&id| {
            queries
                .get_order(user_id, id)
                .map(|order| {
                    let payment = order.payment();
                    payment.status != PaymentStatus::Pending || payment.message.is_some()
                })
                .unwrap_or(false)
        });
        if settled {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    for id in &placed {
        let order = queries.get_order(user_id, *id)?;
        let payment = order.payment();
        println!(
            "order {id}: {:?} via {} ({})",
            payment.status,
            payment.pay_type.as_str(),
            payment.message.as_deref().unwrap_or("-"),
        );
    }

    let stats = runtime.shutdown();
    println!(
        "intents handled: {}, outcomes handled: {}",
        stats.intents.handled, stats.outcomes.handled
    );
    Ok(())
}
