//! Payment side of the saga: decides each order intent with the strategy
//! registered for its pay type and publishes the outcome.

pub mod handlers;
mod engine;
mod strategy;

pub use engine::PaymentDecisionEngine;
pub use strategy::{
    CardPayment, Decision, MobileWalletA, MobileWalletB, PaymentMethodStrategy, StrategyTable,
};

use crate::microsvc::Service;

/// The payment service with the intent consumer registered.
pub fn service(engine: PaymentDecisionEngine) -> Service<PaymentDecisionEngine> {
    crate::register_event_handlers!(Service::new(engine), handlers::on_order_intent)
}
