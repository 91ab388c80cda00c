//! Payment method strategies.
//!
//! Each method maps an order intent to a fixed decision, standing in for a
//! gateway call. New methods are added by registering another entry in a
//! [`StrategyTable`]; dispatch does not change.

use std::collections::HashMap;

use crate::events::{OrderIntentEvent, PayType, PaymentStatus};

/// Outcome of a payment attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub status: PaymentStatus,
    pub message: String,
}

impl Decision {
    pub fn new(status: PaymentStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Decides the payment for one order intent. Must be pure: the same intent
/// always yields the same decision.
pub trait PaymentMethodStrategy: Send + Sync {
    fn decide(&self, intent: &OrderIntentEvent) -> Decision;
}

impl<F> PaymentMethodStrategy for F
where
    F: Fn(&OrderIntentEvent) -> Decision + Send + Sync,
{
    fn decide(&self, intent: &OrderIntentEvent) -> Decision {
        self(intent)
    }
}

/// Card payments always go through.
pub struct CardPayment;

impl PaymentMethodStrategy for CardPayment {
    fn decide(&self, _intent: &OrderIntentEvent) -> Decision {
        Decision::new(PaymentStatus::Success, "Payment completed successfully")
    }
}

/// Wallet A (bKash): the user cancels.
pub struct MobileWalletA;

impl PaymentMethodStrategy for MobileWalletA {
    fn decide(&self, _intent: &OrderIntentEvent) -> Decision {
        Decision::new(PaymentStatus::Canceled, "Payment was canceled by user")
    }
}

/// Wallet B (Nagad): the payment stays pending.
pub struct MobileWalletB;

impl PaymentMethodStrategy for MobileWalletB {
    fn decide(&self, _intent: &OrderIntentEvent) -> Decision {
        Decision::new(PaymentStatus::Pending, "Payment is in pending state")
    }
}

/// Pay type → strategy.
#[derive(Default)]
pub struct StrategyTable {
    strategies: HashMap<PayType, Box<dyn PaymentMethodStrategy>>,
}

impl StrategyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Card, wallet A and wallet B.
    pub fn standard() -> Self {
        Self::new()
            .register(PayType::Card, CardPayment)
            .register(PayType::WalletA, MobileWalletA)
            .register(PayType::WalletB, MobileWalletB)
    }

    /// Add or replace the strategy for `pay_type`.
    pub fn register<P>(mut self, pay_type: PayType, strategy: P) -> Self
    where
        P: PaymentMethodStrategy + 'static,
    {
        self.strategies.insert(pay_type, Box::new(strategy));
        self
    }

    pub fn get(&self, pay_type: &PayType) -> Option<&dyn PaymentMethodStrategy> {
        self.strategies.get(pay_type).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
