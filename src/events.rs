//! Event schemas exchanged between the order and payment services.
//!
//! Payloads are JSON with camelCase field names; both services must agree on
//! them field for field.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical topic names. Transport addressing is up to the bus.
pub mod topics {
    /// Order side → payment side: an order was created and awaits payment.
    pub const ORDER_INTENT: &str = "order-intent";
    /// Payment side → order side: the payment decision for an order.
    pub const PAYMENT_OUTCOME: &str = "payment-outcome";

    /// Dead-letter topic for a given topic.
    pub fn dead_letter(topic: &str) -> String {
        format!("{}.dlq", topic)
    }
}

/// Payment method tag.
///
/// Wire tags are `CARD`, `WALLET_A` and `WALLET_B`; the legacy names `BKASH`
/// and `NAGAD` are accepted as aliases. Any other tag decodes to
/// `Unrecognized` so that consumers can report it instead of failing to parse.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PayType {
    Card,
    WalletA,
    WalletB,
    Unrecognized(String),
}

impl PayType {
    pub fn as_str(&self) -> &str {
        match self {
            PayType::Card => "CARD",
            PayType::WalletA => "WALLET_A",
            PayType::WalletB => "WALLET_B",
            PayType::Unrecognized(tag) => tag,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, PayType::Unrecognized(_))
    }
}

impl From<String> for PayType {
    fn from(tag: String) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "CARD" => PayType::Card,
            "WALLET_A" | "BKASH" => PayType::WalletA,
            "WALLET_B" | "NAGAD" => PayType::WalletB,
            _ => PayType::Unrecognized(tag),
        }
    }
}

impl From<&str> for PayType {
    fn from(tag: &str) -> Self {
        PayType::from(tag.to_string())
    }
}

impl From<PayType> for String {
    fn from(pay_type: PayType) -> Self {
        pay_type.as_str().to_string()
    }
}

impl fmt::Display for PayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an order's payment record.
///
/// `Pending` may loop back to itself; `Success` and `Canceled` are terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Canceled,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Canceled)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Canceled => "CANCELED",
        };
        f.write_str(name)
    }
}

/// Published once per successfully created order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntentEvent {
    pub order_id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub pay_type: PayType,
    pub message: String,
}

impl OrderIntentEvent {
    /// Event id, stable per order so redeliveries carry the same id.
    pub fn event_id(&self) -> String {
        format!("{}:{}", topics::ORDER_INTENT, self.order_id)
    }
}

/// Published by the payment side for every consumed order intent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcomeEvent {
    pub user_id: i64,
    pub order_id: i64,
    pub amount: f64,
    pub message: String,
    pub payment_status: PaymentStatus,
    pub pay_type: PayType,
}

impl PaymentOutcomeEvent {
    pub fn event_id(&self) -> String {
        format!("{}:{}", topics::PAYMENT_OUTCOME, self.order_id)
    }
}
