use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{PayType, PaymentStatus};
use crate::model::Model;

/// A product snapshot taken from the cart when the order was placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: i64,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Canceled,
}

/// What applying a payment outcome did to a payment record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// Status and message were written.
    Applied,
    /// The record already carried exactly this outcome.
    Duplicate,
    /// The record is terminal with a different outcome; the event was discarded.
    IgnoredTerminal,
}

/// Payment state embedded in an order.
///
/// Created `Pending` together with the order; afterwards only the
/// reconciler changes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub amount: f64,
    pub message: Option<String>,
    pub pay_type: PayType,
}

impl PaymentRecord {
    /// A fresh pending record with a new transaction id.
    pub fn pending(amount: f64, pay_type: PayType) -> Self {
        Self {
            transaction_id: uuid::Uuid::new_v4().to_string(),
            status: PaymentStatus::Pending,
            amount,
            message: None,
            pay_type,
        }
    }

    /// Apply a payment decision. Terminal records never change again.
    pub fn apply(&mut self, status: PaymentStatus, message: &str) -> Reconciliation {
        let same = self.status == status && self.message.as_deref() == Some(message);
        if same {
            return Reconciliation::Duplicate;
        }
        if self.status.is_terminal() {
            return Reconciliation::IgnoredTerminal;
        }
        self.status = status;
        self.message = Some(message.to_string());
        Reconciliation::Applied
    }
}

/// An order as persisted by the order service.
///
/// Line items and prices are fixed at creation; `grand_total <= total_price`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: i64,
    user_id: i64,
    items: Vec<LineItem>,
    total_price: f64,
    discount: f64,
    grand_total: f64,
    delivery_status: DeliveryStatus,
    shipping_details: ShippingDetails,
    payment: PaymentRecord,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Model for Order {
    const COLLECTION: &'static str = "orders";

    fn id(&self) -> String {
        self.id.to_string()
    }
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn place(
        id: i64,
        user_id: i64,
        items: Vec<LineItem>,
        total_price: f64,
        grand_total: f64,
        shipping_details: ShippingDetails,
        payment: PaymentRecord,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            total_price,
            discount: 0.0,
            grand_total,
            delivery_status: DeliveryStatus::Pending,
            shipping_details,
            payment,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn order_id(&self) -> i64 {
        self.id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn grand_total(&self) -> f64 {
        self.grand_total
    }

    pub fn delivery_status(&self) -> DeliveryStatus {
        self.delivery_status
    }

    pub fn shipping_details(&self) -> &ShippingDetails {
        &self.shipping_details
    }

    pub fn payment(&self) -> &PaymentRecord {
        &self.payment
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a payment decision to the embedded payment record, touching
    /// `updated_at` only when something changed.
    pub fn apply_payment_outcome(
        &mut self,
        status: PaymentStatus,
        message: &str,
        now: DateTime<Utc>,
    ) -> Reconciliation {
        let result = self.payment.apply(status, message);
        if result == Reconciliation::Applied {
            self.updated_at = now;
        }
        result
    }
}
