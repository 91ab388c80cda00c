use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use super::order::{LineItem, Order, PaymentRecord, ShippingDetails};
use super::pricing::{price_cart, validate_item};
use crate::bus::{Event, Publisher};
use crate::collaborators::{CartClient, IdentityResolver};
use crate::commit::CommitBuilderExt;
use crate::config::PublishMode;
use crate::error::SagaError;
use crate::events::{topics, OrderIntentEvent, PayType};
use crate::model::{Model, ModelStore};
use crate::outbox::OutboxRecord;

/// Checkout form submitted by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub pay_type: PayType,
}

impl ShippingRequest {
    pub fn validate(&self) -> Result<(), SagaError> {
        for (field, value) in [
            ("name", &self.name),
            ("phone", &self.phone),
            ("email", &self.email),
            ("address", &self.address),
        ] {
            if value.trim().is_empty() {
                return Err(SagaError::Validation(format!("{} is required", field)));
            }
        }
        if !self.email.contains('@') {
            return Err(SagaError::Validation(format!(
                "{} is not an email address",
                self.email
            )));
        }
        if !self.pay_type.is_recognized() {
            return Err(SagaError::Validation(format!(
                "unsupported pay type {}",
                self.pay_type
            )));
        }
        Ok(())
    }

    fn shipping_details(&self) -> ShippingDetails {
        ShippingDetails {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            address: self.address.trim().to_string(),
        }
    }
}

/// Result returned to the caller once the order is committed.
///
/// Payment is not part of it: the payment status stays `PENDING` until the
/// outcome event is reconciled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub success: bool,
    pub message: String,
    pub order_id: i64,
    /// Post-commit problems that did not fail the order (cart not cleared,
    /// intent not published).
    pub warnings: Vec<String>,
}

/// Synchronous checkout: cart → priced order → commit → cart clear → intent.
pub struct OrderCreationWorkflow<S> {
    store: S,
    identity: Arc<dyn IdentityResolver>,
    cart: Arc<dyn CartClient>,
    publisher: Arc<dyn Publisher>,
    mode: PublishMode,
}

impl<S: ModelStore> OrderCreationWorkflow<S> {
    pub fn new(
        store: S,
        identity: Arc<dyn IdentityResolver>,
        cart: Arc<dyn CartClient>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            store,
            identity,
            cart,
            publisher,
            mode: PublishMode::Direct,
        }
    }

    pub fn with_publish_mode(mut self, mode: PublishMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn publish_mode(&self) -> PublishMode {
        self.mode
    }

    /// Place an order for the caller identified by `token`.
    ///
    /// Nothing is written unless the cart is non-empty and every line is
    /// valid. Once the commit succeeds the call succeeds; later steps can
    /// only add warnings.
    #[instrument(skip(self, token, request), fields(pay_type = %request.pay_type))]
    pub fn create_order(
        &self,
        token: &str,
        request: &ShippingRequest,
    ) -> Result<OrderPlaced, SagaError> {
        request.validate()?;

        let user = self
            .identity
            .resolve_user(token)?
            .ok_or(SagaError::UserNotFound)?;

        let cart_items = self.cart.items(user.id)?;
        if cart_items.is_empty() {
            return Err(SagaError::EmptyCart);
        }
        for item in &cart_items {
            validate_item(item)?;
        }

        let pricing = price_cart(&cart_items);
        let items: Vec<LineItem> = cart_items
            .iter()
            .map(|item| LineItem {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect();

        let now = Utc::now();
        let order_id = self.store.next_id(Order::COLLECTION)?;
        let order = Order::place(
            order_id,
            user.id,
            items,
            pricing.total_price,
            pricing.grand_total,
            request.shipping_details(),
            PaymentRecord::pending(pricing.grand_total, request.pay_type.clone()),
            now,
        );

        let intent = OrderIntentEvent {
            order_id,
            user_id: user.id,
            amount: pricing.grand_total,
            pay_type: request.pay_type.clone(),
            message: format!("An order has been created for user {}", user.id),
        };
        let event = Event::json(
            intent.event_id(),
            topics::ORDER_INTENT,
            order_id.to_string(),
            &intent,
        )?;

        let committed = match self.mode {
            PublishMode::Direct => self.store.batch().insert(&order).commit(),
            PublishMode::Outbox => {
                let seq = self.store.next_id(OutboxRecord::COLLECTION)?;
                self.store
                    .batch()
                    .insert(&order)
                    .insert(&OutboxRecord::from_event(seq, &event, now))
                    .commit()
            }
        };
        if let Err(err) = committed {
            error!(order_id, user_id = user.id, error = %err, "order commit failed");
            return Err(SagaError::Persistence(err));
        }

        info!(
            order_id,
            user_id = user.id,
            grand_total = pricing.grand_total,
            "order committed"
        );

        let mut warnings = Vec::new();

        if let Err(err) = self.cart.clear(user.id) {
            warn!(order_id, user_id = user.id, error = %err, "cart was not cleared after order");
            warnings.push(format!("cart not cleared: {}", err));
        }

        if self.mode == PublishMode::Direct {
            if let Err(err) = self.publisher.publish(event) {
                warn!(
                    order_id,
                    user_id = user.id,
                    error = %err,
                    "order intent not published; payment status will stay PENDING"
                );
                warnings.push(format!("order intent not published: {}", err));
            }
        }

        Ok(OrderPlaced {
            success: true,
            message: "Order placed successfully".to_string(),
            order_id,
            warnings,
        })
    }
}
