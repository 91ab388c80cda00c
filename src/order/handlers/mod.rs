//! Order service handlers: the checkout and query commands plus the
//! payment-outcome event consumer.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{OrderService, ShippingRequest};
use crate::events::{topics, PaymentOutcomeEvent};
use crate::microsvc::{Context, HandlerError};
use crate::model::ModelStore;

pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod on_payment_outcome;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderIdInput {
    order_id: i64,
}

fn has_token<S>(ctx: &Context<OrderService<S>>) -> bool {
    ctx.session().bearer_token().is_some()
}
