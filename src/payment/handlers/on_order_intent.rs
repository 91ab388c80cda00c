//! Consumes order intents from the bus.

use serde_json::{json, Value};

use crate::events::{topics, OrderIntentEvent};
use crate::microsvc::{Context, HandlerError};
use crate::payment::PaymentDecisionEngine;

pub const TOPIC: &str = topics::ORDER_INTENT;

pub fn guard(ctx: &Context<PaymentDecisionEngine>) -> bool {
    ctx.has_fields(&["orderId", "userId", "amount", "payType"])
}

pub fn handle(ctx: &Context<PaymentDecisionEngine>) -> Result<Value, HandlerError> {
    let intent = ctx.input::<OrderIntentEvent>()?;
    let outcome = ctx.repo().process(&intent)?;
    Ok(json!({
        "orderId": outcome.order_id,
        "paymentStatus": outcome.payment_status,
    }))
}
