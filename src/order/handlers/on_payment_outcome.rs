//! Consumes payment outcomes from the bus.

use super::*;
use crate::order::Reconciliation;

pub const TOPIC: &str = topics::PAYMENT_OUTCOME;

pub fn guard<S>(ctx: &Context<OrderService<S>>) -> bool {
    ctx.has_fields(&["orderId", "paymentStatus", "message"])
}

pub fn handle<S: ModelStore>(ctx: &Context<OrderService<S>>) -> Result<Value, HandlerError> {
    let outcome = ctx.input::<PaymentOutcomeEvent>()?;
    let result = ctx.repo().reconciler().reconcile(&outcome)?;
    let result = match result {
        Reconciliation::Applied => "applied",
        Reconciliation::Duplicate => "duplicate",
        Reconciliation::IgnoredTerminal => "ignored",
    };
    Ok(json!({ "orderId": outcome.order_id, "result": result }))
}
