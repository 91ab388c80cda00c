use super::*;

pub const COMMAND: &str = "order.get";

pub fn guard<S>(ctx: &Context<OrderService<S>>) -> bool {
    has_token(ctx) && ctx.has_fields(&["orderId"])
}

pub fn handle<S: ModelStore>(ctx: &Context<OrderService<S>>) -> Result<Value, HandlerError> {
    let input = ctx.input::<OrderIdInput>()?;
    let user = ctx.repo().resolve_user(ctx.bearer_token()?)?;
    let order = ctx.repo().queries().get_order(user.id, input.order_id)?;
    Ok(json!({ "success": true, "order": order }))
}
