use super::*;

pub const COMMAND: &str = "order.create";

pub fn guard<S>(ctx: &Context<OrderService<S>>) -> bool {
    ctx.has_fields(&["name", "phone", "email", "address", "payType"])
}

pub fn handle<S: ModelStore>(ctx: &Context<OrderService<S>>) -> Result<Value, HandlerError> {
    let token = ctx.bearer_token()?;
    let request = ctx.input::<ShippingRequest>()?;
    let placed = ctx.repo().workflow().create_order(token, &request)?;
    Ok(serde_json::to_value(placed)?)
}
