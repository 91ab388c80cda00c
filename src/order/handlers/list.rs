use super::*;

pub const COMMAND: &str = "order.list";

pub fn guard<S>(ctx: &Context<OrderService<S>>) -> bool {
    has_token(ctx)
}

pub fn handle<S: ModelStore>(ctx: &Context<OrderService<S>>) -> Result<Value, HandlerError> {
    let user = ctx.repo().resolve_user(ctx.bearer_token()?)?;
    let orders = ctx.repo().queries().list_orders(user.id)?;
    Ok(json!({ "success": true, "orders": orders }))
}
