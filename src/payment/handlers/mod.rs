//! Payment service handlers.

pub mod on_order_intent;
