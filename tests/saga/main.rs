//! Order–payment saga integration tests.

mod order_commands;
mod order_creation;
mod saga_flow;

#[cfg(feature = "http")]
mod http;
