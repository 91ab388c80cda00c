//! microsvc — convention-based command and event dispatch.
//!
//! A [`Service`] maps command names and bus topics to handlers. Commands
//! answer direct calls (`dispatch`) and, with the `http` feature, HTTP
//! requests. Event handlers answer bus events (`subscribe`) only.
//!
//! ## Handler Convention
//!
//! Each handler module exports three items:
//!
//! ```ignore
//! // src/order/handlers/get.rs
//!
//! pub const COMMAND: &str = "order.get";
//!
//! pub fn guard<S>(ctx: &Context<OrderService<S>>) -> bool {
//!     ctx.has_fields(&["orderId"])
//! }
//!
//! pub fn handle<S: ModelStore>(ctx: &Context<OrderService<S>>) -> Result<Value, HandlerError> {
//!     // ...
//! }
//! ```
//!
//! and is wired up with [`register_handlers!`](crate::register_handlers).
//!
//! Bus consumers export `TOPIC` in place of `COMMAND` and are wired up with
//! [`register_event_handlers!`](crate::register_event_handlers). They answer
//! bus events only, never direct or HTTP calls.

mod context;
mod error;
mod service;
mod session;
mod transport;

pub use context::Context;
pub use error::HandlerError;
pub use service::Service;
pub use session::Session;
pub use transport::{subscribe, SubscribeOptions, TransportHandle, TransportStats};

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::{router, serve};

/// Register handler modules with a service using the convention pattern.
///
/// ```ignore
/// let service = storefront_saga::register_handlers!(
///     Service::new(orders),
///     handlers::create,
///     handlers::list,
/// );
/// ```
#[macro_export]
macro_rules! register_handlers {
    ($service:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $service
        $(
            .command_guarded(
                $($seg)::+::COMMAND,
                $($seg)::+::guard,
                $($seg)::+::handle,
            )
        )+
    };
}

/// Register event handler modules (exporting `TOPIC`, `guard`, `handle`).
///
/// ```ignore
/// let service = storefront_saga::register_event_handlers!(
///     Service::new(orders),
///     handlers::on_payment_outcome,
/// );
/// ```
#[macro_export]
macro_rules! register_event_handlers {
    ($service:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $service
        $(
            .event_guarded(
                $($seg)::+::TOPIC,
                $($seg)::+::guard,
                $($seg)::+::handle,
            )
        )+
    };
}
