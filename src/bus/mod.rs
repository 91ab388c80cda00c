//! Event bus - publish/subscribe abstractions.
//!
//! The saga's two services never call each other; they only exchange events
//! through a bus that delivers at-least-once and in order per partition key.
//!
//! ## Architecture
//!
//! ```text
//!  order service ──publish(order-intent)──▶ ┌──────────────┐ ──poll──▶ payment service
//!                                           │   Publisher  │
//!  order service ◀──poll(payment-outcome)── │  Subscriber  │ ◀──publish── payment service
//!                                           └──────────────┘
//!                                          InMemoryQueue (included)
//!                                          Kafka / NATS   (external)
//! ```

mod in_memory_queue;
mod publisher;
mod subscriber;

pub use in_memory_queue::InMemoryQueue;
pub use publisher::{Event, PublishError, Publisher};
pub use subscriber::{Subscribable, Subscriber};
