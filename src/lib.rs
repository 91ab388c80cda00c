//! Order–payment saga for a storefront.
//!
//! Order creation commits an order with a `PENDING` payment record and emits
//! an order intent; the payment side decides it and emits an outcome; the
//! order side reconciles the outcome into the order. The two sides share no
//! transaction, only the bus.

pub mod bus;
pub mod collaborators;
pub mod commit;
pub mod config;
pub mod error;
pub mod events;
pub mod microsvc;
pub mod model;
pub mod order;
pub mod outbox;
pub mod payment;
pub mod runtime;
pub mod telemetry;

pub use bus::{Event, InMemoryQueue, PublishError, Publisher, Subscribable, Subscriber};
pub use collaborators::{
    CartClient, CartItem, CollaboratorError, IdentityResolver, InMemoryCart, StaticIdentity,
    UserProfile,
};
pub use commit::{CommitBuilder, CommitBuilderExt};
pub use config::{ConfigError, OutboxConfig, PublishMode, SagaConfig};
pub use error::SagaError;
pub use events::{topics, OrderIntentEvent, PayType, PaymentOutcomeEvent, PaymentStatus};
pub use model::{InMemoryModelStore, Model, ModelError, ModelStore, Versioned};
pub use order::{
    Order, OrderCreationWorkflow, OrderPlaced, OrderQueries, OrderReconciler, OrderService,
    PaymentRecord, Reconciliation, ShippingRequest,
};
pub use outbox::{OutboxRecord, OutboxStatus, OutboxWorker, OutboxWorkerThread};
pub use payment::{PaymentDecisionEngine, PaymentMethodStrategy, StrategyTable};
pub use runtime::{RuntimeStats, SagaRuntime};
pub use telemetry::init_tracing;
