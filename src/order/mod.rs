//! Order side of the saga: checkout, payment reconciliation and the
//! user-facing order queries.

pub mod handlers;
mod order;
mod pricing;
mod queries;
mod reconciler;
mod workflow;

use std::sync::Arc;

pub use order::{
    DeliveryStatus, LineItem, Order, PaymentRecord, Reconciliation, ShippingDetails,
};
pub use pricing::{discounted_line_total, line_total, price_cart, validate_item, Pricing};
pub use queries::OrderQueries;
pub use reconciler::OrderReconciler;
pub use workflow::{OrderCreationWorkflow, OrderPlaced, ShippingRequest};

use crate::bus::Publisher;
use crate::collaborators::{CartClient, IdentityResolver, UserProfile};
use crate::config::PublishMode;
use crate::error::SagaError;
use crate::microsvc::Service;
use crate::model::ModelStore;

/// Everything the order handlers need, sharing one store.
pub struct OrderService<S> {
    workflow: OrderCreationWorkflow<S>,
    reconciler: OrderReconciler<S>,
    queries: OrderQueries<S>,
    identity: Arc<dyn IdentityResolver>,
}

impl<S: ModelStore + Clone> OrderService<S> {
    pub fn new(
        store: S,
        identity: Arc<dyn IdentityResolver>,
        cart: Arc<dyn CartClient>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            workflow: OrderCreationWorkflow::new(
                store.clone(),
                Arc::clone(&identity),
                cart,
                publisher,
            ),
            reconciler: OrderReconciler::new(store.clone()),
            queries: OrderQueries::new(store),
            identity,
        }
    }

    pub fn with_publish_mode(mut self, mode: PublishMode) -> Self {
        self.workflow = self.workflow.with_publish_mode(mode);
        self
    }
}

impl<S: ModelStore> OrderService<S> {
    pub fn workflow(&self) -> &OrderCreationWorkflow<S> {
        &self.workflow
    }

    pub fn reconciler(&self) -> &OrderReconciler<S> {
        &self.reconciler
    }

    pub fn queries(&self) -> &OrderQueries<S> {
        &self.queries
    }

    pub fn store(&self) -> &S {
        self.workflow.store()
    }

    /// Resolve the caller behind a bearer token.
    pub fn resolve_user(&self, token: &str) -> Result<UserProfile, SagaError> {
        self.identity
            .resolve_user(token)?
            .ok_or(SagaError::UserNotFound)
    }
}

/// The order service: checkout and query commands, plus the payment-outcome
/// consumer, which only the bus can reach.
pub fn service<S>(orders: OrderService<S>) -> Service<OrderService<S>>
where
    S: ModelStore + 'static,
{
    let service = crate::register_handlers!(
        Service::new(orders),
        handlers::create,
        handlers::list,
        handlers::get,
        handlers::delete,
    );
    crate::register_event_handlers!(service, handlers::on_payment_outcome)
}
