//! Wires both services, their consumption lanes and (in outbox mode) the
//! relay into one in-process saga.

use std::sync::Arc;

use tracing::info;

use crate::bus::{Publisher, Subscribable};
use crate::collaborators::{CartClient, IdentityResolver};
use crate::config::{ConfigError, PublishMode, SagaConfig};
use crate::events::topics;
use crate::microsvc::{self, Service, SubscribeOptions, TransportHandle, TransportStats};
use crate::model::ModelStore;
use crate::order::{self, OrderService};
use crate::outbox::{OutboxWorker, OutboxWorkerThread, WorkerStats};
use crate::payment::{self, PaymentDecisionEngine};

/// What each background thread has done.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Order-intent lane (payment side).
    pub intents: TransportStats,
    /// Payment-outcome lane (order side).
    pub outcomes: TransportStats,
    /// Outbox relay; `None` in direct mode.
    pub relay: Option<WorkerStats>,
}

/// A running saga: order service + payment service over one bus.
pub struct SagaRuntime<S> {
    orders: Arc<Service<OrderService<S>>>,
    payments: Arc<Service<PaymentDecisionEngine>>,
    intent_lane: TransportHandle,
    outcome_lane: TransportHandle,
    relay: Option<OutboxWorkerThread>,
}

impl<S> SagaRuntime<S>
where
    S: ModelStore + Clone + 'static,
{
    pub fn start<Q>(
        config: &SagaConfig,
        store: S,
        bus: Q,
        identity: Arc<dyn IdentityResolver>,
        cart: Arc<dyn CartClient>,
    ) -> Result<Self, ConfigError>
    where
        Q: Publisher + Subscribable + Clone + 'static,
    {
        config.validate()?;
        let publisher: Arc<dyn Publisher> = Arc::new(bus.clone());

        let orders = Arc::new(order::service(
            OrderService::new(store.clone(), identity, cart, Arc::clone(&publisher))
                .with_publish_mode(config.publish_mode),
        ));
        let payments = Arc::new(payment::service(PaymentDecisionEngine::standard(
            Arc::clone(&publisher),
        )));

        let mut options = SubscribeOptions::default()
            .with_poll_interval(config.poll_interval())
            .with_max_deliveries(config.max_deliveries);
        if config.dead_letter {
            options = options.with_dead_letter(Arc::clone(&publisher));
        }

        let intent_lane = microsvc::subscribe(
            Arc::clone(&payments),
            bus.subscribe(topics::ORDER_INTENT),
            options.clone(),
        );
        let outcome_lane = microsvc::subscribe(
            Arc::clone(&orders),
            bus.subscribe(topics::PAYMENT_OUTCOME),
            options,
        );

        let relay = match config.publish_mode {
            PublishMode::Direct => None,
            PublishMode::Outbox => {
                let worker = OutboxWorker::new(bus)
                    .with_batch_size(config.outbox.batch_size)
                    .with_lease(config.outbox.lease())
                    .with_max_attempts(config.outbox.max_attempts);
                Some(OutboxWorkerThread::spawn(
                    store,
                    worker,
                    config.outbox.relay_interval(),
                ))
            }
        };

        info!(publish_mode = ?config.publish_mode, "saga runtime started");
        Ok(Self {
            orders,
            payments,
            intent_lane,
            outcome_lane,
            relay,
        })
    }

    /// The order command service (checkout and queries).
    pub fn orders(&self) -> &Arc<Service<OrderService<S>>> {
        &self.orders
    }

    pub fn payments(&self) -> &Arc<Service<PaymentDecisionEngine>> {
        &self.payments
    }

    /// Statistics so far, without stopping anything.
    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            intents: self.intent_lane.stats(),
            outcomes: self.outcome_lane.stats(),
            relay: self.relay.as_ref().map(OutboxWorkerThread::stats),
        }
    }

    /// Stop every background thread and collect their statistics.
    pub fn shutdown(self) -> RuntimeStats {
        let relay = self.relay.map(OutboxWorkerThread::stop);
        let stats = RuntimeStats {
            intents: self.intent_lane.stop(),
            outcomes: self.outcome_lane.stop(),
            relay,
        };
        info!(
            intents_handled = stats.intents.handled,
            outcomes_handled = stats.outcomes.handled,
            "saga runtime stopped"
        );
        stats
    }
}
