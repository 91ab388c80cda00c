use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::strategy::StrategyTable;
use crate::bus::{Event, Publisher};
use crate::error::SagaError;
use crate::events::{topics, OrderIntentEvent, PaymentOutcomeEvent};

/// Turns order intents into payment outcomes.
///
/// Stateless: handling the same intent twice publishes the same outcome
/// twice, which the order side absorbs.
pub struct PaymentDecisionEngine {
    strategies: StrategyTable,
    publisher: Arc<dyn Publisher>,
}

impl PaymentDecisionEngine {
    pub fn new(strategies: StrategyTable, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            strategies,
            publisher,
        }
    }

    /// Engine with the standard card and wallet strategies.
    pub fn standard(publisher: Arc<dyn Publisher>) -> Self {
        Self::new(StrategyTable::standard(), publisher)
    }

    pub fn strategies(&self) -> &StrategyTable {
        &self.strategies
    }

    /// Compute the outcome without publishing it.
    pub fn decide(&self, intent: &OrderIntentEvent) -> Result<PaymentOutcomeEvent, SagaError> {
        let Some(strategy) = self.strategies.get(&intent.pay_type) else {
            warn!(
                order_id = intent.order_id,
                pay_type = %intent.pay_type,
                "no strategy for payment method"
            );
            return Err(SagaError::UnknownPaymentMethod(intent.pay_type.to_string()));
        };

        let decision = strategy.decide(intent);
        Ok(PaymentOutcomeEvent {
            user_id: intent.user_id,
            order_id: intent.order_id,
            amount: intent.amount,
            message: decision.message,
            payment_status: decision.status,
            pay_type: intent.pay_type.clone(),
        })
    }

    /// Decide and publish the outcome, keyed by order id.
    #[instrument(skip(self, intent), fields(order_id = intent.order_id, pay_type = %intent.pay_type))]
    pub fn process(&self, intent: &OrderIntentEvent) -> Result<PaymentOutcomeEvent, SagaError> {
        let outcome = self.decide(intent)?;
        let event = Event::json(
            outcome.event_id(),
            topics::PAYMENT_OUTCOME,
            outcome.order_id.to_string(),
            &outcome,
        )?;
        self.publisher.publish(event)?;

        info!(
            order_id = outcome.order_id,
            status = %outcome.payment_status,
            "payment outcome published"
        );
        Ok(outcome)
    }
}
