use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use super::order::{Order, Reconciliation};
use crate::error::SagaError;
use crate::events::PaymentOutcomeEvent;
use crate::model::{ModelError, ModelStore};

const CONFLICT_RETRIES: usize = 3;

/// Applies payment outcomes to orders.
///
/// A pure function of (stored order, event): replaying an outcome is a
/// no-op, and nothing arriving after a terminal status changes the order.
pub struct OrderReconciler<S> {
    store: S,
}

impl<S: ModelStore> OrderReconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(
        skip(self, outcome),
        fields(order_id = outcome.order_id, status = %outcome.payment_status)
    )]
    pub fn reconcile(&self, outcome: &PaymentOutcomeEvent) -> Result<Reconciliation, SagaError> {
        let id = outcome.order_id.to_string();

        for _ in 0..CONFLICT_RETRIES {
            let Some(stored) = self.store.get_model::<Order>(&id)? else {
                warn!(order_id = outcome.order_id, "payment outcome for unknown order dropped");
                return Err(SagaError::OrderNotFound(outcome.order_id));
            };

            let mut order = stored.data;
            if order.payment().amount != outcome.amount {
                warn!(
                    order_id = outcome.order_id,
                    recorded = order.payment().amount,
                    reported = outcome.amount,
                    "payment outcome amount differs from the order"
                );
            }

            let result =
                order.apply_payment_outcome(outcome.payment_status, &outcome.message, Utc::now());
            match result {
                Reconciliation::Applied => {}
                Reconciliation::Duplicate => {
                    debug!(order_id = outcome.order_id, "duplicate payment outcome");
                    return Ok(result);
                }
                Reconciliation::IgnoredTerminal => {
                    info!(
                        order_id = outcome.order_id,
                        current = %order.payment().status,
                        "payment already final, outcome discarded"
                    );
                    return Ok(result);
                }
            }

            match self.store.update_model(&order, stored.version) {
                Ok(_) => {
                    info!(
                        order_id = outcome.order_id,
                        status = %outcome.payment_status,
                        "payment outcome applied"
                    );
                    return Ok(result);
                }
                Err(ModelError::ConcurrencyConflict { .. }) => {
                    debug!(order_id = outcome.order_id, "order changed underneath, reloading");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(SagaError::Persistence(ModelError::Storage(format!(
            "order {} kept changing during reconciliation",
            outcome.order_id
        ))))
    }
}
