use tracing::info;

use super::order::Order;
use crate::error::SagaError;
use crate::model::ModelStore;

/// Read side of the order service, scoped to the calling user.
pub struct OrderQueries<S> {
    store: S,
}

impl<S: ModelStore> OrderQueries<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The user's orders, newest first.
    pub fn list_orders(&self, user_id: i64) -> Result<Vec<Order>, SagaError> {
        let mut orders: Vec<Order> = self
            .store
            .find_models::<Order>(&|order| order.user_id() == user_id)?
            .into_iter()
            .map(|v| v.data)
            .collect();
        orders.sort_by(|a, b| b.order_id().cmp(&a.order_id()));
        Ok(orders)
    }

    /// Another user's order is reported as missing.
    pub fn get_order(&self, user_id: i64, order_id: i64) -> Result<Order, SagaError> {
        match self.store.get_model::<Order>(&order_id.to_string())? {
            Some(v) if v.data.user_id() == user_id => Ok(v.data),
            _ => Err(SagaError::OrderNotFound(order_id)),
        }
    }

    pub fn delete_order(&self, user_id: i64, order_id: i64) -> Result<(), SagaError> {
        self.get_order(user_id, order_id)?;
        if !self.store.delete_model::<Order>(&order_id.to_string())? {
            return Err(SagaError::OrderNotFound(order_id));
        }
        info!(order_id, user_id, "order deleted");
        Ok(())
    }
}
