use crate::bus::PublishError;
use crate::collaborators::CollaboratorError;
use crate::model::ModelError;

/// Errors raised by order creation, payment decisions and reconciliation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SagaError {
    /// Bad or incomplete request input.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("There are no products in your cart")]
    EmptyCart,

    /// Durable write or read failed.
    #[error("persistence failure: {0}")]
    Persistence(#[from] ModelError),

    /// The bus refused an event.
    #[error("publish failure: {0}")]
    Publish(#[from] PublishError),

    /// The identity or cart service could not be reached.
    #[error("collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    #[error("Order not found: {0}")]
    OrderNotFound(i64),
}

impl SagaError {
    /// HTTP-style status code for callers of the order commands.
    pub fn status_code(&self) -> u16 {
        match self {
            SagaError::Validation(_) => 400,
            SagaError::UserNotFound => 400,
            SagaError::EmptyCart => 400,
            SagaError::Persistence(_) => 500,
            SagaError::Publish(_) => 503,
            SagaError::Collaborator(_) => 502,
            SagaError::UnknownPaymentMethod(_) => 422,
            SagaError::OrderNotFound(_) => 404,
        }
    }

    /// Whether redelivering the same message could succeed.
    ///
    /// Structural mismatches (unknown method, missing order) never resolve
    /// themselves, so consumers drop those instead of retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SagaError::Persistence(_) | SagaError::Publish(_) | SagaError::Collaborator(_)
        )
    }
}
