//! Error type for microsvc command handlers.

use crate::error::SagaError;

/// Why a command or event could not be handled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HandlerError {
    /// No handler registered for this command name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Payload could not be decoded into the handler's input type.
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    /// The handler's guard rejected the input.
    #[error("guard rejected command: {0}")]
    GuardRejected(String),

    /// Missing or malformed bearer token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Saga(#[from] SagaError),
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::DecodeFailed(err.to_string())
    }
}

impl HandlerError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::UnknownCommand(_) => 404,
            HandlerError::DecodeFailed(_) => 400,
            HandlerError::GuardRejected(_) => 400,
            HandlerError::Unauthorized(_) => 401,
            HandlerError::Saga(e) => e.status_code(),
        }
    }

    /// Whether a redelivery of the same message could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            HandlerError::Saga(e) => e.is_retryable(),
            _ => false,
        }
    }
}
