//! Context passed to command handlers.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::HandlerError;
use super::session::Session;

/// Everything a handler sees: the command name, its JSON input, the session
/// and the service's repository.
pub struct Context<'a, R> {
    command_name: String,
    input: Value,
    session: Session,
    repo: &'a R,
}

impl<'a, R> Context<'a, R> {
    pub(crate) fn new(command_name: String, input: Value, session: Session, repo: &'a R) -> Self {
        Self {
            command_name,
            input,
            session,
            repo,
        }
    }

    /// Deserialize the input payload into a typed struct.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        Ok(T::deserialize(&self.input)?)
    }

    /// The input payload as received, before any typed decoding.
    pub fn raw_input(&self) -> &Value {
        &self.input
    }

    /// The command name, or the topic when dispatched from the bus.
    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    /// Session variables: request headers over HTTP, event metadata on the
    /// bus.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The caller's bearer token. Returns `Unauthorized` if absent.
    pub fn bearer_token(&self) -> Result<&str, HandlerError> {
        self.session
            .bearer_token()
            .ok_or_else(|| HandlerError::Unauthorized("missing bearer token".into()))
    }

    /// The state shared by the service's handlers.
    pub fn repo(&self) -> &R {
        self.repo
    }

    /// Check if the raw input contains a (non-null) field.
    pub fn has_field(&self, field: &str) -> bool {
        self.input.get(field).map_or(false, |v| !v.is_null())
    }

    /// Check if the raw input contains all specified (non-null) fields.
    pub fn has_fields(&self, fields: &[&str]) -> bool {
        fields.iter().all(|f| self.has_field(f))
    }
}
