//! Service — command handler registry and dispatch.
//!
//! ## Example
//!
//! ```ignore
//! use storefront_saga::microsvc::{Service, Session};
//! use serde_json::json;
//!
//! let service = Service::new(order_service)
//!     .command("order.ping", |_ctx| Ok(json!({ "pong": true })));
//!
//! let result = service.dispatch("order.ping", json!({}), Session::new());
//! ```
//!
//! Bus consumers register with `event` / `event_guarded` instead and are only
//! reachable through `dispatch_event`.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use super::context::Context;
use super::error::HandlerError;
use super::session::Session;
use crate::bus::Event;

type Guard<R> = Box<dyn Fn(&Context<R>) -> bool + Send + Sync>;
type Handle<R> = Box<dyn Fn(&Context<R>) -> Result<Value, HandlerError> + Send + Sync>;

struct CommandHandler<R> {
    guard: Option<Guard<R>>,
    handle: Handle<R>,
}

/// Routes named commands and bus topics to handler functions.
///
/// Generic over `R`, the state the handlers share (reachable through
/// `ctx.repo()`). Commands answer callers through [`dispatch`](Self::dispatch)
/// (and the HTTP transport). Event handlers answer bus events through
/// [`dispatch_event`](Self::dispatch_event) only, so a topic consumer is never
/// reachable as a command.
pub struct Service<R> {
    repo: R,
    handlers: HashMap<String, CommandHandler<R>>,
    events: HashMap<String, CommandHandler<R>>,
}

impl<R: Send + Sync + 'static> Service<R> {
    /// Create a service with no handlers around `repo`.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            handlers: HashMap::new(),
            events: HashMap::new(),
        }
    }

    /// Register a command handler.
    pub fn command<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&Context<R>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(
            name.to_string(),
            CommandHandler {
                guard: None,
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Register a command handler behind a guard. When the guard returns
    /// `false` the command fails with `HandlerError::GuardRejected`.
    pub fn command_guarded<G, F>(mut self, name: &str, guard: G, handler: F) -> Self
    where
        G: Fn(&Context<R>) -> bool + Send + Sync + 'static,
        F: Fn(&Context<R>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(
            name.to_string(),
            CommandHandler {
                guard: Some(Box::new(guard)),
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Register a handler for events published on `topic`.
    pub fn event<F>(mut self, topic: &str, handler: F) -> Self
    where
        F: Fn(&Context<R>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.events.insert(
            topic.to_string(),
            CommandHandler {
                guard: None,
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Register an event handler behind a guard.
    pub fn event_guarded<G, F>(mut self, topic: &str, guard: G, handler: F) -> Self
    where
        G: Fn(&Context<R>) -> bool + Send + Sync + 'static,
        F: Fn(&Context<R>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.events.insert(
            topic.to_string(),
            CommandHandler {
                guard: Some(Box::new(guard)),
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Run a registered command. Event handlers are not reachable from here.
    pub fn dispatch(
        &self,
        command: &str,
        input: Value,
        session: Session,
    ) -> Result<Value, HandlerError> {
        let handler = self
            .handlers
            .get(command)
            .ok_or_else(|| HandlerError::UnknownCommand(command.to_string()))?;
        self.run(handler, command, input, session)
    }

    /// Dispatch a bus event: topic → event handler, JSON payload → input,
    /// metadata → session.
    pub fn dispatch_event(&self, event: &Event) -> Result<Value, HandlerError> {
        let handler = self
            .events
            .get(&event.event_type)
            .ok_or_else(|| HandlerError::UnknownCommand(event.event_type.clone()))?;
        let input: Value = serde_json::from_slice(&event.payload)?;
        let session = match &event.metadata {
            Some(meta) => Session::from_map(meta.iter().cloned().collect()),
            None => Session::new(),
        };
        self.run(handler, &event.event_type, input, session)
    }

    fn run(
        &self,
        handler: &CommandHandler<R>,
        name: &str,
        input: Value,
        session: Session,
    ) -> Result<Value, HandlerError> {
        let ctx = Context::new(name.to_string(), input, session, &self.repo);

        if let Some(guard) = &handler.guard {
            if !guard(&ctx) {
                debug!(command = name, "guard rejected command");
                return Err(HandlerError::GuardRejected(name.to_string()));
            }
        }

        (handler.handle)(&ctx)
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Topics with a registered event handler, sorted.
    pub fn topics(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.events.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// The shared state handed to every handler.
    pub fn repo(&self) -> &R {
        &self.repo
    }
}
