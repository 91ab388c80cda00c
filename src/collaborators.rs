//! Narrow interfaces to the services the saga depends on but does not own:
//! identity (token → user) and the shopping cart.
//!
//! In production these are HTTP clients to the auth and cart services; the
//! in-memory implementations here back the tests and the demo.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Error talking to a collaborating service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },
    #[error("{service} rejected the call: {reason}")]
    Rejected { service: &'static str, reason: String },
}

/// The caller as resolved by the identity service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// One cart line as returned by the cart service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: i64,
    pub unit_price: f64,
    /// Percentage in `[0, 100]`.
    pub discount_pct: u32,
    pub quantity: u32,
}

/// Resolves bearer tokens to users.
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` when the token does not belong to any user.
    fn resolve_user(&self, token: &str) -> Result<Option<UserProfile>, CollaboratorError>;
}

/// Reads and clears a user's cart.
pub trait CartClient: Send + Sync {
    fn items(&self, user_id: i64) -> Result<Vec<CartItem>, CollaboratorError>;

    fn clear(&self, user_id: i64) -> Result<(), CollaboratorError>;
}

/// Token table standing in for the auth service.
#[derive(Clone, Default)]
pub struct StaticIdentity {
    tokens: Arc<RwLock<HashMap<String, UserProfile>>>,
}

impl StaticIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a user (builder style).
    pub fn with_user(self, token: impl Into<String>, user: UserProfile) -> Self {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), user);
        self
    }
}

impl IdentityResolver for StaticIdentity {
    fn resolve_user(&self, token: &str) -> Result<Option<UserProfile>, CollaboratorError> {
        let tokens = self.tokens.read().map_err(|_| CollaboratorError::Unavailable {
            service: "identity",
            reason: "lock poisoned".into(),
        })?;
        Ok(tokens.get(token).cloned())
    }
}

/// Carts keyed by user id, standing in for the cart service.
#[derive(Clone, Default)]
pub struct InMemoryCart {
    carts: Arc<RwLock<HashMap<i64, Vec<CartItem>>>>,
}

impl InMemoryCart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&self, user_id: i64, item: CartItem) {
        self.carts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(user_id)
            .or_default()
            .push(item);
    }

    fn poisoned<T>(_: PoisonError<T>) -> CollaboratorError {
        CollaboratorError::Unavailable {
            service: "cart",
            reason: "lock poisoned".into(),
        }
    }
}

impl CartClient for InMemoryCart {
    fn items(&self, user_id: i64) -> Result<Vec<CartItem>, CollaboratorError> {
        let carts = self.carts.read().map_err(Self::poisoned)?;
        Ok(carts.get(&user_id).cloned().unwrap_or_default())
    }

    fn clear(&self, user_id: i64) -> Result<(), CollaboratorError> {
        self.carts.write().map_err(Self::poisoned)?.remove(&user_id);
        Ok(())
    }
}
