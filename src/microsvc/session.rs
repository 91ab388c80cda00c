//! Request-scoped key/value variables.

use std::collections::HashMap;

const AUTHORIZATION: &str = "authorization";

/// Header-like variables attached to a command.
///
/// Over HTTP these are the request headers (lowercased); on the bus they
/// come from event metadata. Keys are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct Session {
    variables: HashMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(variables: HashMap<String, String>) -> Self {
        Self {
            variables: variables
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        }
    }

    /// Session carrying `Authorization: Bearer <token>`.
    pub fn bearer(token: &str) -> Self {
        let mut session = Self::new();
        session.set(AUTHORIZATION, format!("Bearer {}", token));
        session
    }

    /// The raw `authorization` value.
    pub fn authorization(&self) -> Option<&str> {
        self.get(AUTHORIZATION)
    }

    /// Token part of a `Bearer` authorization value.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.authorization()?.trim();
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables
            .get(&key.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables
            .insert(key.into().to_ascii_lowercase(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }
}
