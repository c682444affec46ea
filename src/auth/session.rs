//! Session snapshot and token handling

use std::sync::{Arc, RwLock};

/// Latest observation of the external identity provider's state.
///
/// The client never drives the login flow itself; it only reacts to these
/// snapshots as the provider resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// Whether the provider currently holds a valid session
    pub is_authenticated: bool,

    /// Whether the provider is still resolving its session
    pub is_loading: bool,

    /// The bearer token, present when authenticated
    pub token: Option<String>,
}

impl AuthSnapshot {
    /// Snapshot for a resolved, signed-in session
    pub fn authenticated(token: impl Into<String>) -> Self {
        Self {
            is_authenticated: true,
            is_loading: false,
            token: Some(token.into()),
        }
    }

    /// Snapshot for a resolved, signed-out session
    pub fn unauthenticated() -> Self {
        Self {
            is_authenticated: false,
            is_loading: false,
            token: None,
        }
    }

    /// Snapshot for a provider that has not resolved yet
    pub fn loading() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
            token: None,
        }
    }
}

/// Shared, synchronously-readable copy of the current bearer token.
///
/// The request path reads this on every outbound call instead of awaiting
/// the identity provider; the session synchronizer overwrites it the moment
/// a new snapshot resolves, so there is no staleness window beyond the
/// provider's own refresh.
#[derive(Debug, Clone, Default)]
pub struct TokenCell {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current token, if one is held
    pub fn get(&self) -> Option<String> {
        self.inner.read().unwrap().clone()
    }

    /// Overwrite the token; `None` clears it
    pub fn set(&self, token: Option<String>) {
        *self.inner.write().unwrap() = token;
    }

    /// Whether a token is currently held
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cell_is_shared_across_clones() {
        let cell = TokenCell::new();
        let handle = cell.clone();
        handle.set(Some("tok".to_string()));
        assert_eq!(cell.get().as_deref(), Some("tok"));
        assert!(cell.is_authenticated());

        cell.set(None);
        assert!(!handle.is_authenticated());
    }
}
