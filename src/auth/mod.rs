//! Session synchronization with the external identity provider
//!
//! Login and logout happen outside this crate, in the identity provider.
//! The [`SessionSynchronizer`] translates each resolved provider snapshot
//! into a consistent client state: token cell and durable storage for the
//! request path, project store for the views, query cache for everything
//! derived from the active project.

mod session;

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;

use crate::cache::{QueryCache, QueryKey};
use crate::error::Error;
use crate::projects::ProjectsClient;
use crate::storage::{ClientStorage, ACTIVE_PROJECT_KEY, AUTH_TOKEN_KEY};
use crate::store::ProjectStore;

pub use session::{AuthSnapshot, TokenCell};

/// External identity provider, as seen by this crate.
///
/// Implementations wrap whatever issues and refreshes tokens; tests use a
/// stub.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetch the current access token, refreshing it if necessary
    async fn access_token(&self) -> Result<String, Error>;

    /// Whether the provider holds a valid session
    fn is_authenticated(&self) -> bool;

    /// Whether the provider is still resolving its session
    fn is_loading(&self) -> bool;
}

/// Translates identity-provider session transitions into client state
pub struct SessionSynchronizer {
    projects: ProjectsClient,
    token: TokenCell,
    storage: Arc<dyn ClientStorage>,
    store: ProjectStore,
    cache: QueryCache,
}

impl SessionSynchronizer {
    pub(crate) fn new(
        projects: ProjectsClient,
        token: TokenCell,
        storage: Arc<dyn ClientStorage>,
        store: ProjectStore,
        cache: QueryCache,
    ) -> Self {
        Self {
            projects,
            token,
            storage,
            store,
            cache,
        }
    }

    /// Build a snapshot from the provider's current state and apply it
    pub async fn sync_from(&self, provider: &dyn TokenProvider) -> Result<(), Error> {
        let snapshot = if provider.is_loading() {
            AuthSnapshot::loading()
        } else if provider.is_authenticated() {
            AuthSnapshot::authenticated(provider.access_token().await?)
        } else {
            AuthSnapshot::unauthenticated()
        };
        self.on_auth_resolved(&snapshot).await
    }

    /// Apply a resolved session snapshot.
    ///
    /// Signed out: token, persisted session state and cache are cleared,
    /// the store is reset, and no network call is made. Signed in: the
    /// token is published for the request path, then the project list and
    /// active project are fetched concurrently and applied to the store in
    /// a single write; if either fetch fails, nothing is applied and the
    /// store is left unloaded with the loading flag cleared.
    pub async fn on_auth_resolved(&self, snapshot: &AuthSnapshot) -> Result<(), Error> {
        if snapshot.is_loading {
            return Ok(());
        }

        if !snapshot.is_authenticated {
            self.token.set(None);
            self.storage.remove(AUTH_TOKEN_KEY);
            self.storage.remove(ACTIVE_PROJECT_KEY);
            self.cache.clear();
            self.store.reset();
            return Ok(());
        }

        let token = snapshot
            .token
            .clone()
            .ok_or_else(|| Error::auth("authenticated snapshot carries no token"))?;
        self.token.set(Some(token.clone()));
        self.storage.set(AUTH_TOKEN_KEY, &token);

        self.store.set_is_loading(true);

        let (projects_result, active_result) = tokio::join!(
            self.projects.fetch_projects_raw(),
            self.projects.fetch_active_raw(),
        );

        let (projects, active) = match (projects_result, active_result) {
            (Ok(projects), Ok(active)) => (projects, active),
            (Err(err), _) | (_, Err(err)) => {
                warn!("session startup fetch failed: {}", err);
                self.store.set_is_loading(false);
                return Err(err);
            }
        };

        match active {
            Some(ref project) => match serde_json::to_string(project) {
                Ok(raw) => self.storage.set(ACTIVE_PROJECT_KEY, &raw),
                Err(err) => warn!("failed to persist active project: {}", err),
            },
            None => self.storage.remove(ACTIVE_PROJECT_KEY),
        }

        if let Ok(value) = serde_json::to_value(&projects) {
            self.cache.prime(QueryKey::Projects, value);
        }
        if let Ok(value) = serde_json::to_value(&active) {
            self.cache.prime(QueryKey::ActiveProject, value);
        }

        self.store.apply_session(projects, active);
        Ok(())
    }
}
