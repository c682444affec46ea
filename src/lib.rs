//! GeneStream Rust Client Library
//!
//! A Rust client for the GeneStream biological-sequence management
//! platform: project organization with role-based membership, sequence
//! search and annotation, profile management, and a streaming chat
//! assistant.
//!
//! Authentication is delegated to an external identity provider. The
//! [`SessionSynchronizer`](auth::SessionSynchronizer) observes that
//! provider's resolved state and keeps the bearer token, the
//! [`ProjectStore`](store::ProjectStore) and the
//! [`QueryCache`](cache::QueryCache) consistent with it.

pub mod annotations;
pub mod auth;
pub mod cache;
pub mod chat;
pub mod config;
pub mod error;
pub mod fetch;
pub mod projects;
pub mod sequences;
pub mod storage;
pub mod store;
pub mod users;
pub mod waitlist;

use std::sync::Arc;

use reqwest::Client;

use crate::annotations::AnnotationsClient;
use crate::auth::{SessionSynchronizer, TokenCell};
use crate::cache::QueryCache;
use crate::chat::ChatClient;
use crate::config::ClientOptions;
use crate::projects::ProjectsClient;
use crate::sequences::SequencesClient;
use crate::storage::{ClientStorage, MemoryStorage, AUTH_TOKEN_KEY};
use crate::store::ProjectStore;
use crate::users::UsersClient;
use crate::waitlist::WaitlistClient;

/// The main entry point for the GeneStream Rust client
pub struct GeneStream {
    /// The base URL of the GeneStream API
    url: String,
    /// Client options
    options: ClientOptions,
    /// HTTP client used for requests
    http_client: Client,
    /// Synchronously-readable bearer token for the request path
    token: TokenCell,
    /// Durable client storage
    storage: Arc<dyn ClientStorage>,
    /// Project selection store
    store: ProjectStore,
    /// Keyed cache of server resources
    cache: QueryCache,
}

impl GeneStream {
    /// Create a new GeneStream client
    ///
    /// # Example
    ///
    /// ```
    /// use genestream_client::GeneStream;
    ///
    /// let client = GeneStream::new("https://api.genestream.example");
    /// ```
    pub fn new(api_url: &str) -> Self {
        Self::new_with_options(api_url, ClientOptions::default())
    }

    /// Create a new GeneStream client with custom options
    pub fn new_with_options(api_url: &str, options: ClientOptions) -> Self {
        Self::with_storage(api_url, options, Arc::new(MemoryStorage::new()))
    }

    /// Create a client backed by a caller-supplied durable storage.
    ///
    /// A bearer token persisted under `auth_token` in a previous run is
    /// restored into the request path.
    pub fn with_storage(
        api_url: &str,
        options: ClientOptions,
        storage: Arc<dyn ClientStorage>,
    ) -> Self {
        let token = TokenCell::new();
        if let Some(persisted) = storage.get(AUTH_TOKEN_KEY) {
            token.set(Some(persisted));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().unwrap_or_else(|_| Client::new());

        Self {
            url: api_url.trim_end_matches('/').to_string(),
            cache: QueryCache::new(options.cache_stale_after, options.read_retries),
            options,
            http_client,
            token,
            storage,
            store: ProjectStore::new(),
        }
    }

    /// The base URL this client talks to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The project selection store
    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    /// The query cache
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The durable client storage
    pub fn storage(&self) -> &Arc<dyn ClientStorage> {
        &self.storage
    }

    /// Overwrite the bearer token used for authenticated requests.
    ///
    /// Normally the session synchronizer maintains this; the setter exists
    /// for callers that manage the identity provider themselves.
    pub fn set_access_token(&self, token: Option<&str>) {
        match token {
            Some(token) => {
                self.token.set(Some(token.to_string()));
                self.storage.set(AUTH_TOKEN_KEY, token);
            }
            None => {
                self.token.set(None);
                self.storage.remove(AUTH_TOKEN_KEY);
            }
        }
    }

    /// The session synchronizer, which applies identity-provider state
    /// transitions to this client
    pub fn session(&self) -> SessionSynchronizer {
        SessionSynchronizer::new(
            self.projects(),
            self.token.clone(),
            self.storage.clone(),
            self.store.clone(),
            self.cache.clone(),
        )
    }

    /// Client for project and membership operations
    pub fn projects(&self) -> ProjectsClient {
        ProjectsClient::new(
            &self.url,
            self.http_client.clone(),
            self.token.clone(),
            self.cache.clone(),
            self.store.clone(),
            self.storage.clone(),
        )
    }

    /// Client for sequence search and detail
    pub fn sequences(&self) -> SequencesClient {
        SequencesClient::new(
            &self.url,
            self.http_client.clone(),
            self.token.clone(),
            self.cache.clone(),
        )
    }

    /// Client for annotation mutations
    pub fn annotations(&self) -> AnnotationsClient {
        AnnotationsClient::new(
            &self.url,
            self.http_client.clone(),
            self.token.clone(),
            self.cache.clone(),
        )
    }

    /// Client for the signed-in user's profile
    pub fn users(&self) -> UsersClient {
        UsersClient::new(
            &self.url,
            self.http_client.clone(),
            self.token.clone(),
            self.cache.clone(),
            self.storage.clone(),
        )
    }

    /// Client for the chat assistant
    pub fn chat(&self) -> ChatClient {
        ChatClient::new(&self.url, self.http_client.clone())
    }

    /// Client for the public waitlist
    pub fn waitlist(&self) -> WaitlistClient {
        WaitlistClient::new(&self.url, self.http_client.clone())
    }

    /// Client options in effect
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{AuthSnapshot, SessionSynchronizer, TokenProvider};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::GeneStream;
}
