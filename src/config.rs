//! Configuration options for the GeneStream client

use std::time::Duration;

/// Configuration options for the GeneStream client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout; `None` disables it
    pub request_timeout: Option<Duration>,

    /// How long a cached query result is considered fresh
    pub cache_stale_after: Duration,

    /// Extra attempts for read queries after a transient failure.
    /// Mutations are never retried.
    pub read_retries: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            cache_stale_after: Duration::from_secs(5 * 60),
            read_retries: 2,
        }
    }
}

impl ClientOptions {
    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the cache staleness window
    pub fn with_cache_stale_after(mut self, value: Duration) -> Self {
        self.cache_stale_after = value;
        self
    }

    /// Set the number of read retries
    pub fn with_read_retries(mut self, value: u32) -> Self {
        self.read_retries = value;
        self
    }
}
