//! Durable client-side storage
//!
//! The browser front end this client talks on behalf of keeps a handful of
//! values in `localStorage`: the bearer token for the synchronous request
//! path, the serialized active project, and a short-lived profile picture
//! URL per user. [`ClientStorage`] models that key/value surface;
//! [`MemoryStorage`] is the in-process implementation and callers may plug
//! in their own durable one.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;
use serde::{Deserialize, Serialize};

/// Storage key holding the raw bearer token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Storage key holding the serialized active [`Project`](crate::projects::Project).
pub const ACTIVE_PROJECT_KEY: &str = "activeProject";

/// Prefix for per-user cached profile picture entries.
pub const PROFILE_PICTURE_KEY_PREFIX: &str = "genestream_profile_picture_";

const PROFILE_PICTURE_TTL: Duration = Duration::from_secs(60 * 60);

/// String key/value storage with synchronous access.
///
/// Reads must be cheap: the request path consults the token entry on every
/// outbound call.
pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory [`ClientStorage`] implementation
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.write().unwrap().remove(key);
    }
}

/// Cached profile picture entry: URL plus a millisecond timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedProfilePicture {
    pub url: String,
    pub timestamp: u64,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

fn profile_picture_key(user_id: &str) -> String {
    format!("{}{}", PROFILE_PICTURE_KEY_PREFIX, user_id)
}

/// Look up a user's cached profile picture URL.
///
/// Entries expire after one hour; expired or unparsable entries are removed
/// on read.
pub fn cached_profile_picture(storage: &dyn ClientStorage, user_id: &str) -> Option<String> {
    let key = profile_picture_key(user_id);
    let raw = storage.get(&key)?;

    match serde_json::from_str::<CachedProfilePicture>(&raw) {
        Ok(entry) => {
            let age = now_millis().saturating_sub(entry.timestamp);
            if age > PROFILE_PICTURE_TTL.as_millis() as u64 {
                storage.remove(&key);
                None
            } else {
                Some(entry.url)
            }
        }
        Err(err) => {
            debug!("discarding unparsable profile picture cache entry: {}", err);
            storage.remove(&key);
            None
        }
    }
}

/// Cache a user's profile picture URL for one hour.
pub fn cache_profile_picture(storage: &dyn ClientStorage, user_id: &str, url: &str) {
    let entry = CachedProfilePicture {
        url: url.to_string(),
        timestamp: now_millis(),
    };
    if let Ok(raw) = serde_json::to_string(&entry) {
        storage.set(&profile_picture_key(user_id), &raw);
    }
}

/// Drop a user's cached profile picture.
pub fn clear_profile_picture(storage: &dyn ClientStorage, user_id: &str) {
    storage.remove(&profile_picture_key(user_id));
}
