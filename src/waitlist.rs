//! Waitlist signup

use reqwest::Client;
use serde_json::json;

use crate::error::Error;
use crate::fetch::Fetch;

/// Client for the public waitlist
#[derive(Clone)]
pub struct WaitlistClient {
    base_url: String,
    http: Client,
}

impl WaitlistClient {
    pub(crate) fn new(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            http,
        }
    }

    /// Add an email address to the waitlist; unauthenticated
    pub async fn join(&self, email: &str) -> Result<(), Error> {
        Fetch::post(&self.http, &format!("{}/waitlist", self.base_url))
            .json(&json!({ "email": email }))?
            .execute_empty()
            .await
    }
}
