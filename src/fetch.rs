//! HTTP request plumbing for the GeneStream API
//!
//! Every outbound request goes through [`FetchBuilder`]: it attaches the
//! bearer token when one is held, serializes JSON or multipart bodies, and
//! normalizes non-2xx responses into typed [`Error`]s. Dropping the future
//! returned by any `execute` method aborts the underlying request, so
//! cancellation follows the caller's lifetime.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::error::Error;

/// Helper for building and executing HTTP requests
pub struct FetchBuilder {
    client: Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    form: Option<Form>,
}

impl FetchBuilder {
    /// Create a new FetchBuilder
    pub fn new(client: &Client, url: &str, method: Method) -> Self {
        Self {
            client: client.clone(),
            url: url.to_string(),
            method,
            headers: HeaderMap::new(),
            query_params: Vec::new(),
            body: None,
            form: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Attach a bearer token when one is held; anonymous requests carry
    /// no Authorization header at all.
    pub fn bearer_opt(self, token: Option<&str>) -> Self {
        match token {
            Some(token) => self.bearer_auth(token),
            None => self,
        }
    }

    /// Add a query parameter to the request
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(json);
        Ok(self.header("Content-Type", "application/json"))
    }

    /// Add a multipart form body to the request
    pub fn multipart(mut self, form: Form) -> Self {
        self.form = Some(form);
        self
    }

    /// Build the request
    fn build(self) -> Result<RequestBuilder, Error> {
        let mut url = Url::parse(&self.url)?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut req = self.client.request(self.method, url.as_str());
        req = req.headers(self.headers);

        if let Some(form) = self.form {
            req = req.multipart(form);
        } else if let Some(body) = self.body {
            req = req.body(body);
        }

        Ok(req)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T, Error> {
        let response = self.build()?.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_response(status, text));
        }

        let result = response.json::<T>().await?;
        Ok(result)
    }

    /// Execute the request and discard the response body
    pub async fn execute_empty(self) -> Result<(), Error> {
        let response = self.build()?.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_response(status, text));
        }

        Ok(())
    }

    /// Execute the request and return the raw response after checking the
    /// status; used for streaming bodies.
    pub async fn execute_raw(self) -> Result<reqwest::Response, Error> {
        let response = self.build()?.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_response(status, text));
        }

        Ok(response)
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get(client: &Client, url: &str) -> FetchBuilder {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post(client: &Client, url: &str) -> FetchBuilder {
        FetchBuilder::new(client, url, Method::POST)
    }

    /// Create a PUT request
    pub fn put(client: &Client, url: &str) -> FetchBuilder {
        FetchBuilder::new(client, url, Method::PUT)
    }

    /// Create a PATCH request
    pub fn patch(client: &Client, url: &str) -> FetchBuilder {
        FetchBuilder::new(client, url, Method::PATCH)
    }

    /// Create a DELETE request
    pub fn delete(client: &Client, url: &str) -> FetchBuilder {
        FetchBuilder::new(client, url, Method::DELETE)
    }
}
