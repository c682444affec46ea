//! Chat assistant backed by `POST /api/generate`
//!
//! The endpoint answers with a chunked text stream of newline-delimited
//! JSON objects, each carrying a `response` text fragment. Fragments are
//! appended to the in-progress message as they arrive; a malformed line is
//! logged and skipped without aborting the stream.

use bytes::Bytes;
use futures_util::StreamExt;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::Error;
use crate::fetch::Fetch;

const DEFAULT_MODEL: &str = "llama3.2";

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
}

/// Accumulates the bot message across chunk boundaries.
///
/// A chunk may end mid-line, or even mid-character; raw bytes are
/// buffered until a newline arrives and each complete line is decoded
/// on its own.
#[derive(Debug, Default)]
struct StreamAccumulator {
    buffer: Vec<u8>,
    message: String,
}

impl StreamAccumulator {
    /// Feed one network chunk, returning the fragments it completed
    fn push(&mut self, chunk: &Bytes) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&byte| byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(fragment) = self.parse_line(line.trim()) {
                fragments.push(fragment);
            }
        }
        fragments
    }

    /// Flush a trailing line that never got its newline
    fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&line);
        self.parse_line(line.trim())
    }

    fn parse_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<GenerateChunk>(line) {
            Ok(chunk) => {
                if chunk.done {
                    debug!("generate stream reported done");
                }
                let fragment = chunk.response?;
                self.message.push_str(&fragment);
                Some(fragment)
            }
            Err(err) => {
                debug!("skipping malformed stream line: {}", err);
                None
            }
        }
    }
}

/// Client for the chat assistant
#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    http: Client,
}

impl ChatClient {
    pub(crate) fn new(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            http,
        }
    }

    /// Send a prompt and stream the reply.
    ///
    /// `on_fragment` is invoked for every text fragment as it arrives; the
    /// full accumulated message is returned once the stream ends. The
    /// request is unauthenticated.
    pub async fn generate<F>(&self, prompt: &str, mut on_fragment: F) -> Result<String, Error>
    where
        F: FnMut(&str),
    {
        let url = format!("{}/api/generate", self.base_url);
        let response = Fetch::post(&self.http, &url)
            .json(&json!({ "model": DEFAULT_MODEL, "prompt": prompt }))?
            .execute_raw()
            .await?;

        let mut accumulator = StreamAccumulator::default();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(Error::stream)?;
            for fragment in accumulator.push(&chunk) {
                on_fragment(&fragment);
            }
        }
        if let Some(fragment) = accumulator.finish() {
            on_fragment(&fragment);
        }

        Ok(accumulator.message)
    }
}
