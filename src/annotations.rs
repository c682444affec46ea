//! Annotation creation, editing, and publication
//!
//! Annotations are user-contributed names or descriptions attached to a
//! sequence, scoped to the project that granted access. Whether a user may
//! edit or publish one is derived server-side from the annotation's access
//! level and the project-access list; the client just surfaces the
//! resulting 401/403.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::TokenCell;
use crate::cache::QueryCache;
use crate::error::Error;
use crate::fetch::Fetch;
use crate::sequences::AccessLevel;

/// What an annotation contributes to a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Name,
    Description,
}

/// One annotation as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "_id")]
    pub id: String,
    pub gs_id: String,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub content: String,
    pub created_by: String,
    pub project_id: String,
    pub access_level: AccessLevel,
    pub published: bool,
    #[serde(default)]
    pub published_by: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Client for annotation mutations
#[derive(Clone)]
pub struct AnnotationsClient {
    base_url: String,
    http: Client,
    token: TokenCell,
    cache: QueryCache,
}

impl AnnotationsClient {
    pub(crate) fn new(base_url: &str, http: Client, token: TokenCell, cache: QueryCache) -> Self {
        Self {
            base_url: base_url.to_string(),
            http,
            token,
            cache,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach a new annotation to a sequence
    pub async fn create(
        &self,
        gs_id: &str,
        kind: AnnotationKind,
        content: &str,
    ) -> Result<(), Error> {
        Fetch::post(&self.http, &self.url("/annotations"))
            .bearer_opt(self.token.get().as_deref())
            .json(&json!({ "gs_id": gs_id, "type": kind, "content": content }))?
            .execute_empty()
            .await?;

        self.cache.invalidate_sequence(gs_id);
        Ok(())
    }

    /// Replace an annotation's content
    pub async fn edit(&self, gs_id: &str, annotation_id: &str, content: &str) -> Result<(), Error> {
        Fetch::patch(&self.http, &self.url(&format!("/annotations/{}", annotation_id)))
            .bearer_opt(self.token.get().as_deref())
            .json(&json!({ "content": content }))?
            .execute_empty()
            .await?;

        self.cache.invalidate_sequence(gs_id);
        Ok(())
    }

    /// Publish an annotation, making it visible beyond its project
    pub async fn publish(&self, gs_id: &str, annotation_id: &str) -> Result<(), Error> {
        Fetch::patch(
            &self.http,
            &self.url(&format!("/annotations/{}/publish", annotation_id)),
        )
        .bearer_opt(self.token.get().as_deref())
        .execute_empty()
        .await?;

        self.cache.invalidate_sequence(gs_id);
        Ok(())
    }
}
