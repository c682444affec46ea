//! Sequence search, suggestions, detail, and access control
//!
//! Search and suggestions work both signed in and anonymously. Anonymous
//! searches are forced to `publicOnly=true` and carry no Authorization
//! header. Sequence detail is cached, keyed by id plus whether the read
//! was authenticated and whether annotations were requested, since
//! those views of a sequence all differ.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::annotations::Annotation;
use crate::auth::TokenCell;
use crate::cache::{QueryCache, QueryKey};
use crate::error::Error;
use crate::fetch::Fetch;

/// Kind of characters a sequence is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CharSet {
    Dna,
    Rna,
    Protein,
    Unknown,
}

/// Visibility of a sequence or annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Private,
    Public,
}

/// A project that has been granted access to a sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAccess {
    pub project_id: String,
    #[serde(default)]
    pub granted_by: Option<String>,
    #[serde(default)]
    pub granted_at: Option<String>,
}

/// Server-side metadata for a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceMetadata {
    pub char_set: CharSet,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub organism: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub display_description: Option<String>,
    pub access_level: AccessLevel,
    #[serde(default)]
    pub project_access: Vec<ProjectAccess>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Annotations attached to a sequence, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceAnnotations {
    #[serde(default)]
    pub name: Vec<Annotation>,
    #[serde(default)]
    pub description: Vec<Annotation>,
}

/// One sequence as returned by `GET /sequences/:gs_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDetail {
    pub gs_id: String,
    #[serde(default)]
    pub sequence: Option<String>,
    #[serde(default)]
    pub metadata: Option<SequenceMetadata>,
    #[serde(default)]
    pub annotations: Option<SequenceAnnotations>,
}

/// Field to sort search results by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Relevance,
    Date,
    Length,
}

impl SortField {
    fn as_str(&self) -> &'static str {
        match self {
            SortField::Relevance => "relevance",
            SortField::Date => "date",
            SortField::Length => "length",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Parameters for `GET /sequences/search`
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub query: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<(SortField, SortOrder)>,
    pub project_id: Option<String>,
    /// Restrict results to public sequences. Forced on when no token is held.
    pub public_only: bool,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// Summary metadata carried by each search hit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultMetadata {
    #[serde(default)]
    pub organism: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub display_description: Option<String>,
    #[serde(default)]
    pub access_level: Option<AccessLevel>,
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub gs_id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub sequence_length: Option<u64>,
    #[serde(default = "default_char_set")]
    pub char_set: CharSet,
    #[serde(default)]
    pub metadata: SearchResultMetadata,
}

fn default_char_set() -> CharSet {
    CharSet::Unknown
}

/// Response of `GET /sequences/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total: u64,
}

/// One typeahead suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSuggestion {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Client for sequence reads and access control
#[derive(Clone)]
pub struct SequencesClient {
    base_url: String,
    http: Client,
    token: TokenCell,
    cache: QueryCache,
}

impl SequencesClient {
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

    /// Fetch one sequence, optionally with its annotations, through the cache
    pub async fn get(
        &self,
        gs_id: &str,
        include_annotations: bool,
    ) -> Result<SequenceDetail, Error> {
        let authenticated = self.token.is_authenticated();
        let key = QueryKey::Sequence {
            gs_id: gs_id.to_string(),
            authenticated,
            with_annotations: include_annotations,
        };

        let http = self.http.clone();
        let token = self.token.clone();
        let mut url = self.url(&format!("/sequences/{}", gs_id));
        if include_annotations {
            url.push_str("?include=annotations");
        }

        let value = self
            .cache
            .get_or_fetch(key, move || {
                let http = http.clone();
                let token = token.clone();
                let url = url.clone();
                async move {
                    Fetch::get(&http, &url)
                        .bearer_opt(token.get().as_deref())
                        .execute::<serde_json::Value>()
                        .await
                }
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Typeahead suggestions; keystroke-driven, so never cached
    pub async fn suggest(&self, query: &str) -> Result<Vec<SearchSuggestion>, Error> {
        Fetch::get(&self.http, &self.url("/sequences/suggest"))
            .query("query", query)
            .bearer_opt(self.token.get().as_deref())
            .execute::<Vec<SearchSuggestion>>()
            .await
    }

    /// Search sequences.
    ///
    /// Without a token the request is anonymous: `publicOnly` is forced to
    /// `true` and no Authorization header is attached.
    pub async fn search(&self, options: &SearchOptions) -> Result<SearchResponse, Error> {
        let token = self.token.get();
        let public_only = token.is_none() || options.public_only;

        let mut request = Fetch::get(&self.http, &self.url("/sequences/search"))
            .query("query", &options.query)
            .query("page", &options.page.unwrap_or(1).to_string())
            .query("limit", &options.limit.unwrap_or(20).to_string());

        if let Some((field, order)) = options.sort {
            request = request
                .query("sortBy", field.as_str())
                .query("sortOrder", order.as_str());
        }
        if let Some(project_id) = &options.project_id {
            request = request.query("projectId", project_id);
        }
        request = request.query("publicOnly", if public_only { "true" } else { "false" });

        request
            .bearer_opt(token.as_deref())
            .execute::<SearchResponse>()
            .await
    }

    /// Change a sequence's visibility
    pub async fn set_access(&self, gs_id: &str, access: AccessLevel) -> Result<(), Error> {
        Fetch::patch(&self.http, &self.url(&format!("/sequences/{}/access", gs_id)))
            .bearer_opt(self.token.get().as_deref())
            .json(&json!({ "access_level": access }))?
            .execute_empty()
            .await?;

        self.cache.invalidate_sequence(gs_id);
        Ok(())
    }

    /// Grant a project access to a sequence
    pub async fn grant_project_access(&self, gs_id: &str, project_id: &str) -> Result<(), Error> {
        Fetch::post(
            &self.http,
            &self.url(&format!("/sequences/{}/project-access", gs_id)),
        )
        .bearer_opt(self.token.get().as_deref())
        .json(&json!({ "project_id": project_id }))?
        .execute_empty()
        .await?;

        self.cache.invalidate_sequence(gs_id);
        Ok(())
    }

    /// Revoke a project's access to a sequence
    pub async fn revoke_project_access(&self, gs_id: &str, project_id: &str) -> Result<(), Error> {
        Fetch::delete(
            &self.http,
            &self.url(&format!("/sequences/{}/project-access/{}", gs_id, project_id)),
        )
        .bearer_opt(self.token.get().as_deref())
        .execute_empty()
        .await?;

        self.cache.invalidate_sequence(gs_id);
        Ok(())
    }
}
