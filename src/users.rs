//! User profile operations

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::auth::TokenCell;
use crate::cache::{cached_get_json, QueryCache, QueryKey};
use crate::error::Error;
use crate::fetch::Fetch;
use crate::storage::{self, ClientStorage};

/// Account tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Core,
    Manufacturer,
    Customer,
}

/// The signed-in user's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub auth0_id: String,
    pub name: String,
    pub email: String,
    pub picture: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub active_project_id: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

/// A picture upload for the profile update form
#[derive(Debug, Clone)]
pub struct PictureUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Client for the signed-in user's profile
#[derive(Clone)]
pub struct UsersClient {
    base_url: String,
    http: Client,
    token: TokenCell,
    cache: QueryCache,
    storage: Arc<dyn ClientStorage>,
}

impl UsersClient {
    pub(crate) fn new(
        base_url: &str,
        http: Client,
        token: TokenCell,
        cache: QueryCache,
        storage: Arc<dyn ClientStorage>,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            http,
            token,
            cache,
            storage,
        }
    }

    /// The signed-in user's profile, through the cache
    pub async fn current(&self) -> Result<User, Error> {
        let value = cached_get_json(
            &self.cache,
            &self.http,
            &self.token,
            QueryKey::CurrentUser,
            format!("{}/user", self.base_url),
        )
        .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Update the profile name and, optionally, the picture.
    ///
    /// Sent as a multipart form with `name` and `picture` parts. On success
    /// the profile cache is invalidated and the returned picture URL is
    /// cached for an hour under the user's id.
    pub async fn update(&self, name: &str, picture: Option<PictureUpload>) -> Result<User, Error> {
        let mut form = Form::new().text("name", name.to_string());
        if let Some(picture) = picture {
            let part = Part::bytes(picture.bytes)
                .file_name(picture.file_name)
                .mime_str(&picture.mime_type)?;
            form = form.part("picture", part);
        }

        let user = Fetch::put(&self.http, &format!("{}/user", self.base_url))
            .bearer_opt(self.token.get().as_deref())
            .multipart(form)
            .execute::<User>()
            .await?;

        self.cache.invalidate(&QueryKey::CurrentUser);
        storage::cache_profile_picture(self.storage.as_ref(), &user.auth0_id, &user.picture);
        Ok(user)
    }

    /// The user's profile picture URL, served from the one-hour cache when
    /// possible
    pub async fn profile_picture(&self, user_id: &str) -> Result<String, Error> {
        if let Some(url) = storage::cached_profile_picture(self.storage.as_ref(), user_id) {
            return Ok(url);
        }

        let user = self.fetch_current_uncached().await?;
        storage::cache_profile_picture(self.storage.as_ref(), user_id, &user.picture);
        Ok(user.picture)
    }

    async fn fetch_current_uncached(&self) -> Result<User, Error> {
        Fetch::get(&self.http, &format!("{}/user", self.base_url))
            .bearer_opt(self.token.get().as_deref())
            .execute::<User>()
            .await
    }
}
