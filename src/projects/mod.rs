//! Projects API: listing, active-project selection, CRUD, and membership
//!
//! Every successful mutation synchronously invalidates the cache keys whose
//! scope it touched, so the next read bypasses the staleness window.
//! Operations on the active project additionally keep the project store and
//! the persisted `activeProject` entry in step.

mod types;

use std::sync::Arc;

use log::warn;
use reqwest::Client;
use serde_json::{json, Value};

use crate::cache::{cached_get_json, QueryCache, QueryKey};
use crate::error::Error;
use crate::fetch::Fetch;
use crate::storage::{ClientStorage, ACTIVE_PROJECT_KEY};
use crate::store::ProjectStore;

pub use types::{MemberRole, Project, ProjectMember, ProjectRole, ProjectRoleData};
use types::{ActiveProjectResponse, ChangeRoleRequest, ProjectInviteRequest, SetActiveProjectRequest};

/// Client for project and membership operations
#[derive(Clone)]
pub struct ProjectsClient {
    base_url: String,
    http: Client,
    token: crate::auth::TokenCell,
    cache: QueryCache,
    store: ProjectStore,
    storage: Arc<dyn ClientStorage>,
}

impl ProjectsClient {
    pub(crate) fn new(
        base_url: &str,
        http: Client,
        token: crate::auth::TokenCell,
        cache: QueryCache,
        store: ProjectStore,
        storage: Arc<dyn ClientStorage>,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            http,
            token,
            cache,
            store,
            storage,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Option<String> {
        self.token.get()
    }

    /// The signed-in user's projects, through the cache
    pub async fn list(&self) -> Result<Vec<Project>, Error> {
        let value = cached_get_json(
            &self.cache,
            &self.http,
            &self.token,
            QueryKey::Projects,
            self.url("/projects"),
        )
        .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// The active project, through the cache
    pub async fn get_active(&self) -> Result<Option<Project>, Error> {
        let http = self.http.clone();
        let token = self.token.clone();
        let url = self.url("/projects/getActiveProject");
        let value = self
            .cache
            .get_or_fetch(QueryKey::ActiveProject, move || {
                let http = http.clone();
                let token = token.clone();
                let url = url.clone();
                async move {
                    let response = Fetch::get(&http, &url)
                        .bearer_opt(token.get().as_deref())
                        .execute::<ActiveProjectResponse>()
                        .await?;
                    // Cache the unwrapped project so primed writes and
                    // fetched values share one shape.
                    Ok(serde_json::to_value(response.active_project)?)
                }
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Make `project` the active project.
    ///
    /// On success the store, the persisted `activeProject` entry, and the
    /// active-project cache key are all updated before this returns.
    pub async fn set_active(&self, project: &Project) -> Result<(), Error> {
        let body = SetActiveProjectRequest {
            project_id: project.id.clone(),
        };
        Fetch::post(&self.http, &self.url("/projects/setActiveProject"))
            .bearer_opt(self.bearer().as_deref())
            .json(&body)?
            .execute_empty()
            .await?;

        self.apply_active(Some(project.clone()))?;
        Ok(())
    }

    /// Create a project
    pub async fn create(&self, name: &str) -> Result<Project, Error> {
        let project = Fetch::post(&self.http, &self.url("/projects"))
            .bearer_opt(self.bearer().as_deref())
            .json(&json!({ "name": name }))?
            .execute::<Project>()
            .await?;

        self.cache.invalidate(&QueryKey::Projects);
        Ok(project)
    }

    /// Rename a project
    pub async fn rename(&self, project_id: &str, name: &str) -> Result<Project, Error> {
        let updated = Fetch::put(&self.http, &self.url(&format!("/projects/{}", project_id)))
            .bearer_opt(self.bearer().as_deref())
            .json(&json!({ "name": name }))?
            .execute::<Project>()
            .await?;

        self.cache.invalidate(&QueryKey::Projects);
        if self.store.active_project().map(|p| p.id) == Some(updated.id.clone()) {
            self.apply_active(Some(updated.clone()))?;
        }
        Ok(updated)
    }

    /// Delete a project.
    ///
    /// The default project is refused client-side. When the deleted project
    /// was active, the server-reported replacement becomes the new active
    /// project, or the selection is cleared if none exists.
    pub async fn delete(&self, project: &Project) -> Result<(), Error> {
        if project.is_default {
            return Err(Error::DefaultProjectImmutable);
        }

        Fetch::delete(&self.http, &self.url(&format!("/projects/{}", project.id)))
            .bearer_opt(self.bearer().as_deref())
            .execute_empty()
            .await?;

        self.cache.invalidate(&QueryKey::Projects);
        self.cache.invalidate(&QueryKey::ActiveProject);
        self.cache.invalidate_project_scope(&project.id);

        if self.store.active_project().map(|p| p.id) == Some(project.id.clone()) {
            self.reassign_active().await;
        }
        Ok(())
    }

    /// Members of a project, through the cache
    pub async fn members(&self, project_id: &str) -> Result<Vec<ProjectMember>, Error> {
        let value = cached_get_json(
            &self.cache,
            &self.http,
            &self.token,
            QueryKey::ProjectMembers(project_id.to_string()),
            self.url(&format!("/projects/{}/members", project_id)),
        )
        .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Invite a user to a project by email
    pub async fn invite(
        &self,
        project_id: &str,
        user_email: &str,
        role: MemberRole,
    ) -> Result<(), Error> {
        let body = ProjectInviteRequest {
            project_id: project_id.to_string(),
            user_email: user_email.to_string(),
            role,
        };
        Fetch::post(&self.http, &self.url("/projects/invite"))
            .bearer_opt(self.bearer().as_deref())
            .json(&body)?
            .execute_empty()
            .await?;

        self.cache
            .invalidate(&QueryKey::ProjectMembers(project_id.to_string()));
        Ok(())
    }

    /// Remove a member from a project
    pub async fn remove_member(&self, project_id: &str, member_id: &str) -> Result<(), Error> {
        let url = self.url(&format!(
            "/projects/{}/members/{}/remove",
            project_id, member_id
        ));
        Fetch::post(&self.http, &url)
            .bearer_opt(self.bearer().as_deref())
            .json(&json!({}))?
            .execute_empty()
            .await?;

        self.cache
            .invalidate(&QueryKey::ProjectMembers(project_id.to_string()));
        Ok(())
    }

    /// Change a member's role
    pub async fn change_role(
        &self,
        project_id: &str,
        member_id: &str,
        new_role: MemberRole,
    ) -> Result<(), Error> {
        let url = self.url(&format!(
            "/projects/{}/members/{}/changeRole",
            project_id, member_id
        ));
        Fetch::post(&self.http, &url)
            .bearer_opt(self.bearer().as_deref())
            .json(&ChangeRoleRequest { new_role })?
            .execute_empty()
            .await?;

        self.cache
            .invalidate(&QueryKey::ProjectMembers(project_id.to_string()));
        Ok(())
    }

    /// The signed-in user's role within a project, through the cache
    pub async fn user_role(&self, project_id: &str) -> Result<ProjectRoleData, Error> {
        let value = cached_get_json(
            &self.cache,
            &self.http,
            &self.token,
            QueryKey::UserRole(project_id.to_string()),
            self.url(&format!("/projects/user-role/{}", project_id)),
        )
        .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Leave a project.
    ///
    /// A sole owner leaving a non-default project is rejected by the server
    /// with a structured error; that error is surfaced verbatim rather than
    /// second-guessed here.
    pub async fn leave(&self, project_id: &str) -> Result<(), Error> {
        Fetch::post(&self.http, &self.url(&format!("/projects/leave/{}", project_id)))
            .bearer_opt(self.bearer().as_deref())
            .json(&json!({}))?
            .execute_empty()
            .await?;

        self.cache.invalidate(&QueryKey::Projects);
        self.cache.invalidate(&QueryKey::ActiveProject);
        self.cache.invalidate_project_scope(project_id);

        if self.store.active_project().map(|p| p.id) == Some(project_id.to_string()) {
            self.reassign_active().await;
        }
        Ok(())
    }

    /// Bearer GET of the project list, bypassing the cache; the session
    /// synchronizer uses this for its startup fetch.
    pub(crate) async fn fetch_projects_raw(&self) -> Result<Vec<Project>, Error> {
        Fetch::get(&self.http, &self.url("/projects"))
            .bearer_opt(self.bearer().as_deref())
            .execute::<Vec<Project>>()
            .await
    }

    /// Bearer GET of the active project, bypassing the cache
    pub(crate) async fn fetch_active_raw(&self) -> Result<Option<Project>, Error> {
        let response = Fetch::get(&self.http, &self.url("/projects/getActiveProject"))
            .bearer_opt(self.bearer().as_deref())
            .execute::<ActiveProjectResponse>()
            .await?;
        Ok(response.active_project)
    }

    /// Write a new active-project selection to store, storage and cache
    fn apply_active(&self, project: Option<Project>) -> Result<(), Error> {
        match project {
            Some(project) => {
                self.storage
                    .set(ACTIVE_PROJECT_KEY, &serde_json::to_string(&project)?);
                self.cache
                    .prime(QueryKey::ActiveProject, serde_json::to_value(&project)?);
                self.store.set_active_project(Some(project));
            }
            None => {
                self.storage.remove(ACTIVE_PROJECT_KEY);
                self.cache.prime(QueryKey::ActiveProject, Value::Null);
                self.store.set_active_project(None);
            }
        }
        Ok(())
    }

    /// After the active project was deleted or left, adopt the
    /// server-reported replacement, or clear the selection when the server
    /// reports none (or cannot be reached).
    async fn reassign_active(&self) {
        match self.fetch_active_raw().await {
            Ok(replacement) => {
                if let Err(err) = self.apply_active(replacement) {
                    warn!("failed to apply reassigned active project: {}", err);
                }
            }
            Err(err) => {
                warn!("failed to fetch replacement active project: {}", err);
                let _ = self.apply_active(None);
            }
        }
    }
}
