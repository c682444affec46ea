//! Wire types for projects and project membership

use std::fmt;

use serde::{Deserialize, Serialize};

/// A project grouping sequences and members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// The server-provisioned default project; always present, never deletable
    pub is_default: bool,
    /// The signed-in user's role within this project
    pub role: ProjectRole,
}

/// Roles a member can be invited with or changed to.
///
/// `owner` is deliberately absent: ownership is never assigned through the
/// invite or role-change operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Contributor,
    Observer,
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemberRole::Admin => "admin",
            MemberRole::Contributor => "contributor",
            MemberRole::Observer => "observer",
        };
        write!(f, "{}", name)
    }
}

/// All roles a project member can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Owner,
    Admin,
    Contributor,
    Observer,
}

/// One member of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: ProjectRole,
    pub joined_at: String,
}

/// The signed-in user's role within a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRoleData {
    pub role: ProjectRole,
    pub joined_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetActiveProjectRequest {
    pub project_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveProjectResponse {
    #[serde(rename = "activeProject")]
    pub active_project: Option<Project>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectInviteRequest {
    pub project_id: String,
    pub user_email: String,
    pub role: MemberRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChangeRoleRequest {
    pub new_role: MemberRole,
}
