//! Project selection store
//!
//! Single source of truth for the signed-in user's project list and active
//! project. The store is an explicit, injectable value (cloning it shares
//! the same underlying state) rather than process-global, so tests can
//! build isolated instances. Writers perform unconditional overwrites;
//! readers either take a snapshot or subscribe for change notifications.

use std::sync::Arc;

use tokio::sync::watch;

use crate::projects::Project;

/// Whether the project list has been loaded yet.
///
/// `Loaded(vec![])` means the user genuinely has zero projects, which is a
/// different situation from "nothing fetched yet" and must render
/// differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectsState {
    Unloaded,
    Loaded(Vec<Project>),
}

impl ProjectsState {
    /// The loaded project list, if any.
    pub fn projects(&self) -> Option<&[Project]> {
        match self {
            ProjectsState::Unloaded => None,
            ProjectsState::Loaded(projects) => Some(projects),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ProjectsState::Loaded(_))
    }
}

/// Snapshot of the store's state
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub projects: ProjectsState,
    pub active_project: Option<Project>,
    pub is_loading: bool,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            projects: ProjectsState::Unloaded,
            active_project: None,
            is_loading: false,
        }
    }
}

/// Observable store for project selection state
#[derive(Debug, Clone)]
pub struct ProjectStore {
    tx: Arc<watch::Sender<StoreState>>,
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectStore {
    /// Create a store in the unloaded state
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StoreState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> StoreState {
        self.tx.borrow().clone()
    }

    /// The currently active project, if any
    pub fn active_project(&self) -> Option<Project> {
        self.tx.borrow().active_project.clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.tx.subscribe()
    }

    /// Overwrite the project list
    pub fn set_projects(&self, projects: Vec<Project>) {
        self.tx.send_modify(|state| {
            state.projects = ProjectsState::Loaded(projects);
        });
    }

    /// Overwrite the active project
    pub fn set_active_project(&self, project: Option<Project>) {
        self.tx.send_modify(|state| {
            state.active_project = project;
        });
    }

    /// Overwrite the loading flag
    pub fn set_is_loading(&self, value: bool) {
        self.tx.send_modify(|state| {
            state.is_loading = value;
        });
    }

    /// Apply both startup fetch results and clear the loading flag in a
    /// single write, so observers never see one half without the other.
    pub fn apply_session(&self, projects: Vec<Project>, active_project: Option<Project>) {
        self.tx.send_modify(|state| {
            state.projects = ProjectsState::Loaded(projects);
            state.active_project = active_project;
            state.is_loading = false;
        });
    }

    /// Reset to the signed-out state
    pub fn reset(&self) {
        self.tx.send_modify(|state| {
            *state = StoreState::default();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::ProjectRole;

    fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: format!("project {}", id),
            is_default: false,
            role: ProjectRole::Owner,
        }
    }

    #[test]
    fn starts_unloaded() {
        let store = ProjectStore::new();
        let state = store.state();
        assert_eq!(state.projects, ProjectsState::Unloaded);
        assert!(state.active_project.is_none());
        assert!(!state.is_loading);
    }

    #[test]
    fn empty_list_is_distinct_from_unloaded() {
        let store = ProjectStore::new();
        store.set_projects(Vec::new());
        let state = store.state();
        assert!(state.projects.is_loaded());
        assert_eq!(state.projects.projects(), Some(&[][..]));
    }

    #[test]
    fn apply_session_is_atomic() {
        let store = ProjectStore::new();
        let mut rx = store.subscribe();
        store.set_is_loading(true);

        let p1 = project("p1");
        store.apply_session(vec![p1.clone()], Some(p1.clone()));

        // A single notification carries the fully-applied state.
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.projects, ProjectsState::Loaded(vec![p1.clone()]));
        assert_eq!(state.active_project, Some(p1));
        assert!(!state.is_loading);
    }

    #[test]
    fn clones_share_state() {
        let store = ProjectStore::new();
        let handle = store.clone();
        handle.set_active_project(Some(project("p2")));
        assert_eq!(store.active_project().map(|p| p.id), Some("p2".to_string()));
    }

    #[test]
    fn reset_returns_to_signed_out_state() {
        let store = ProjectStore::new();
        store.apply_session(vec![project("p1")], Some(project("p1")));
        store.reset();
        assert_eq!(store.state(), StoreState::default());
    }
}
