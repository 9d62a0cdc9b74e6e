use serde::{Deserialize, Serialize};

use crate::model::comment::{Comment, NewComment};
use crate::model::id::Id;
use crate::model::project::{NewProject, Project};
use crate::model::task::{NewTask, Task, TaskStatus};
use crate::model::user::{NewUser, User};

/// Error returned by every backend call
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-2xx response; `message` is what the backend said, if anything
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
    #[error("not logged in (run `clb login`)")]
    NotAuthenticated,
}

impl ApiError {
    /// Build a backend error, using the generic HTTP message when the body
    /// carried none.
    pub fn backend(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {}", status));
        ApiError::Backend { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Request/response operations offered by the project-management backend.
///
/// Calls are synchronous and run to completion; callers mutate local state
/// only after a call has returned `Ok`.
pub trait Backend {
    // --- Auth & users ---
    fn register(&self, user: &NewUser) -> Result<(), ApiError>;
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;
    fn current_user(&self) -> Result<User, ApiError>;
    fn get_user(&self, user_id: &Id) -> Result<User, ApiError>;
    fn list_users(&self) -> Result<Vec<User>, ApiError>;

    // --- Projects ---
    fn my_projects(&self) -> Result<Vec<Project>, ApiError>;
    fn get_project(&self, project_id: &Id) -> Result<Project, ApiError>;
    fn project_ids_for_user(&self, user_id: &Id) -> Result<Vec<Id>, ApiError>;
    fn create_project(&self, project: &NewProject) -> Result<Project, ApiError>;
    fn add_member(&self, project_id: &Id, user_id: &Id) -> Result<(), ApiError>;
    fn remove_member(&self, project_id: &Id, user_id: &Id) -> Result<(), ApiError>;

    // --- Tasks ---
    fn list_tasks(&self, project_id: &Id) -> Result<Vec<Task>, ApiError>;
    fn create_task(&self, task: &NewTask) -> Result<Task, ApiError>;
    fn update_task_status(&self, task_id: &Id, status: TaskStatus) -> Result<Task, ApiError>;
    fn assign_task(&self, task_id: &Id, user_id: &Id) -> Result<Task, ApiError>;
    fn unassign_task(&self, task_id: &Id) -> Result<Task, ApiError>;
    fn delete_task(&self, task_id: &Id) -> Result<(), ApiError>;

    // --- Comments ---
    fn list_comments(&self, project_id: &Id) -> Result<Vec<Comment>, ApiError>;
    fn create_comment(&self, project_id: &Id, comment: &NewComment) -> Result<Comment, ApiError>;
}
