use crate::io::api::{ApiError, Backend};
use crate::model::id::Id;
use crate::model::project::{NewProject, Project};
use crate::model::user::User;

/// Error type for project edits
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("project name is required")]
    EmptyTitle,
    #[error(transparent)]
    Backend(#[from] ApiError),
}

/// People a task can be assigned to: the lead first, then members, each
/// listed once.
pub fn available_assignees(project: &Project) -> Vec<User> {
    let mut out: Vec<User> = Vec::new();
    let lead = project
        .lead
        .clone()
        .or_else(|| project.lead_id.clone().map(User::new));
    for user in lead.into_iter().chain(project.members.iter().cloned()) {
        if !out.iter().any(|u| u.id == user.id) {
            out.push(user);
        }
    }
    out
}

pub fn is_member(project: &Project, user_id: &Id) -> bool {
    project.lead_id() == Some(user_id) || project.members.iter().any(|m| &m.id == user_id)
}

/// Build a create-project request. Blank descriptions are left out and
/// member ids are de-duplicated.
pub fn validate_new_project(
    title: &str,
    description: Option<&str>,
    member_ids: &[Id],
) -> Result<NewProject, ProjectError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ProjectError::EmptyTitle);
    }
    let mut members: Vec<Id> = Vec::with_capacity(member_ids.len());
    for id in member_ids {
        if !members.contains(id) {
            members.push(id.clone());
        }
    }
    Ok(NewProject {
        title: title.to_string(),
        description: description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        member_ids: members,
    })
}

pub fn create_project<B: Backend + ?Sized>(
    backend: &B,
    title: &str,
    description: Option<&str>,
    member_ids: &[Id],
) -> Result<Project, ProjectError> {
    let request = validate_new_project(title, description, member_ids)?;
    let project = backend.create_project(&request)?;
    tracing::debug!(project = %project.id, "project created");
    Ok(project)
}
