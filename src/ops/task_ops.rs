use crate::io::api::{ApiError, Backend};
use crate::model::id::Id;
use crate::model::task::{NO_DESCRIPTION, NewTask, Priority, Task, TaskStatus};

/// Why a status change did not happen
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("task is already {0}")]
    Unchanged(TaskStatus),
    #[error("task has no assignee, so nobody can move it")]
    Unassigned,
    #[error("only the task assignee can move tasks")]
    NotAssignee { assignee: Id, actor: Id },
    #[error("failed to update task status: {0}")]
    Backend(#[from] ApiError),
}

impl TransitionError {
    /// Rejected before any request was made
    pub fn is_refusal(&self) -> bool {
        !matches!(self, TransitionError::Backend(_))
    }
}

/// Error type for task create/assign/delete
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(Id),
    #[error("task name is required")]
    EmptyTitle,
    #[error("user {0} is not on this project's team")]
    NotMember(Id),
    #[error(transparent)]
    Backend(#[from] ApiError),
}

// ---------------------------------------------------------------------------
// State transitions
// ---------------------------------------------------------------------------

/// Validate a drag from `task.status` to `new_status` by `actor`.
///
/// Moving to the current status is always `Unchanged`, whoever asks. Any
/// other move is allowed only for the task's assignee.
pub fn check_transition(task: &Task, new_status: TaskStatus, actor: &Id) -> Result<(), TransitionError> {
    if task.status == new_status {
        return Err(TransitionError::Unchanged(new_status));
    }
    match &task.assignee_id {
        None => Err(TransitionError::Unassigned),
        Some(assignee) if assignee != actor => Err(TransitionError::NotAssignee {
            assignee: assignee.clone(),
            actor: actor.clone(),
        }),
        Some(_) => Ok(()),
    }
}

/// Move `task` to `new_status` on behalf of `actor`.
///
/// The backend is updated first; the returned copy carries the new status
/// only once the backend has acknowledged it. `task` itself is never
/// modified, so on any error the caller's state is exactly as before.
pub fn request_transition<B: Backend + ?Sized>(
    backend: &B,
    task: &Task,
    new_status: TaskStatus,
    actor: &Id,
) -> Result<Task, TransitionError> {
    check_transition(task, new_status, actor)?;

    if let Err(e) = backend.update_task_status(&task.id, new_status) {
        tracing::warn!(task = %task.id, to = new_status.wire(), error = %e, "status update failed");
        return Err(e.into());
    }

    let mut updated = task.clone();
    updated.status = new_status;
    tracing::debug!(task = %task.id, from = task.status.wire(), to = new_status.wire(), "task moved");
    Ok(updated)
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Change who a task is assigned to. `None` unassigns; assigning the current
/// assignee again is a no-op that makes no request.
pub fn reassign<B: Backend + ?Sized>(
    backend: &B,
    task: &Task,
    assignee: Option<&Id>,
) -> Result<Task, TaskError> {
    let mut updated = task.clone();
    match assignee {
        None => {
            backend.unassign_task(&task.id)?;
            updated.assignee_id = None;
            updated.assignee = None;
        }
        Some(id) if task.assignee_id.as_ref() == Some(id) => {}
        Some(id) => {
            backend.assign_task(&task.id, id)?;
            updated.assignee_id = Some(id.clone());
            updated.assignee = None;
        }
    }
    Ok(updated)
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Fields of the add-task form
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: Option<Priority>,
    pub assignee_id: Option<Id>,
    pub due_date: Option<String>,
}

/// Turn the form into a create request. New tasks always start in `ToDo`.
pub fn validate_new_task(form: &TaskForm, project_id: &Id) -> Result<NewTask, TaskError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(TaskError::EmptyTitle);
    }
    let description = match form.description.trim() {
        "" => NO_DESCRIPTION.to_string(),
        d => d.to_string(),
    };
    Ok(NewTask {
        title: title.to_string(),
        description,
        project_id: project_id.clone(),
        priority: form.priority.unwrap_or_default(),
        status: TaskStatus::ToDo,
        assignee_id: form.assignee_id.clone(),
        due_date: form.due_date.clone().filter(|d| !d.trim().is_empty()),
    })
}

pub fn find_task<'a>(tasks: &'a [Task], task_id: &Id) -> Option<&'a Task> {
    tasks.iter().find(|t| &t.id == task_id)
}

pub fn find_task_mut<'a>(tasks: &'a mut [Task], task_id: &Id) -> Option<&'a mut Task> {
    tasks.iter_mut().find(|t| &t.id == task_id)
}
