use std::cell::{Cell, RefCell};

use crate::io::api::{ApiError, Backend, Credentials, LoginResponse};
use crate::model::comment::{Comment, NewComment};
use crate::model::id::Id;
use crate::model::project::{NewProject, Project};
use crate::model::task::{NewTask, Task, TaskStatus};
use crate::model::user::{NewUser, User};

/// In-process `Backend` holding everything in memory.
///
/// Records every call by name so callers can check which requests were (or
/// were not) issued, and can be told to fail the next call (or the next call
/// of a given name).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    pub current_user: RefCell<Option<User>>,
    pub users: RefCell<Vec<User>>,
    pub projects: RefCell<Vec<Project>>,
    pub tasks: RefCell<Vec<Task>>,
    /// `(project_id, comment)` in creation order
    pub comments: RefCell<Vec<(Id, Comment)>>,
    calls: RefCell<Vec<String>>,
    fail_next: RefCell<Option<ApiError>>,
    fail_on: RefCell<Option<(String, ApiError)>>,
    next_id: Cell<i64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            next_id: Cell::new(1000),
            ..Default::default()
        }
    }

    pub fn with_current_user(self, user: User) -> Self {
        self.users.borrow_mut().push(user.clone());
        *self.current_user.borrow_mut() = Some(user);
        self
    }

    pub fn with_user(self, user: User) -> Self {
        self.users.borrow_mut().push(user);
        self
    }

    pub fn with_project(self, project: Project) -> Self {
        self.projects.borrow_mut().push(project);
        self
    }

    pub fn with_task(self, project_id: impl Into<Id>, mut task: Task) -> Self {
        task.project_id = Some(project_id.into());
        self.tasks.borrow_mut().push(task);
        self
    }

    pub fn with_comment(self, project_id: impl Into<Id>, comment: Comment) -> Self {
        self.comments.borrow_mut().push((project_id.into(), comment));
        self
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: ApiError) {
        *self.fail_next.borrow_mut() = Some(error);
    }

    /// Make the next `call` (e.g. `"list_comments"`) fail with `error`
    pub fn fail_on(&self, call: &str, error: ApiError) {
        *self.fail_on.borrow_mut() = Some((call.to_string(), error));
    }

    /// Names of the calls made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn task(&self, task_id: &Id) -> Option<Task> {
        self.tasks.borrow().iter().find(|t| &t.id == task_id).cloned()
    }

    fn enter(&self, name: &str) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(name.to_string());
        if let Some(err) = self.fail_next.borrow_mut().take() {
            return Err(err);
        }
        let mut fail_on = self.fail_on.borrow_mut();
        if fail_on.as_ref().is_some_and(|(call, _)| call == name)
            && let Some((_, err)) = fail_on.take()
        {
            return Err(err);
        }
        Ok(())
    }

    fn fresh_id(&self) -> Id {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Id::from(id)
    }

    fn not_found(what: &str, id: &Id) -> ApiError {
        ApiError::backend(404, Some(format!("{} {} not found", what, id)))
    }

    fn update_task(&self, task_id: &Id, f: impl FnOnce(&mut Task)) -> Result<Task, ApiError> {
        let mut tasks = self.tasks.borrow_mut();
        let task = tasks
            .iter_mut()
            .find(|t| &t.id == task_id)
            .ok_or_else(|| Self::not_found("task", task_id))?;
        f(task);
        Ok(task.clone())
    }
}

impl Backend for MemoryBackend {
    fn register(&self, user: &NewUser) -> Result<(), ApiError> {
        self.enter("register")?;
        let mut users = self.users.borrow_mut();
        if users.iter().any(|u| u.email.as_deref() == Some(user.email.as_str())) {
            return Err(ApiError::backend(409, Some("Email is already registered".into())));
        }
        let mut created = User::new(self.fresh_id());
        created.firstname = Some(user.firstname.clone());
        created.lastname = Some(user.lastname.clone());
        created.email = Some(user.email.clone());
        users.push(created);
        Ok(())
    }

    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.enter("login")?;
        let known = self
            .users
            .borrow()
            .iter()
            .any(|u| u.email.as_deref() == Some(credentials.email.as_str()));
        if !known {
            return Err(ApiError::backend(401, Some("Invalid credentials".into())));
        }
        Ok(LoginResponse {
            token: Some(format!("memory-token-{}", credentials.email)),
        })
    }

    fn current_user(&self) -> Result<User, ApiError> {
        self.enter("current_user")?;
        self.current_user.borrow().clone().ok_or(ApiError::NotAuthenticated)
    }

    fn get_user(&self, user_id: &Id) -> Result<User, ApiError> {
        self.enter("get_user")?;
        self.users
            .borrow()
            .iter()
            .find(|u| &u.id == user_id)
            .cloned()
            .ok_or_else(|| Self::not_found("user", user_id))
    }

    fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.enter("list_users")?;
        Ok(self.users.borrow().clone())
    }

    fn my_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.enter("my_projects")?;
        let me = self.current_user.borrow().clone().ok_or(ApiError::NotAuthenticated)?;
        Ok(self
            .projects
            .borrow()
            .iter()
            .filter(|p| p.lead_id() == Some(&me.id) || p.members.iter().any(|m| m.id == me.id))
            .cloned()
            .collect())
    }

    fn get_project(&self, project_id: &Id) -> Result<Project, ApiError> {
        self.enter("get_project")?;
        self.projects
            .borrow()
            .iter()
            .find(|p| &p.id == project_id)
            .cloned()
            .ok_or_else(|| Self::not_found("project", project_id))
    }

    fn project_ids_for_user(&self, user_id: &Id) -> Result<Vec<Id>, ApiError> {
        self.enter("project_ids_for_user")?;
        Ok(self
            .projects
            .borrow()
            .iter()
            .filter(|p| p.lead_id() == Some(user_id) || p.members.iter().any(|m| &m.id == user_id))
            .map(|p| p.id.clone())
            .collect())
    }

    fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        self.enter("create_project")?;
        let users = self.users.borrow();
        let mut created = Project::new(self.fresh_id(), project.title.clone());
        created.description = project.description.clone();
        created.lead_id = self.current_user.borrow().as_ref().map(|u| u.id.clone());
        created.members = users
            .iter()
            .filter(|u| project.member_ids.contains(&u.id))
            .cloned()
            .collect();
        self.projects.borrow_mut().push(created.clone());
        Ok(created)
    }

    fn add_member(&self, project_id: &Id, user_id: &Id) -> Result<(), ApiError> {
        self.enter("add_member")?;
        let user = self
            .users
            .borrow()
            .iter()
            .find(|u| &u.id == user_id)
            .cloned()
            .ok_or_else(|| Self::not_found("user", user_id))?;
        let mut projects = self.projects.borrow_mut();
        let project = projects
            .iter_mut()
            .find(|p| &p.id == project_id)
            .ok_or_else(|| Self::not_found("project", project_id))?;
        if !project.members.iter().any(|m| &m.id == user_id) {
            project.members.push(user);
        }
        Ok(())
    }

    fn remove_member(&self, project_id: &Id, user_id: &Id) -> Result<(), ApiError> {
        self.enter("remove_member")?;
        let mut projects = self.projects.borrow_mut();
        let project = projects
            .iter_mut()
            .find(|p| &p.id == project_id)
            .ok_or_else(|| Self::not_found("project", project_id))?;
        project.members.retain(|m| &m.id != user_id);
        Ok(())
    }

    fn list_tasks(&self, project_id: &Id) -> Result<Vec<Task>, ApiError> {
        self.enter("list_tasks")?;
        Ok(self
            .tasks
            .borrow()
            .iter()
            .filter(|t| t.project_id.as_ref() == Some(project_id))
            .cloned()
            .collect())
    }

    fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        self.enter("create_task")?;
        let mut created = Task::new(self.fresh_id(), task.title.clone());
        created.description = Some(task.description.clone());
        created.project_id = Some(task.project_id.clone());
        created.priority = task.priority;
        created.status = task.status;
        created.assignee_id = task.assignee_id.clone();
        created.due_date = task.due_date.clone();
        self.tasks.borrow_mut().push(created.clone());
        Ok(created)
    }

    fn update_task_status(&self, task_id: &Id, status: TaskStatus) -> Result<Task, ApiError> {
        self.enter("update_task_status")?;
        self.update_task(task_id, |t| t.status = status)
    }

    fn assign_task(&self, task_id: &Id, user_id: &Id) -> Result<Task, ApiError> {
        self.enter("assign_task")?;
        self.update_task(task_id, |t| t.assignee_id = Some(user_id.clone()))
    }

    fn unassign_task(&self, task_id: &Id) -> Result<Task, ApiError> {
        self.enter("unassign_task")?;
        self.update_task(task_id, |t| t.assignee_id = None)
    }

    fn delete_task(&self, task_id: &Id) -> Result<(), ApiError> {
        self.enter("delete_task")?;
        let mut tasks = self.tasks.borrow_mut();
        let before = tasks.len();
        tasks.retain(|t| &t.id != task_id);
        if tasks.len() == before {
            return Err(Self::not_found("task", task_id));
        }
        Ok(())
    }

    fn list_comments(&self, project_id: &Id) -> Result<Vec<Comment>, ApiError> {
        self.enter("list_comments")?;
        Ok(self
            .comments
            .borrow()
            .iter()
            .filter(|(pid, _)| pid == project_id)
            .map(|(_, c)| c.clone())
            .collect())
    }

    fn create_comment(&self, project_id: &Id, comment: &NewComment) -> Result<Comment, ApiError> {
        self.enter("create_comment")?;
        let mut created = Comment::new(self.fresh_id(), comment.author_id.clone(), comment.content.clone());
        created.parent_comment_id = comment.parent_comment_id.clone();
        self.comments
            .borrow_mut()
            .push((project_id.clone(), created.clone()));
        Ok(created)
    }
}
