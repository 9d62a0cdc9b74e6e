use crate::io::api::{ApiError, Backend};
use crate::model::comment::{Comment, NewComment};
use crate::model::id::Id;
use crate::model::project::Project;
use crate::model::task::{Task, TaskStatus};
use crate::model::user::User;
use crate::ops::board::{Board, group_by_status};
use crate::ops::comment_tree::{self, CommentError};
use crate::ops::project_ops::{available_assignees, is_member};
use crate::ops::search::{TaskQuery, filter_tasks, with_status};
use crate::ops::task_ops::{
    TaskError, TaskForm, TransitionError, find_task, find_task_mut, reassign, request_transition,
    validate_new_task,
};
use crate::ops::users::UserDirectory;

/// Error type for project screen actions
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Comment(#[from] CommentError),
}

/// Everything one project screen shows, owned by that screen.
///
/// `viewer` is the logged-in user: the author of new comments and the actor
/// for status changes. Backend calls always finish before local state is
/// touched, so a failed call leaves the view as it was.
#[derive(Debug)]
pub struct ProjectView {
    pub project: Project,
    pub tasks: Vec<Task>,
    /// Comment forest, rebuilt from the backend after every post
    pub comments: Vec<Comment>,
    pub users: UserDirectory,
    pub viewer: Id,
}

impl ProjectView {
    /// Fetch the project, its tasks, and its comments.
    pub fn load<B: Backend + ?Sized>(backend: &B, project_id: &Id, viewer: Id) -> Result<Self, ApiError> {
        let project = backend.get_project(project_id)?;
        let mut users = UserDirectory::new();
        for user in available_assignees(&project) {
            // A lead known only by id still needs a lookup
            if user.firstname.is_some() || user.full_name.is_some() || user.email.is_some() {
                users.insert(user);
            }
        }

        let mut view = ProjectView {
            project,
            tasks: Vec::new(),
            comments: Vec::new(),
            users,
            viewer,
        };
        view.refresh_tasks(backend)?;
        view.refresh_comments(backend)?;
        tracing::debug!(
            project = %view.project.id,
            tasks = view.tasks.len(),
            comments = comment_tree::count(&view.comments),
            "project loaded"
        );
        Ok(view)
    }

    pub fn refresh_tasks<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<(), ApiError> {
        let mut tasks = backend.list_tasks(&self.project.id)?;
        self.users.annotate_tasks(backend, &mut tasks);
        self.tasks = tasks;
        Ok(())
    }

    /// Replace the forest with a fresh build of the backend's batch. Local
    /// likes and edits are dropped.
    pub fn refresh_comments<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<(), ApiError> {
        let flat = backend.list_comments(&self.project.id)?;
        let mut forest = comment_tree::build_forest(flat);
        self.users.annotate_comments(backend, &mut forest);
        self.comments = forest;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Post a top-level comment as the viewer
    pub fn add_comment<B: Backend + ?Sized>(&mut self, backend: &B, text: &str) -> Result<Comment, ViewError> {
        self.post_comment(backend, text, None)
    }

    /// Post a reply as the viewer. A parent that has since disappeared
    /// leaves the reply at the top level.
    pub fn reply_to<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        parent_id: &Id,
        text: &str,
    ) -> Result<Comment, ViewError> {
        self.post_comment(backend, text, Some(parent_id.clone()))
    }

    fn post_comment<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        text: &str,
        parent_comment_id: Option<Id>,
    ) -> Result<Comment, ViewError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(CommentError::EmptyContent.into());
        }
        let request = NewComment {
            content: content.to_string(),
            author_id: self.viewer.clone(),
            parent_comment_id,
        };
        let created = backend.create_comment(&self.project.id, &request)?;
        // The comment exists now; a failed reload must not report otherwise
        if let Err(e) = self.refresh_comments(backend) {
            tracing::warn!(comment = %created.id, error = %e, "comment posted but reload failed");
            let mut local = created.clone();
            self.users.annotate_comments(backend, std::slice::from_mut(&mut local));
            let parent = local.parent_comment_id.clone();
            comment_tree::add_reply(&mut self.comments, parent.as_ref(), local);
        }
        Ok(created)
    }

    pub fn edit_comment(&mut self, comment_id: &Id, text: &str) -> Result<(), ViewError> {
        Ok(comment_tree::edit_comment(&mut self.comments, comment_id, text)?)
    }

    pub fn toggle_like(&mut self, comment_id: &Id) -> Result<u32, ViewError> {
        Ok(comment_tree::toggle_like(&mut self.comments, comment_id)?)
    }

    /// Hide a comment and its replies from this view. The backend keeps it,
    /// so the next refresh brings it back.
    pub fn remove_comment(&mut self, comment_id: &Id) -> Result<Comment, ViewError> {
        Ok(comment_tree::remove_comment(&mut self.comments, comment_id)?)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Move a task to another column on behalf of the viewer. The local copy
    /// changes only after the backend accepts the move.
    pub fn move_task<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        task_id: &Id,
        new_status: TaskStatus,
    ) -> Result<&Task, ViewError> {
        let task = find_task_mut(&mut self.tasks, task_id).ok_or_else(|| TaskError::NotFound(task_id.clone()))?;
        let updated = request_transition(backend, task, new_status, &self.viewer)?;
        *task = updated;
        Ok(&*task)
    }

    /// Assign a task to `assignee`, or unassign it with `None`. Only the
    /// lead and members can be assigned.
    pub fn reassign_task<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        task_id: &Id,
        assignee: Option<&Id>,
    ) -> Result<&Task, ViewError> {
        if let Some(id) = assignee
            && !is_member(&self.project, id)
        {
            return Err(TaskError::NotMember(id.clone()).into());
        }
        let task = find_task_mut(&mut self.tasks, task_id).ok_or_else(|| TaskError::NotFound(task_id.clone()))?;
        let updated = reassign(backend, task, assignee)?;
        *task = updated;
        self.users.annotate_tasks(backend, std::slice::from_mut(task));
        Ok(&*task)
    }

    /// Create a task from the add-task form, then reload the task list. If
    /// only the reload fails, the created task is appended locally.
    pub fn create_task<B: Backend + ?Sized>(&mut self, backend: &B, form: &TaskForm) -> Result<Task, ViewError> {
        let request = validate_new_task(form, &self.project.id)?;
        let created = backend.create_task(&request).map_err(TaskError::from)?;
        tracing::debug!(task = %created.id, project = %self.project.id, "task created");
        if let Err(e) = self.refresh_tasks(backend) {
            tracing::warn!(task = %created.id, error = %e, "task created but reload failed");
            let mut local = created.clone();
            self.users.annotate_tasks(backend, std::slice::from_mut(&mut local));
            self.tasks.push(local);
        }
        Ok(created)
    }

    pub fn delete_task<B: Backend + ?Sized>(&mut self, backend: &B, task_id: &Id) -> Result<Task, ViewError> {
        let pos = self
            .tasks
            .iter()
            .position(|t| &t.id == task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.clone()))?;
        backend.delete_task(task_id).map_err(TaskError::from)?;
        Ok(self.tasks.remove(pos))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn task(&self, task_id: &Id) -> Option<&Task> {
        find_task(&self.tasks, task_id)
    }

    pub fn board(&self) -> Board<'_> {
        group_by_status(&self.tasks)
    }

    /// Tasks matching the search box, optionally narrowed to one status
    pub fn filtered_tasks(&self, query: &TaskQuery, status: Option<TaskStatus>) -> Vec<&Task> {
        with_status(filter_tasks(&self.tasks, query), status)
    }

    pub fn assignees(&self) -> Vec<User> {
        available_assignees(&self.project)
    }

    /// Whether the viewer may drag `task` at all
    pub fn can_move(&self, task: &Task) -> bool {
        task.is_assigned_to(&self.viewer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::MemoryBackend;
    use crate::model::user::UNKNOWN_USER;
    use pretty_assertions::assert_eq;

    fn named(id: &str, first: &str) -> User {
        let mut u = User::new(id);
        u.firstname = Some(first.to_string());
        u
    }

    fn backend() -> MemoryBackend {
        let mut project = Project::new("P1", "Website");
        project.lead = Some(named("U1", "Ann"));
        project.members = vec![named("U2", "Bob")];
        MemoryBackend::new()
            .with_current_user(named("U1", "Ann"))
            .with_user(named("U2", "Bob"))
            .with_project(project)
            .with_task("P1", Task::new("T1", "Landing page").with_assignee("U1"))
            .with_task("P1", Task::new("T2", "Footer").with_assignee("U2"))
            .with_comment("P1", Comment::new("C1", "U1", "Kickoff"))
            .with_comment("P1", Comment::new("C2", "U2", "Sounds good").reply_to("C1"))
    }

    fn view(backend: &MemoryBackend, viewer: &str) -> ProjectView {
        ProjectView::load(backend, &Id::from("P1"), Id::from(viewer)).unwrap()
    }

    #[test]
    fn load_builds_forest_and_resolves_names() {
        let backend = backend();
        let view = view(&backend, "U1");
        assert_eq!(view.tasks.len(), 2);
        assert_eq!(view.comments.len(), 1);
        assert_eq!(view.comments[0].replies[0].author_display(), "Bob");
        assert_eq!(view.tasks[1].assignee.as_ref().unwrap().display_name(), "Bob");
        // Lead and members came with the project
        assert!(!backend.calls().iter().any(|c| c == "get_user"));
    }

    #[test]
    fn move_task_as_assignee_updates_locally() {
        let backend = backend();
        let mut view = view(&backend, "U1");
        let moved = view.move_task(&backend, &Id::from("T1"), TaskStatus::InProgress).unwrap();
        assert_eq!(moved.status, TaskStatus::InProgress);
        assert_eq!(view.board().column(TaskStatus::InProgress).tasks.len(), 1);
    }

    #[test]
    fn move_task_refused_for_non_assignee() {
        let backend = backend();
        let mut view = view(&backend, "U1");
        let before = backend.calls().len();
        let err = view.move_task(&backend, &Id::from("T2"), TaskStatus::Done).unwrap_err();
        assert_eq!(err.to_string(), "only the task assignee can move tasks");
        assert_eq!(view.task(&Id::from("T2")).unwrap().status, TaskStatus::ToDo);
        assert_eq!(backend.calls().len(), before);
        assert!(!view.can_move(view.task(&Id::from("T2")).unwrap()));
    }

    #[test]
    fn failed_move_keeps_old_status() {
        let backend = backend();
        let mut view = view(&backend, "U1");
        backend.fail_next(ApiError::backend(500, Some("boom".into())));
        assert!(view.move_task(&backend, &Id::from("T1"), TaskStatus::Done).is_err());
        assert_eq!(view.task(&Id::from("T1")).unwrap().status, TaskStatus::ToDo);
    }

    #[test]
    fn unknown_task_is_not_found() {
        let backend = backend();
        let mut view = view(&backend, "U1");
        let err = view.move_task(&backend, &Id::from("T9"), TaskStatus::Done).unwrap_err();
        assert!(matches!(err, ViewError::Task(TaskError::NotFound(_))));
    }

    #[test]
    fn reply_refetches_and_nests() {
        let backend = backend();
        let mut view = view(&backend, "U2");
        let created = view.reply_to(&backend, &Id::from("C2"), "  me too ").unwrap();
        assert_eq!(created.content, "me too");
        let reply = &view.comments[0].replies[0].replies[0];
        assert_eq!(reply.id, created.id);
        assert_eq!(reply.author_display(), "Bob");
        assert_eq!(backend.calls().last().map(String::as_str), Some("list_comments"));
    }

    #[test]
    fn posted_comment_survives_failed_reload() {
        let backend = backend();
        let mut view = view(&backend, "U2");
        backend.fail_on("list_comments", ApiError::backend(503, None));
        let created = view.reply_to(&backend, &Id::from("C1"), "hello").unwrap();

        assert_eq!(backend.comments.borrow().len(), 3);
        let reply = &view.comments[0].replies[1];
        assert_eq!(reply.id, created.id);
        assert_eq!(reply.author_display(), "Bob");

        // A later reload agrees with the local placement
        view.refresh_comments(&backend).unwrap();
        assert_eq!(view.comments[0].replies[1].id, created.id);
    }

    #[test]
    fn created_task_survives_failed_reload() {
        let backend = backend();
        let mut view = view(&backend, "U1");
        backend.fail_on("list_tasks", ApiError::backend(503, None));
        let form = TaskForm {
            title: "Copy review".into(),
            assignee_id: Some(Id::from("U2")),
            ..Default::default()
        };
        let created = view.create_task(&backend, &form).unwrap();
        assert_eq!(view.tasks.len(), 3);
        let local = view.task(&created.id).unwrap();
        assert_eq!(local.assignee.as_ref().unwrap().display_name(), "Bob");
        assert!(backend.task(&created.id).is_some());
    }

    #[test]
    fn blank_comment_is_rejected_without_request() {
        let backend = backend();
        let mut view = view(&backend, "U1");
        let before = backend.calls().len();
        let err = view.add_comment(&backend, "   ").unwrap_err();
        assert!(matches!(err, ViewError::Comment(CommentError::EmptyContent)));
        assert_eq!(backend.calls().len(), before);
    }

    #[test]
    fn refresh_discards_local_likes() {
        let backend = backend();
        let mut view = view(&backend, "U1");
        assert_eq!(view.toggle_like(&Id::from("C2")).unwrap(), 1);
        view.add_comment(&backend, "Another").unwrap();
        assert_eq!(view.comments.len(), 2);
        assert_eq!(view.comments[0].replies[0].likes, 0);
    }

    #[test]
    fn create_then_delete_task() {
        let backend = backend();
        let mut view = view(&backend, "U1");
        let form = TaskForm {
            title: "Contact form".into(),
            assignee_id: Some(Id::from("U3")),
            ..Default::default()
        };
        let created = view.create_task(&backend, &form).unwrap();
        assert_eq!(view.tasks.len(), 3);
        // U3 is not known to the backend
        assert_eq!(
            view.task(&created.id).unwrap().assignee.as_ref().unwrap().display_name(),
            UNKNOWN_USER
        );

        let removed = view.delete_task(&backend, &created.id).unwrap();
        assert_eq!(removed.title, "Contact form");
        assert_eq!(view.tasks.len(), 2);
        assert!(backend.task(&created.id).is_none());
    }

    #[test]
    fn reassign_attaches_new_assignee() {
        let backend = backend();
        let mut view = view(&backend, "U1");
        let task = view.reassign_task(&backend, &Id::from("T1"), Some(&Id::from("U2"))).unwrap();
        assert_eq!(task.assignee.as_ref().unwrap().display_name(), "Bob");
        let task = view.reassign_task(&backend, &Id::from("T1"), None).unwrap();
        assert!(task.assignee.is_none());
    }

    #[test]
    fn reassign_to_outsider_is_refused() {
        let backend = backend();
        let mut view = view(&backend, "U1");
        let before = backend.calls().len();
        let err = view
            .reassign_task(&backend, &Id::from("T1"), Some(&Id::from("U7")))
            .unwrap_err();
        assert!(matches!(err, ViewError::Task(TaskError::NotMember(_))));
        assert_eq!(backend.calls().len(), before);
        assert_eq!(view.task(&Id::from("T1")).unwrap().assignee_id, Some(Id::from("U1")));
    }

    #[test]
    fn removed_comment_returns_on_refresh() {
        let backend = backend();
        let mut view = view(&backend, "U1");
        let removed = view.remove_comment(&Id::from("C1")).unwrap();
        assert_eq!(removed.replies.len(), 1);
        assert!(view.comments.is_empty());
        view.refresh_comments(&backend).unwrap();
        assert_eq!(comment_tree::count(&view.comments), 2);
    }

    #[test]
    fn filtered_tasks_by_query_and_status() {
        let backend = backend();
        let view = view(&backend, "U1");
        let hits = view.filtered_tasks(&TaskQuery::text("bob"), None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, Id::from("T2"));
        assert!(view.filtered_tasks(&TaskQuery::text(""), Some(TaskStatus::Done)).is_empty());
        assert_eq!(view.assignees().len(), 2);
    }
}
