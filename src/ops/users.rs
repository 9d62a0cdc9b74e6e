use indexmap::IndexMap;

use crate::io::api::Backend;
use crate::model::comment::Comment;
use crate::model::id::Id;
use crate::model::task::Task;
use crate::model::user::{UNKNOWN_USER, User};

/// Cache of resolved users, keyed by id.
///
/// A `None` entry records a user the backend says does not exist (404), so
/// such ids cost one request per directory. Other failures are not cached and
/// are retried on the next `resolve`.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: IndexMap<Id, Option<User>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with users already in hand (project members, lead)
    pub fn insert(&mut self, user: User) {
        self.users.insert(user.id.clone(), Some(user));
    }

    /// Look up every id not yet cached, one request per distinct id.
    /// Returns the number of requests made.
    pub fn resolve<'a, B, I>(&mut self, backend: &B, ids: I) -> usize
    where
        B: Backend + ?Sized,
        I: IntoIterator<Item = &'a Id>,
    {
        let mut requests = 0;
        // Transient failures in this pass, so duplicates aren't re-requested
        let mut failed: Vec<&Id> = Vec::new();
        for id in ids {
            if self.users.contains_key(id) || failed.contains(&id) {
                continue;
            }
            requests += 1;
            match backend.get_user(id) {
                Ok(user) => {
                    self.users.insert(id.clone(), Some(user));
                }
                Err(e) if e.status() == Some(404) => {
                    tracing::debug!(user = %id, "user does not exist");
                    self.users.insert(id.clone(), None);
                }
                Err(e) => {
                    tracing::warn!(user = %id, error = %e, "could not resolve user");
                    failed.push(id);
                }
            }
        }
        requests
    }

    pub fn get(&self, id: &Id) -> Option<&User> {
        self.users.get(id).and_then(Option::as_ref)
    }

    pub fn display_name(&self, id: &Id) -> String {
        self.get(id)
            .map(User::display_name)
            .unwrap_or_else(|| UNKNOWN_USER.to_string())
    }

    /// Resolve all comment authors, then stamp each comment (recursively)
    /// with its author's display name.
    pub fn annotate_comments<B: Backend + ?Sized>(&mut self, backend: &B, comments: &mut [Comment]) {
        let mut ids = Vec::new();
        collect_author_ids(comments, &mut ids);
        self.resolve(backend, ids.iter());
        self.stamp_authors(comments);
    }

    fn stamp_authors(&self, comments: &mut [Comment]) {
        for comment in comments {
            comment.author_name = Some(match &comment.author_id {
                Some(id) => self.display_name(id),
                None => UNKNOWN_USER.to_string(),
            });
            self.stamp_authors(&mut comment.replies);
        }
    }

    /// Resolve assignees and attach them to their tasks
    pub fn annotate_tasks<B: Backend + ?Sized>(&mut self, backend: &B, tasks: &mut [Task]) {
        let ids: Vec<Id> = tasks.iter().filter_map(|t| t.assignee_id.clone()).collect();
        self.resolve(backend, ids.iter());
        for task in tasks {
            task.assignee = match &task.assignee_id {
                Some(id) => Some(self.get(id).cloned().unwrap_or_else(|| unknown_user(id))),
                None => None,
            };
        }
    }
}

/// Placeholder for an assignee the backend couldn't return
fn unknown_user(id: &Id) -> User {
    let mut user = User::new(id.clone());
    user.full_name = Some(UNKNOWN_USER.to_string());
    user
}

fn collect_author_ids(comments: &[Comment], out: &mut Vec<Id>) {
    for comment in comments {
        out.extend(comment.author_id.clone());
        collect_author_ids(&comment.replies, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::api::ApiError;
    use crate::io::memory::MemoryBackend;

    fn named(id: &str, first: &str) -> User {
        let mut u = User::new(id);
        u.firstname = Some(first.to_string());
        u
    }

    #[test]
    fn resolve_deduplicates_ids() {
        let backend = MemoryBackend::new()
            .with_user(named("1", "Ann"))
            .with_user(named("2", "Bob"));
        let mut dir = UserDirectory::new();
        let ids = [Id::from("1"), Id::from("2"), Id::from("1"), Id::from("1")];
        assert_eq!(dir.resolve(&backend, ids.iter()), 2);
        assert_eq!(dir.resolve(&backend, ids.iter()), 0);
        assert_eq!(backend.calls(), vec!["get_user", "get_user"]);
        assert_eq!(dir.display_name(&Id::from("2")), "Bob");
    }

    #[test]
    fn missing_user_is_cached_as_unknown() {
        let backend = MemoryBackend::new();
        let mut dir = UserDirectory::new();
        let ids = [Id::from("404")];
        dir.resolve(&backend, ids.iter());
        dir.resolve(&backend, ids.iter());
        assert_eq!(backend.calls().len(), 1);
        assert_eq!(dir.display_name(&Id::from("404")), UNKNOWN_USER);
    }

    #[test]
    fn transient_failure_is_retried() {
        let backend = MemoryBackend::new().with_user(named("5", "Eve"));
        let mut dir = UserDirectory::new();
        let ids = [Id::from("5"), Id::from("5")];
        backend.fail_next(ApiError::backend(503, None));
        assert_eq!(dir.resolve(&backend, ids.iter()), 1);
        assert_eq!(dir.display_name(&Id::from("5")), UNKNOWN_USER);

        assert_eq!(dir.resolve(&backend, ids.iter()), 1);
        assert_eq!(dir.display_name(&Id::from("5")), "Eve");
        assert_eq!(dir.resolve(&backend, ids.iter()), 0);
    }

    #[test]
    fn seeded_users_are_not_fetched() {
        let backend = MemoryBackend::new();
        let mut dir = UserDirectory::new();
        dir.insert(named("7", "Cy"));
        assert_eq!(dir.resolve(&backend, [Id::from("7")].iter()), 0);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn annotate_comments_fills_nested_authors() {
        let backend = MemoryBackend::new().with_user(named("1", "Ann"));
        let mut parent = Comment::new("c1", "1", "hello");
        parent.replies.push(Comment::new("c2", "2", "hi").reply_to("c1"));
        let mut comments = vec![parent];

        let mut dir = UserDirectory::new();
        dir.annotate_comments(&backend, &mut comments);
        assert_eq!(comments[0].author_display(), "Ann");
        assert_eq!(comments[0].replies[0].author_display(), UNKNOWN_USER);
    }

    #[test]
    fn comments_without_author_skip_lookup() {
        let backend = MemoryBackend::new().with_user(named("1", "Ann"));
        let mut orphan = Comment::new("c2", "1", "who wrote this");
        orphan.author_id = None;
        let mut comments = vec![Comment::new("c1", "1", "hello"), orphan];

        let mut dir = UserDirectory::new();
        dir.annotate_comments(&backend, &mut comments);
        assert_eq!(backend.calls(), vec!["get_user"]);
        assert_eq!(comments[0].author_display(), "Ann");
        assert_eq!(comments[1].author_display(), UNKNOWN_USER);
    }

    #[test]
    fn annotate_tasks_uses_placeholder_for_missing_assignee() {
        let backend = MemoryBackend::new().with_user(named("1", "Ann"));
        let mut tasks = vec![
            Task::new("t1", "a").with_assignee("1"),
            Task::new("t2", "b").with_assignee("9"),
            Task::new("t3", "c"),
        ];
        let mut dir = UserDirectory::new();
        dir.annotate_tasks(&backend, &mut tasks);
        assert_eq!(tasks[0].assignee.as_ref().unwrap().display_name(), "Ann");
        let placeholder = tasks[1].assignee.as_ref().unwrap();
        assert_eq!(placeholder.id, Id::from("9"));
        assert_eq!(placeholder.display_name(), UNKNOWN_USER);
        assert!(tasks[2].assignee.is_none());
    }
}
