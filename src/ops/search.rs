use regex::Regex;

use crate::model::task::{Task, TaskStatus};
use crate::model::user::display_name_or_unknown;

/// Which field of a task matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Title,
    Assignee,
    Status,
}

/// How to match the search box text
#[derive(Debug, Clone)]
pub enum TaskQuery {
    /// Case-insensitive substring
    Text(String),
    Regex(Regex),
}

impl TaskQuery {
    pub fn text(query: &str) -> Self {
        TaskQuery::Text(query.trim().to_lowercase())
    }

    /// Compile `pattern` case-insensitively
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(TaskQuery::Regex(Regex::new(&format!("(?i){}", pattern))?))
    }

    fn is_empty(&self) -> bool {
        matches!(self, TaskQuery::Text(q) if q.is_empty())
    }

    fn matches(&self, haystack: &str) -> bool {
        match self {
            TaskQuery::Text(q) => haystack.to_lowercase().contains(q.as_str()),
            TaskQuery::Regex(re) => re.is_match(haystack),
        }
    }
}

/// First field of `task` matching `query`, checked as title, then assignee
/// name, then status label.
pub fn match_task(task: &Task, query: &TaskQuery) -> Option<MatchField> {
    if query.matches(&task.title) {
        return Some(MatchField::Title);
    }
    // Unassigned tasks match on the empty string only
    let assignee = match &task.assignee_id {
        Some(_) => display_name_or_unknown(task.assignee.as_ref()),
        None => String::new(),
    };
    if !assignee.is_empty() && query.matches(&assignee) {
        return Some(MatchField::Assignee);
    }
    if query.matches(task.status.label()) {
        return Some(MatchField::Status);
    }
    None
}

/// Tasks matching the search box. An empty query keeps everything.
pub fn filter_tasks<'a>(tasks: &'a [Task], query: &TaskQuery) -> Vec<&'a Task> {
    if query.is_empty() {
        return tasks.iter().collect();
    }
    tasks
        .iter()
        .filter(|t| match_task(t, query).is_some())
        .collect()
}

/// Narrow to a single status column
pub fn with_status<'a>(tasks: Vec<&'a Task>, status: Option<TaskStatus>) -> Vec<&'a Task> {
    match status {
        Some(s) => tasks.into_iter().filter(|t| t.status == s).collect(),
        None => tasks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::User;

    fn sample() -> Vec<Task> {
        let mut ann = User::new("1");
        ann.firstname = Some("Ann".into());
        ann.lastname = Some("Lee".into());

        let mut assigned = Task::new("1", "Fix login bug").with_assignee("1");
        assigned.assignee = Some(ann);
        vec![
            assigned,
            Task::new("2", "Write release notes").with_status(TaskStatus::InProgress),
            Task::new("3", "Archive old boards").with_status(TaskStatus::Done),
        ]
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn empty_query_keeps_all() {
        let tasks = sample();
        assert_eq!(filter_tasks(&tasks, &TaskQuery::text("  ")).len(), 3);
    }

    #[test]
    fn matches_title_case_insensitively() {
        let tasks = sample();
        let hits = filter_tasks(&tasks, &TaskQuery::text("LOGIN"));
        assert_eq!(ids(&hits), vec!["1"]);
        assert_eq!(match_task(hits[0], &TaskQuery::text("login")), Some(MatchField::Title));
    }

    #[test]
    fn matches_assignee_name() {
        let tasks = sample();
        let q = TaskQuery::text("ann lee");
        assert_eq!(ids(&filter_tasks(&tasks, &q)), vec!["1"]);
        assert_eq!(match_task(&tasks[0], &q), Some(MatchField::Assignee));
    }

    #[test]
    fn matches_status_label() {
        let tasks = sample();
        let hits = filter_tasks(&tasks, &TaskQuery::text("in progress"));
        assert_eq!(ids(&hits), vec!["2"]);
        assert_eq!(match_task(hits[0], &TaskQuery::text("progress")), Some(MatchField::Status));
    }

    #[test]
    fn regex_query() {
        let tasks = sample();
        let q = TaskQuery::regex("^(fix|archive)").unwrap();
        assert_eq!(ids(&filter_tasks(&tasks, &q)), vec!["1", "3"]);
        assert!(TaskQuery::regex("(").is_err());
    }

    #[test]
    fn status_narrowing() {
        let tasks = sample();
        let all = filter_tasks(&tasks, &TaskQuery::text(""));
        assert_eq!(ids(&with_status(all, Some(TaskStatus::Done))), vec!["3"]);
    }
}
