use chrono::NaiveDate;
use serde::Serialize;

use crate::io::api::{ApiError, Backend};
use crate::model::id::Id;
use crate::model::project::Project;
use crate::model::task::{Priority, Task, TaskStatus};
use crate::ops::board::StatusCounts;

const RECENT_LIMIT: usize = 4;
const UPCOMING_LIMIT: usize = 3;

/// A finished task, for the activity feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedItem {
    pub task: String,
    pub project: String,
}

/// An open task, for the deadlines panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadlineItem {
    pub task: String,
    pub project: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub overdue: bool,
}

/// Everything the dashboard shows for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_projects: usize,
    pub counts: StatusCounts,
    pub recently_completed: Vec<CompletedItem>,
    pub upcoming: Vec<DeadlineItem>,
}

/// Parse the date part of a backend date or timestamp
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Aggregate the tasks assigned to `user_id` across `projects`.
pub fn summarize(user_id: &Id, projects: &[(Project, Vec<Task>)], today: NaiveDate) -> DashboardSummary {
    let mut counts = StatusCounts::default();
    let mut recently_completed = Vec::new();
    let mut open = Vec::new();

    for (project, tasks) in projects {
        for task in tasks.iter().filter(|t| t.is_assigned_to(user_id)) {
            counts.add(task.status);
            if task.status == TaskStatus::Done {
                recently_completed.push(CompletedItem {
                    task: task.title.clone(),
                    project: project.title.clone(),
                });
            } else {
                let due_date = task.due_date.as_deref().and_then(parse_due_date);
                open.push(DeadlineItem {
                    task: task.title.clone(),
                    project: project.title.clone(),
                    due_date,
                    priority: task.priority,
                    overdue: due_date.is_some_and(|d| d < today),
                });
            }
        }
    }

    recently_completed.truncate(RECENT_LIMIT);
    // Dated tasks first, earliest first; the sort is stable so ties keep
    // backend order
    open.sort_by_key(|d| (d.due_date.is_none(), d.due_date));
    open.truncate(UPCOMING_LIMIT);

    DashboardSummary {
        total_projects: projects.len(),
        counts,
        recently_completed,
        upcoming: open,
    }
}

/// Fetch every project the user belongs to, with its tasks, and summarize.
pub fn load_dashboard<B: Backend + ?Sized>(
    backend: &B,
    user_id: &Id,
    today: NaiveDate,
) -> Result<DashboardSummary, ApiError> {
    let ids = backend.project_ids_for_user(user_id)?;
    let mut projects = Vec::with_capacity(ids.len());
    for id in &ids {
        let project = backend.get_project(id)?;
        let tasks = backend.list_tasks(id)?;
        projects.push((project, tasks));
    }
    tracing::debug!(user = %user_id, projects = projects.len(), "dashboard loaded");
    Ok(summarize(user_id, &projects, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::MemoryBackend;
    use crate::model::user::User;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn due(task: Task, date: &str) -> Task {
        Task {
            due_date: Some(date.to_string()),
            ..task
        }
    }

    fn sample() -> Vec<(Project, Vec<Task>)> {
        vec![
            (
                Project::new("P1", "Website"),
                vec![
                    Task::new("1", "Landing page").with_assignee("U1").with_status(TaskStatus::Done),
                    due(Task::new("2", "Footer").with_assignee("U1"), "2025-06-20"),
                    Task::new("3", "Not mine").with_assignee("U2"),
                    due(
                        Task::new("4", "Navbar").with_assignee("U1").with_status(TaskStatus::InProgress),
                        "2025-06-01T00:00:00",
                    ),
                ],
            ),
            (
                Project::new("P2", "Mobile"),
                vec![
                    Task::new("5", "Undated").with_assignee("U1"),
                    due(Task::new("6", "Store listing").with_assignee("U1"), "2025-06-15"),
                ],
            ),
        ]
    }

    #[test]
    fn counts_only_users_tasks() {
        let summary = summarize(&Id::from("U1"), &sample(), today());
        assert_eq!(summary.total_projects, 2);
        assert_eq!(
            summary.counts,
            StatusCounts {
                todo: 3,
                in_progress: 1,
                done: 1
            }
        );
        assert_eq!(
            summary.recently_completed,
            vec![CompletedItem {
                task: "Landing page".into(),
                project: "Website".into()
            }]
        );
    }

    #[test]
    fn upcoming_sorted_by_due_date_with_overdue_flag() {
        let summary = summarize(&Id::from("U1"), &sample(), today());
        let names: Vec<&str> = summary.upcoming.iter().map(|d| d.task.as_str()).collect();
        assert_eq!(names, vec!["Navbar", "Store listing", "Footer"]);
        assert!(summary.upcoming[0].overdue);
        assert!(!summary.upcoming[1].overdue);
    }

    #[test]
    fn no_projects_gives_empty_summary() {
        let summary = summarize(&Id::from("U1"), &[], today());
        assert_eq!(summary.total_projects, 0);
        assert_eq!(summary.counts.total(), 0);
        assert!(summary.upcoming.is_empty());
    }

    #[test]
    fn parse_due_date_variants() {
        assert_eq!(parse_due_date("2025-06-01"), NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(parse_due_date("2025-06-01T10:00:00Z"), NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(parse_due_date("soon"), None);
    }

    #[test]
    fn load_dashboard_walks_user_projects() {
        let me = User::new("U1");
        let mut project = Project::new("P1", "Website");
        project.members.push(me.clone());
        let backend = MemoryBackend::new()
            .with_current_user(me)
            .with_project(project)
            .with_project(Project::new("P9", "Someone else's"))
            .with_task("P1", Task::new("1", "Mine").with_assignee("U1"))
            .with_task("P9", Task::new("2", "Theirs").with_assignee("U1"));

        let summary = load_dashboard(&backend, &Id::from("U1"), today()).unwrap();
        assert_eq!(summary.total_projects, 1);
        assert_eq!(summary.counts.todo, 1);
        assert_eq!(
            backend.calls(),
            vec!["project_ids_for_user", "get_project", "list_tasks"]
        );
    }
}
