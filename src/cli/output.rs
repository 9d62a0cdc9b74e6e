use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::model::comment::Comment;
use crate::model::id::Id;
use crate::model::project::Project;
use crate::model::task::{Priority, Task, TaskStatus};
use crate::model::user::{User, display_name_or_unknown};
use crate::ops::board::Board;
use crate::ops::comment_tree::flatten_preorder;
use crate::ops::dashboard::DashboardSummary;
use crate::ops::project_ops::available_assignees;
use crate::util::unicode::{fit_to_width, wrap_words};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub description: String,
}

#[derive(Serialize)]
pub struct ColumnJson {
    pub status: TaskStatus,
    pub label: &'static str,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct CommentJson {
    pub id: String,
    pub author_id: Option<String>,
    pub author: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub edited: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentJson>,
}

#[derive(Serialize)]
pub struct UserJson {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct ProjectJson {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    pub team: Vec<UserJson>,
}

#[derive(Serialize)]
pub struct DashboardJson<'a> {
    pub user: String,
    #[serde(flatten)]
    pub summary: &'a DashboardSummary,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.to_string(),
        title: task.title.clone(),
        status: task.status,
        priority: task.priority,
        assignee_id: task.assignee_id.as_ref().map(|id| id.to_string()),
        assignee: task.assignee.as_ref().map(User::display_name),
        due_date: task.due_date.clone(),
        created: task.created_date().map(str::to_string),
        description: task.description_or_default().to_string(),
    }
}

pub fn board_to_json(board: &Board<'_>) -> Vec<ColumnJson> {
    board
        .columns
        .iter()
        .map(|c| ColumnJson {
            status: c.status,
            label: c.status.label(),
            tasks: c.tasks.iter().map(|t| task_to_json(t)).collect(),
        })
        .collect()
}

pub fn comment_to_json(comment: &Comment) -> CommentJson {
    CommentJson {
        id: comment.id.to_string(),
        author_id: comment.author_id.as_ref().map(Id::to_string),
        author: comment.author_display().to_string(),
        content: comment.content.clone(),
        timestamp: comment.timestamp.clone(),
        edited: comment.edited,
        replies: comment.replies.iter().map(comment_to_json).collect(),
    }
}

/// `{"project": .., "user": .., "<change>": true}` for team edits
pub fn membership_to_json(project: &str, user: &str, change: &str) -> serde_json::Value {
    let mut value = serde_json::json!({ "project": project, "user": user });
    value[change] = serde_json::Value::Bool(true);
    value
}

pub fn user_to_json(user: &User) -> UserJson {
    UserJson {
        id: user.id.to_string(),
        name: user.display_name(),
        email: user.email.clone(),
    }
}

pub fn project_to_json(project: &Project) -> ProjectJson {
    ProjectJson {
        id: project.id.to_string(),
        title: project.title.clone(),
        description: project.description.clone(),
        lead_id: project.lead_id().map(|id| id.to_string()),
        team: available_assignees(project).iter().map(user_to_json).collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn status_char(status: TaskStatus) -> char {
    match status {
        TaskStatus::ToDo => ' ',
        TaskStatus::InProgress => '>',
        TaskStatus::Done => 'x',
    }
}

/// One-line task summary: `[>] 12 Title @Ann !high due 2025-06-01`
pub fn format_task_line(task: &Task, show_ids: bool) -> String {
    let mut line = format!("[{}] ", status_char(task.status));
    if show_ids {
        line.push_str(&format!("{} ", task.id));
    }
    line.push_str(&task.title);
    if task.assignee_id.is_some() {
        line.push_str(&format!(" @{}", display_name_or_unknown(task.assignee.as_ref())));
    }
    if task.priority != Priority::Medium {
        line.push_str(&format!(" !{}", task.priority.wire().to_lowercase()));
    }
    if let Some(due) = &task.due_date {
        line.push_str(&format!(" due {}", due.get(..10).unwrap_or(due)));
    }
    line
}

/// Side-by-side kanban columns, each `width` cells wide
pub fn format_board(board: &Board<'_>, width: usize, show_ids: bool) -> Vec<String> {
    let width = width.max(4);
    let join = |cells: Vec<String>| cells.join(" │ ").trim_end().to_string();

    let mut lines = Vec::new();
    lines.push(join(
        board
            .columns
            .iter()
            .map(|c| fit_to_width(&format!("{} ({})", c.status.label(), c.tasks.len()), width))
            .collect(),
    ));
    lines.push(
        board
            .columns
            .iter()
            .map(|_| "─".repeat(width))
            .collect::<Vec<_>>()
            .join("─┼─"),
    );
    for row in 0..board.depth() {
        lines.push(join(
            board
                .columns
                .iter()
                .map(|c| {
                    let card = match c.tasks.get(row) {
                        Some(t) if show_ids => format!("{} {}", t.id, t.title),
                        Some(t) => t.title.clone(),
                        None => String::new(),
                    };
                    fit_to_width(&card, width)
                })
                .collect(),
        ));
    }
    lines
}

/// Relative time like the discussion panel shows it: minutes within the
/// hour, hours within the day, then the date and time.
pub fn format_timestamp(raw: &str, now: DateTime<Utc>) -> String {
    let Some(at) = parse_timestamp(raw) else {
        return raw.to_string();
    };
    let minutes = (now - at).num_minutes().max(0);
    if minutes < 60 {
        format!("{} min ago", minutes)
    } else if minutes < 24 * 60 {
        format!("{} hours ago", minutes / 60)
    } else {
        at.format("%Y-%m-%d at %H:%M").to_string()
    }
}

/// RFC 3339, or a zone-less ISO timestamp taken as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

/// Threaded discussion, replies indented under their parent
pub fn format_comment_tree(forest: &[Comment], now: DateTime<Utc>, show_ids: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for (depth, comment) in flatten_preorder(forest) {
        let indent = "  ".repeat(depth);
        let mut header = format!("{}{}", indent, comment.author_display());
        if let Some(ts) = &comment.timestamp {
            header.push_str(&format!(" · {}", format_timestamp(ts, now)));
        }
        if comment.edited {
            header.push_str(" (edited)");
        }
        if comment.likes > 0 {
            header.push_str(&format!(" ♥{}", comment.likes));
        }
        if show_ids {
            header.push_str(&format!(" [{}]", comment.id));
        }
        lines.push(header);
        for text in wrap_words(&comment.content, 72) {
            lines.push(format!("{}  {}", indent, text));
        }
    }
    lines
}

pub fn format_project(project: &Project, show_ids: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if show_ids {
        lines.push(format!("== {} ({}) ==", project.title, project.id));
    } else {
        lines.push(format!("== {} ==", project.title));
    }
    if let Some(desc) = project.description.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.push(desc.to_string());
    }
    let lead = project.lead_id();
    for user in available_assignees(project) {
        let role = if Some(&user.id) == lead { " (lead)" } else { "" };
        lines.push(format!("  {} {}{}", user.id, user.display_name(), role));
    }
    lines
}

pub fn format_dashboard(user: &str, summary: &DashboardSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Welcome back, {}", user),
        String::new(),
        format!(
            "projects: {}  tasks: {}  to do: {}  in progress: {}  done: {}",
            summary.total_projects,
            summary.counts.total(),
            summary.counts.todo,
            summary.counts.in_progress,
            summary.counts.done
        ),
    ];

    lines.push(String::new());
    lines.push("Upcoming deadlines:".to_string());
    if summary.upcoming.is_empty() {
        lines.push("  (none)".to_string());
    }
    for item in &summary.upcoming {
        let due = item
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "no due date".to_string());
        let overdue = if item.overdue { " OVERDUE" } else { "" };
        lines.push(format!(
            "  {} [{}] {} · {}{}",
            due,
            item.priority.label(),
            item.task,
            item.project,
            overdue
        ));
    }

    lines.push(String::new());
    lines.push("Recently completed:".to_string());
    if summary.recently_completed.is_empty() {
        lines.push("  (none)".to_string());
    }
    for item in &summary.recently_completed {
        lines.push(format!("  [x] {} · {}", item.task, item.project));
    }
    lines
}

/// Parse a status argument. Unlike `TaskStatus::from_wire`, unknown input is
/// an error rather than To Do.
pub fn parse_status_arg(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse_strict(s).ok_or_else(|| {
        format!(
            "unknown status '{}' (expected: todo, in_progress, done)",
            s
        )
    })
}

pub fn parse_priority_arg(s: &str) -> Result<Priority, String> {
    Priority::parse_strict(s)
        .ok_or_else(|| format!("unknown priority '{}' (expected: low, medium, high)", s))
}
