use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::Id;
use super::user::User;

/// Board column a task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    ToDo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Board order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Done];

    /// Compact backend form (`TO_DO`, `IN_PROGRESS`, `DONE`)
    pub fn wire(self) -> &'static str {
        match self {
            TaskStatus::ToDo => "TO_DO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Spaced display form (`To Do`, `In Progress`, `Done`)
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Canonicalize any textual status. Accepts both the wire and display
    /// forms in any case; runs of whitespace and underscores are treated as a
    /// single separator. Anything unrecognized is `ToDo`.
    pub fn from_wire(raw: &str) -> TaskStatus {
        match normalize(raw).as_str() {
            "TODO" | "TO_DO" => TaskStatus::ToDo,
            "INPROGRESS" | "IN_PROGRESS" => TaskStatus::InProgress,
            "DONE" => TaskStatus::Done,
            _ => TaskStatus::ToDo,
        }
    }

    /// Strict variant used for user input, where a typo should be an error
    /// rather than a silent move back to `ToDo`.
    pub fn parse_strict(raw: &str) -> Option<TaskStatus> {
        match normalize(raw).as_str() {
            "TODO" | "TO_DO" => Some(TaskStatus::ToDo),
            "INPROGRESS" | "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "DONE" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire())
    }
}

/// Any JSON value is accepted; non-strings (null, numbers) read as `ToDo`.
impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.as_str().map(TaskStatus::from_wire).unwrap_or_default())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn wire(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Case-insensitive; unknown values fall back to `Medium`
    pub fn from_wire(raw: &str) -> Priority {
        Priority::parse_strict(raw).unwrap_or_default()
    }

    pub fn parse_strict(raw: &str) -> Option<Priority> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Priority::Low),
            "MEDIUM" => Some(Priority::Medium),
            "HIGH" => Some(Priority::High),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.as_str().map(Priority::from_wire).unwrap_or_default())
    }
}

/// Uppercase, trim, and collapse separator runs to a single `_`.
fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.trim().chars() {
        if c == '_' || c.is_whitespace() {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.extend(c.to_uppercase());
    }
    out
}

/// A task as the backend reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Id,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assignee_id: Option<Id>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub project_id: Option<Id>,

    /// Resolved assignee, filled in by the user directory
    #[serde(skip)]
    pub assignee: Option<User>,
}

impl Task {
    /// Create a new unassigned task in the initial state
    pub fn new(id: impl Into<Id>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::ToDo,
            priority: Priority::Medium,
            assignee_id: None,
            due_date: None,
            created_at: None,
            project_id: None,
            assignee: None,
        }
    }

    pub fn with_assignee(mut self, assignee: impl Into<Id>) -> Self {
        self.assignee_id = Some(assignee.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_assigned_to(&self, user_id: &Id) -> bool {
        self.assignee_id.as_ref() == Some(user_id)
    }

    pub fn description_or_default(&self) -> &str {
        match self.description.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => NO_DESCRIPTION,
        }
    }

    /// Date portion of `created_at` (the backend sends full timestamps)
    pub fn created_date(&self) -> Option<&str> {
        self.created_at
            .as_deref()
            .map(|s| s.split('T').next().unwrap_or(s))
    }
}

pub const NO_DESCRIPTION: &str = "No description provided";

/// Body of a create-task request. Tasks always start in `ToDo`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub project_id: Id,
    pub priority: Priority,
    pub status: TaskStatus,
    pub assignee_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}
