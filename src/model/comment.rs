use serde::{Deserialize, Serialize};

use super::id::Id;
use super::user::UNKNOWN_USER;

/// A project comment. Top-level when `parent_comment_id` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Id,
    pub content: String,
    /// `None` when the backend sent no author; shown as the unknown user
    #[serde(default)]
    pub author_id: Option<Id>,
    #[serde(default)]
    pub parent_comment_id: Option<Id>,
    #[serde(default, alias = "createdAt")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub edited: bool,

    /// Child comments, rebuilt locally; never sent to the backend
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Comment>,

    // --- View-local state ---
    #[serde(skip)]
    pub author_name: Option<String>,
    #[serde(skip)]
    pub likes: u32,
    #[serde(skip)]
    pub liked_by_user: bool,
}

impl Comment {
    pub fn new(id: impl Into<Id>, author_id: impl Into<Id>, content: impl Into<String>) -> Self {
        Comment {
            id: id.into(),
            content: content.into(),
            author_id: Some(author_id.into()),
            parent_comment_id: None,
            timestamp: None,
            edited: false,
            replies: Vec::new(),
            author_name: None,
            likes: 0,
            liked_by_user: false,
        }
    }

    pub fn reply_to(mut self, parent: impl Into<Id>) -> Self {
        self.parent_comment_id = Some(parent.into());
        self
    }

    pub fn author_display(&self) -> &str {
        self.author_name.as_deref().unwrap_or(UNKNOWN_USER)
    }
}

/// Body of a create-comment request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub author_id: Id,
    pub parent_comment_id: Option<Id>,
}
