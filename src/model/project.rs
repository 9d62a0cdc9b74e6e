use serde::{Deserialize, Serialize};

use super::id::Id;
use super::task::Task;
use super::user::User;

/// A project with its team and tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Id,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lead_id: Option<Id>,
    /// Some endpoints embed the lead instead of (or as well as) `leadId`
    #[serde(default)]
    pub lead: Option<User>,
    #[serde(default)]
    pub members: Vec<User>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Project {
    pub fn new(id: impl Into<Id>, title: impl Into<String>) -> Self {
        Project {
            id: id.into(),
            title: title.into(),
            description: None,
            lead_id: None,
            lead: None,
            members: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Lead id from either representation
    pub fn lead_id(&self) -> Option<&Id> {
        self.lead_id.as_ref().or(self.lead.as_ref().map(|u| &u.id))
    }
}

/// Body of a create-project request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub member_ids: Vec<Id>,
}
