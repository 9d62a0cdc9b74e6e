use serde::{Deserialize, Serialize};

use super::id::Id;

/// Placeholder shown whenever a user can't be resolved
pub const UNKNOWN_USER: &str = "Unknown User";

/// A backend user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    #[serde(default, alias = "firstName")]
    pub firstname: Option<String>,
    #[serde(default, alias = "lastName")]
    pub lastname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "fullName", alias = "name", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl User {
    pub fn new(id: impl Into<Id>) -> Self {
        User {
            id: id.into(),
            firstname: None,
            lastname: None,
            email: None,
            full_name: None,
        }
    }

    /// Full name, then "first last", then the email's local part.
    pub fn display_name(&self) -> String {
        if let Some(full) = self.full_name.as_deref().map(str::trim) {
            if !full.is_empty() {
                return full.to_string();
            }
        }
        let joined = format!(
            "{} {}",
            self.firstname.as_deref().unwrap_or(""),
            self.lastname.as_deref().unwrap_or("")
        );
        let joined = joined.trim();
        if !joined.is_empty() {
            return joined.to_string();
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_USER.to_string())
    }
}

/// Body of a sign-up request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub firstname: String,
    pub lastname: String,
    pub role: String,
    pub email: String,
    pub password: String,
}

/// Role given to self-registered accounts
pub const DEFAULT_ROLE: &str = "USER";

/// Display name for an optional user
pub fn display_name_or_unknown(user: Option<&User>) -> String {
    user.map(User::display_name)
        .unwrap_or_else(|| UNKNOWN_USER.to_string())
}
