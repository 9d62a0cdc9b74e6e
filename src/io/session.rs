use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::io::config_io::ConfigError;
use crate::model::id::Id;

/// Persisted login session (written to session.json). The only durable
/// client-side state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Session {
    /// Bearer token issued by the backend
    pub token: String,
    /// Current user, cached at login
    #[serde(default)]
    pub user_id: Option<Id>,
    #[serde(default)]
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Session {
            token: token.into(),
            user_id: None,
            logged_in_at: Some(Utc::now()),
        }
    }

    pub fn is_expired(&self) -> bool {
        is_token_expired(&self.token, Utc::now())
    }
}

pub fn session_path(config_dir: &Path) -> PathBuf {
    config_dir.join("session.json")
}

/// Read session.json. Missing or malformed files mean "not logged in".
pub fn read_session(config_dir: &Path) -> Option<Session> {
    let content = fs::read_to_string(session_path(config_dir)).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write session.json atomically
pub fn write_session(config_dir: &Path, session: &Session) -> Result<(), ConfigError> {
    let path = session_path(config_dir);
    let content = serde_json::to_string_pretty(session)?;
    fs::create_dir_all(config_dir)
        .and_then(|_| atomic_write(&path, content.as_bytes()))
        .map_err(|e| ConfigError::WriteError { path, source: e })
}

/// Remove session.json. Returns whether a session existed.
pub fn clear_session(config_dir: &Path) -> Result<bool, ConfigError> {
    let path = session_path(config_dir);
    match fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ConfigError::WriteError { path, source: e }),
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Check a JWT's `exp` claim against `now`. Anything that isn't a decodable
/// JWT with a numeric `exp` counts as expired.
pub fn is_token_expired(token: &str, now: DateTime<Utc>) -> bool {
    #[derive(Deserialize)]
    struct Claims {
        exp: Option<i64>,
    }

    let Some(payload) = token.split('.').nth(1) else {
        return true;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) else {
        return true;
    };
    match serde_json::from_slice::<Claims>(&bytes) {
        Ok(Claims { exp: Some(exp) }) => exp <= now.timestamp(),
        _ => true,
    }
}
