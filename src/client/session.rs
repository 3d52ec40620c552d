//! Client-side session persistence
//!
//! The browser app kept `access_token` and `user_id` in local storage; here
//! the same pair lives in memory, mirrored to an optional JSON file so a
//! session survives restarts.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Credentials issued at login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: i32,
}

/// Holds the current session, mirrored to an optional backing file
pub struct SessionStore {
    path: Option<PathBuf>,
    current: Mutex<Option<Session>>,
}

impl SessionStore {
    /// Store with no backing file; sessions last for the process lifetime
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: Mutex::new(None),
        }
    }

    /// File-backed store; picks up any previously saved session
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = load_from(&path);
        Self {
            path: Some(path),
            current: Mutex::new(current),
        }
    }

    /// Current session, if logged in
    pub fn current(&self) -> Option<Session> {
        self.current.lock().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }

    /// Store a session. File write failures are logged, never fatal; the
    /// in-memory session is updated regardless.
    pub fn save(&self, session: Session) {
        if let Some(ref path) = self.path {
            match serde_json::to_string_pretty(&session) {
                Ok(json) => {
                    if let Err(error) = std::fs::write(path, json) {
                        tracing::warn!("Failed to persist session: {}", error);
                    }
                }
                Err(error) => tracing::warn!("Failed to serialize session: {}", error),
            }
        }

        *self.current.lock().unwrap() = Some(session);
    }

    /// Drop the session and remove the persisted copy
    pub fn clear(&self) {
        if let Some(ref path) = self.path {
            if path.exists() {
                if let Err(error) = std::fs::remove_file(path) {
                    tracing::warn!("Failed to remove persisted session: {}", error);
                }
            }
        }

        *self.current.lock().unwrap() = None;
    }
}

/// A missing or unreadable file just means no session
fn load_from(path: &Path) -> Option<Session> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access_token: "signed-token".to_string(),
            user_id: 7,
        }
    }

    #[test]
    fn sessions_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::with_file(&path);
        assert!(!store.is_authenticated());

        store.save(session());
        assert!(store.is_authenticated());

        let reopened = SessionStore::with_file(&path);
        assert_eq!(reopened.current(), Some(session()));
    }

    #[test]
    fn clear_removes_the_persisted_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::with_file(&path);
        store.save(session());
        assert!(path.exists());

        store.clear();
        assert!(!path.exists());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn corrupt_session_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = SessionStore::with_file(&path);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn in_memory_store_never_touches_disk() {
        let store = SessionStore::in_memory();
        store.save(session());
        assert_eq!(store.current(), Some(session()));

        store.clear();
        assert!(store.current().is_none());
    }
}
