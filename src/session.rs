//! Session identity lifecycle
//!
//! A session is the durable correlation key between this client and the
//! answer service's stored history. [`SessionIdentity`] is the only writer of
//! the session key in the injected [`KeyValueStore`].

use crate::error::Result;
use crate::storage::{KeyValueStore, SESSION_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// The active conversation identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique token sent to the answer service as `session_id`
    pub id: Uuid,
    /// When this client created the token
    pub created_locally: DateTime<Utc>,
}

impl Session {
    /// Generate a fresh session with a random v4 token
    pub fn generate() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_locally: Utc::now(),
        }
    }

    /// Token in the hyphenated form used on the wire
    pub fn token(&self) -> String {
        self.id.to_string()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// How [`SessionIdentity::initialize`] obtained the active session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStart {
    /// A persisted token was found; history should be loaded
    Resumed(Session),
    /// No usable token existed; a new one was generated and persisted
    Fresh(Session),
}

impl SessionStart {
    /// The session regardless of how it was obtained
    pub fn session(&self) -> &Session {
        match self {
            Self::Resumed(session) | Self::Fresh(session) => session,
        }
    }

    /// Whether callers should fetch remote history
    pub fn is_resumed(&self) -> bool {
        matches!(self, Self::Resumed(_))
    }
}

/// Owner of the persisted session token
pub struct SessionIdentity {
    store: Arc<dyn KeyValueStore>,
}

impl SessionIdentity {
    /// Create the identity component over an injected store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Resume the persisted session or start a fresh one
    ///
    /// A stored value that cannot be parsed is treated as absent and
    /// replaced, so a corrupted key never blocks startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written
    ///
    /// # Examples
    ///
    /// ```
    /// use docbot::session::SessionIdentity;
    /// use docbot::storage::MemoryStore;
    /// use std::sync::Arc;
    ///
    /// let identity = SessionIdentity::new(Arc::new(MemoryStore::new()));
    /// let first = identity.initialize().unwrap();
    /// assert!(!first.is_resumed());
    /// let second = identity.initialize().unwrap();
    /// assert!(second.is_resumed());
    /// assert_eq!(first.session(), second.session());
    /// ```
    pub fn initialize(&self) -> Result<SessionStart> {
        if let Some(raw) = self.store.get(SESSION_KEY)? {
            match parse_persisted(&raw) {
                Some(session) => {
                    tracing::info!("Resuming session {}", session.id);
                    return Ok(SessionStart::Resumed(session));
                }
                None => {
                    tracing::warn!("Discarding unreadable persisted session token");
                }
            }
        }

        let session = self.persist_new()?;
        tracing::info!("Started fresh session {}", session.id);
        Ok(SessionStart::Fresh(session))
    }

    /// Replace the active session with a newly generated one
    ///
    /// The previous session's server-side history is left untouched; only
    /// the local association with the old token is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the new token cannot be persisted
    pub fn reset(&self) -> Result<Session> {
        let session = self.persist_new()?;
        tracing::info!("Session reset, new session {}", session.id);
        Ok(session)
    }

    /// Read the persisted session without creating one
    pub fn current(&self) -> Result<Option<Session>> {
        Ok(self
            .store
            .get(SESSION_KEY)?
            .and_then(|raw| parse_persisted(&raw)))
    }

    fn persist_new(&self) -> Result<Session> {
        let session = Session::generate();
        let encoded = serde_json::to_string(&session)?;
        self.store.set(SESSION_KEY, &encoded)?;
        Ok(session)
    }
}

/// Accepts the JSON record written by this client, or a bare UUID token
fn parse_persisted(raw: &str) -> Option<Session> {
    if let Ok(session) = serde_json::from_str::<Session>(raw) {
        return Some(session);
    }
    Uuid::parse_str(raw.trim()).ok().map(|id| Session {
        id,
        created_locally: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SqliteStore, THEME_KEY};

    fn identity() -> (SessionIdentity, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SessionIdentity::new(store.clone()), store)
    }

    #[test]
    fn test_initialize_fresh_persists_token() {
        let (identity, store) = identity();
        let start = identity.initialize().expect("initialize");
        assert!(matches!(start, SessionStart::Fresh(_)));

        let raw = store.get(SESSION_KEY).unwrap().expect("token persisted");
        let persisted: Session = serde_json::from_str(&raw).unwrap();
        assert_eq!(&persisted, start.session());
        assert_eq!(persisted.id.get_version_num(), 4);
    }

    #[test]
    fn test_initialize_resumes_existing_token() {
        let (identity, _store) = identity();
        let fresh = identity.initialize().expect("initialize");
        let resumed = identity.initialize().expect("initialize again");
        assert!(resumed.is_resumed());
        assert_eq!(fresh.session().id, resumed.session().id);
    }

    #[test]
    fn test_initialize_accepts_bare_uuid() {
        let (identity, store) = identity();
        store
            .set(SESSION_KEY, "1b4e28ba-2fa1-41d2-883f-0016d3cca427")
            .unwrap();
        let start = identity.initialize().expect("initialize");
        assert!(start.is_resumed());
        assert_eq!(
            start.session().token(),
            "1b4e28ba-2fa1-41d2-883f-0016d3cca427"
        );
    }

    #[test]
    fn test_initialize_replaces_corrupted_token() {
        let (identity, store) = identity();
        store.set(SESSION_KEY, "not a session").unwrap();
        let start = identity.initialize().expect("initialize");
        assert!(!start.is_resumed());
        assert_ne!(store.get(SESSION_KEY).unwrap().as_deref(), Some("not a session"));
    }

    #[test]
    fn test_reset_overwrites_token() {
        let (identity, _store) = identity();
        let first = identity.initialize().expect("initialize");
        let second = identity.reset().expect("reset");
        assert_ne!(first.session().id, second.id);
        assert_eq!(identity.current().unwrap(), Some(second));
    }

    #[test]
    fn test_reset_does_not_touch_other_keys() {
        let (identity, store) = identity();
        store.set(THEME_KEY, "light").unwrap();
        identity.reset().expect("reset");
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_session_survives_store_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        let first = {
            let store = Arc::new(SqliteStore::new_with_path(&path).unwrap());
            SessionIdentity::new(store).initialize().unwrap()
        };
        let store = Arc::new(SqliteStore::new_with_path(&path).unwrap());
        let second = SessionIdentity::new(store).initialize().unwrap();
        assert!(second.is_resumed());
        assert_eq!(first.session(), second.session());
    }
}
