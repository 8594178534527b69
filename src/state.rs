//! Application state shared by all handlers.

use std::sync::Arc;

use crate::db::DbPool;
use crate::session::SessionStore;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Deeds database
    pub db: DbPool,

    /// The process-wide session store
    pub sessions: Arc<SessionStore>,

    /// Shared password that unlocks a session
    pub password: Arc<str>,
}

impl AppState {
    pub fn new(db: DbPool, sessions: SessionStore, password: impl Into<Arc<str>>) -> Self {
        Self {
            db,
            sessions: Arc::new(sessions),
            password: password.into(),
        }
    }
}
