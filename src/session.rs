//! In-memory session storage with sliding-window expiry.
//!
//! Sessions are keyed by an opaque id carried in the `Session` cookie.
//! Every successful lookup renews a session for another idle window.
//! Stale entries are dropped lazily when looked up, and by a full sweep
//! that runs once every `cleanup_period` lookups.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::config;

pub const SESSION_COOKIE_NAME: &str = "Session";

/// Source of the current time for expiry decisions
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Opaque session identifier (hyphenated v4 UUID)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
  fn generate() -> Self {
    Self(Uuid::new_v4().to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Leading characters of the id, for log lines
  pub fn prefix(&self) -> &str {
    id_prefix(&self.0)
  }
}

/// Logs carry only the first few characters of an id
fn id_prefix(id: &str) -> &str {
  id.get(..8).unwrap_or(id)
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl Borrow<str> for SessionId {
  fn borrow(&self) -> &str {
    &self.0
  }
}

/// Per-visitor state kept alongside a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
  pub authenticated: bool,
}

struct SessionEntry {
  data: Arc<Mutex<SessionData>>,
  last_operation: DateTime<Utc>,
}

/// Handle to a live session, returned by [`SessionStore::get`].
///
/// Changes made through the handle are visible to later lookups of the
/// same id. Once the session is ended or expired the handle is detached:
/// it still works, but nothing it does reaches the store. Don't keep a
/// handle past the request that obtained it.
#[derive(Debug, Clone)]
pub struct Session {
  id: SessionId,
  data: Arc<Mutex<SessionData>>,
  last_operation: DateTime<Utc>,
}

impl Session {
  pub fn id(&self) -> &SessionId {
    &self.id
  }

  /// Time of the lookup that produced this handle
  pub fn last_operation(&self) -> DateTime<Utc> {
    self.last_operation
  }

  /// Snapshot of the session data
  pub fn data(&self) -> SessionData {
    lock(&self.data).clone()
  }

  pub fn is_authenticated(&self) -> bool {
    lock(&self.data).authenticated
  }

  pub fn authenticate(&self) {
    lock(&self.data).authenticated = true;
  }
}

/// Session timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
  /// Idle time after which a session is dropped
  pub max_idle: Duration,
  /// Number of lookups between full sweeps
  pub cleanup_period: u32,
  /// Max-Age of the issued cookie
  pub cookie_max_age: time::Duration,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      max_idle: Duration::minutes(config::SESSION_MAX_IDLE_MINUTES),
      cleanup_period: config::SESSION_CLEANUP_PERIOD,
      cookie_max_age: time::Duration::hours(config::SESSION_COOKIE_MAX_AGE_HOURS),
    }
  }
}

/// Shared session store.
///
/// One instance per process, wrapped in an `Arc` and handed to every
/// handler through the application state. The entry map and the cleanup
/// counter are guarded by separate locks; the caller that pushes the
/// counter past the period resets it, so a single sweep runs per period.
pub struct SessionStore {
  entries: Mutex<HashMap<SessionId, SessionEntry>>,
  cleanup_counter: Mutex<u32>,
  config: SessionConfig,
  clock: Arc<dyn Clock>,
}

/// Every critical section leaves the map consistent, so a poisoned lock is safe to reuse
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionStore {
  pub fn new(config: SessionConfig) -> Self {
    Self::with_clock(config, Arc::new(SystemClock))
  }

  pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      cleanup_counter: Mutex::new(0),
      config,
      clock,
    }
  }

  /// Issue a new session and attach its cookie to the jar
  pub fn start(&self, jar: CookieJar) -> (CookieJar, SessionId) {
    let id = SessionId::generate();
    let entry = SessionEntry {
      data: Arc::default(),
      last_operation: self.clock.now(),
    };
    lock(&self.entries).insert(id.clone(), entry);
    tracing::debug!(session = id.prefix(), "Session started");

    let cookie = self.cookie(id.to_string(), self.config.cookie_max_age);
    (jar.add(cookie), id)
  }

  /// Look up the session named by the request cookie, renewing it.
  ///
  /// Returns `None` when there is no cookie, the id is unknown, or the
  /// session has been idle longer than `max_idle` (it is removed then).
  pub fn get(&self, jar: &CookieJar) -> Option<Session> {
    self.count_and_sweep();

    let cookie = jar.get(SESSION_COOKIE_NAME)?;
    let session_id = cookie.value();
    let now = self.clock.now();
    let threshold = self.threshold(now);

    let mut entries = lock(&self.entries);
    let Some(entry) = entries.get_mut(session_id) else {
      drop(entries);
      tracing::warn!(session = id_prefix(session_id), "Session not found");
      return None;
    };

    if threshold.is_some_and(|threshold| entry.last_operation < threshold) {
      entries.remove(session_id);
      drop(entries);
      tracing::debug!(session = id_prefix(session_id), "Session expired");
      return None;
    }

    entry.last_operation = entry.last_operation.max(now);
    Some(Session {
      id: SessionId(session_id.to_owned()),
      data: Arc::clone(&entry.data),
      last_operation: entry.last_operation,
    })
  }

  /// End the current session: expire its cookie and forget it.
  ///
  /// The session is resolved through [`get`](Self::get) first, so it is
  /// renewed right before it is removed. No-op without a live session.
  pub fn end(&self, jar: CookieJar) -> CookieJar {
    let Some(session) = self.get(&jar) else {
      return jar;
    };

    let jar = jar.add(self.cookie(session.id.to_string(), time::Duration::seconds(-1)));
    lock(&self.entries).remove(&session.id);
    tracing::debug!(session = session.id.prefix(), "Session ended");
    jar
  }

  /// Remove every session idle for longer than `max_idle`.
  /// Returns the number of sessions removed.
  pub fn expire(&self) -> usize {
    let Some(threshold) = self.threshold(self.clock.now()) else {
      return 0;
    };
    let mut entries = lock(&self.entries);
    let before = entries.len();
    entries.retain(|_, entry| entry.last_operation >= threshold);
    let removed = before - entries.len();
    if removed > 0 {
      tracing::debug!(removed, remaining = entries.len(), "Swept expired sessions");
    }
    removed
  }

  pub fn len(&self) -> usize {
    lock(&self.entries).len()
  }

  pub fn is_empty(&self) -> bool {
    lock(&self.entries).is_empty()
  }

  pub fn contains(&self, id: &str) -> bool {
    lock(&self.entries).contains_key(id)
  }

  /// Last renewal time of a session, without renewing it
  pub fn last_operation(&self, id: &str) -> Option<DateTime<Utc>> {
    lock(&self.entries).get(id).map(|entry| entry.last_operation)
  }

  /// Oldest `last_operation` still live at `now`; `None` when the window
  /// reaches back past the representable range, so nothing is stale
  fn threshold(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(self.config.max_idle)
  }

  fn count_and_sweep(&self) {
    let due = {
      let mut counter = lock(&self.cleanup_counter);
      *counter = counter.saturating_add(1);
      if *counter > self.config.cleanup_period {
        *counter = 0;
        true
      } else {
        false
      }
    };
    if due {
      self.expire();
    }
  }

  fn cookie(&self, value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, value))
      .path("/")
      .secure(true)
      .http_only(true)
      .same_site(SameSite::Strict)
      .max_age(max_age)
      .build()
  }
}
