//! Session storage.
//!
//! The session holds two kinds of state:
//! - JSON values (`get`/`put`/`pull`/`flash`), with flashed values
//!   surviving exactly one more request
//! - action handlers keyed by `action.{action_id}`, written when an
//!   action is serialized and read back on dispatch
//!
//! Handlers are Rust closures, so they never leave the process. Hosts that
//! run several processes must pin sessions to a process.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::handler::Handler;

/// Session key under which a handler for `action_id` is stored.
pub fn handler_key(action_id: &str) -> String {
    format!("action.{}", action_id)
}

// =============================================================================
// Session Store
// =============================================================================

/// A handler stored in the session.
#[derive(Debug, Clone)]
pub struct StoredHandler {
    pub handler: Handler,

    /// Stable handlers survive dispatch; others are consumed by it.
    pub stable: bool,

    pub stored_at: Instant,
}

/// Per-user session storage.
pub trait SessionStore: Send + Sync {
    /// Session identifier.
    fn id(&self) -> &str;

    fn get(&self, key: &str) -> Option<Value>;

    fn put(&self, key: &str, value: Value);

    /// Remove and return a value.
    fn pull(&self, key: &str) -> Option<Value>;

    /// Store a value for the current and the next request only.
    fn flash(&self, key: &str, value: Value);

    /// Store a handler, replacing any previous one under the key.
    fn put_handler(&self, key: &str, handler: Handler, stable: bool);

    /// Get a live handler.
    fn handler(&self, key: &str) -> Option<StoredHandler>;

    /// Remove a handler.
    fn forget_handler(&self, key: &str) -> Option<StoredHandler>;

    /// Remove and return a value, falling back to a default.
    fn pull_or(&self, key: &str, default: Value) -> Value {
        self.pull(key).unwrap_or(default)
    }
}

// =============================================================================
// Memory Session
// =============================================================================

#[derive(Default)]
struct FlashState {
    /// Keys flashed during the current request.
    new: HashSet<String>,
    /// Keys flashed during the previous request; dropped on the next age.
    old: HashSet<String>,
}

/// In-memory session store.
pub struct MemorySession {
    id: String,
    values: RwLock<HashMap<String, Value>>,
    flash: RwLock<FlashState>,
    handlers: RwLock<HashMap<String, StoredHandler>>,
    handler_ttl: Option<Duration>,
    last_seen: Mutex<Instant>,
}

impl MemorySession {
    /// Create a session with a random id.
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: RwLock::new(HashMap::new()),
            flash: RwLock::new(FlashState::default()),
            handlers: RwLock::new(HashMap::new()),
            handler_ttl: None,
            last_seen: Mutex::new(Instant::now()),
        }
    }

    /// Expire handlers older than `ttl`.
    pub fn with_handler_ttl(mut self, ttl: Duration) -> Self {
        self.handler_ttl = Some(ttl);
        self
    }

    /// Advance flash data by one request.
    ///
    /// Values flashed two requests ago are removed; values flashed during
    /// the last request stay readable for this one.
    pub fn age_flash_data(&self) {
        let mut flash = self.flash.write();
        let expired = std::mem::take(&mut flash.old);
        flash.old = std::mem::take(&mut flash.new);

        let mut values = self.values.write();
        for key in expired.difference(&flash.old) {
            values.remove(key);
        }
    }

    /// Mark the session as used by the current request.
    pub fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    /// Time since the session was last used.
    pub fn idle_for(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }

    /// Number of stored handlers, including expired ones.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Drop expired handlers.
    pub fn prune_handlers(&self) -> usize {
        let Some(ttl) = self.handler_ttl else {
            return 0;
        };
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|_, stored| stored.stored_at.elapsed() < ttl);
        before - handlers.len()
    }

    fn is_expired(&self, stored: &StoredHandler) -> bool {
        self.handler_ttl
            .map(|ttl| stored.stored_at.elapsed() >= ttl)
            .unwrap_or(false)
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySession {
    fn id(&self) -> &str {
        &self.id
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: Value) {
        self.values.write().insert(key.to_string(), value);
    }

    fn pull(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }

    fn flash(&self, key: &str, value: Value) {
        self.values.write().insert(key.to_string(), value);
        let mut flash = self.flash.write();
        flash.old.remove(key);
        flash.new.insert(key.to_string());
    }

    fn put_handler(&self, key: &str, handler: Handler, stable: bool) {
        tracing::debug!(session = %self.id, key, stable, "Storing action handler");
        let pruned = self.prune_handlers();
        if pruned > 0 {
            tracing::debug!(session = %self.id, pruned, "Pruned expired action handlers");
        }
        self.handlers.write().insert(
            key.to_string(),
            StoredHandler {
                handler,
                stable,
                stored_at: Instant::now(),
            },
        );
    }

    fn handler(&self, key: &str) -> Option<StoredHandler> {
        let stored = self.handlers.read().get(key).cloned()?;
        if self.is_expired(&stored) {
            tracing::warn!(session = %self.id, key, "Action handler expired");
            self.handlers.write().remove(key);
            return None;
        }
        Some(stored)
    }

    fn forget_handler(&self, key: &str) -> Option<StoredHandler> {
        self.handlers.write().remove(key)
    }
}

// =============================================================================
// Session Registry
// =============================================================================

/// All live in-memory sessions, keyed by id.
///
/// Sessions idle for longer than the idle TTL are dropped.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<MemorySession>>>,
    handler_ttl: Duration,
    idle_ttl: Duration,
}

impl SessionRegistry {
    /// Create a registry whose sessions also expire after `handler_ttl` idle.
    pub fn new(handler_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            handler_ttl,
            idle_ttl: handler_ttl,
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    /// Get the session for an id, or start a new one.
    ///
    /// Unknown or idle-expired ids start a fresh session rather than
    /// adopting the client-chosen id. Starting a session sweeps idle ones.
    pub fn resolve(&self, id: Option<&str>) -> Arc<MemorySession> {
        if let Some(session) = id.and_then(|id| self.get(id)) {
            session.touch();
            return session;
        }

        let session = Arc::new(MemorySession::new().with_handler_ttl(self.handler_ttl));
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, existing| existing.idle_for() < self.idle_ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle sessions");
        }

        tracing::debug!("Started session: {}", session.id());
        sessions.insert(session.id().to_string(), Arc::clone(&session));
        session
    }

    /// Get a live session.
    pub fn get(&self, id: &str) -> Option<Arc<MemorySession>> {
        let session = self.sessions.read().get(id).cloned()?;
        if session.idle_for() >= self.idle_ttl {
            self.sessions.write().remove(id);
            return None;
        }
        Some(session)
    }

    /// Remove a session.
    pub fn invalidate(&self, id: &str) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(2 * 60 * 60))
    }
}
