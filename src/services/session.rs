//! Session state and the in-memory session store.
//!
//! ARCHITECTURE
//! ============
//! Each browser session is identified by a random cookie token and owns one
//! `SessionState` behind its own `Mutex`. Handlers hold that lock for the
//! whole transition, including the completion round trip, so a session's
//! inputs are applied one at a time. The store's index lock is only held
//! long enough to look up or insert an entry.
//!
//! TRADE-OFFS
//! ==========
//! Nothing is persisted. Idle sessions are evicted by a background sweeper;
//! a returning browser with an evicted or unknown token simply gets a new
//! session.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::intake::IntakeRecord;
use crate::llm::types::Message;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex session token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Short, non-secret prefix of a token for log lines.
#[must_use]
pub fn log_id(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// One browser session's consultation state.
///
/// Invariant: `started` implies `intake` is present and `transcript` is
/// non-empty. Fields are private so only the transitions below can change
/// them.
#[derive(Debug, Default)]
pub struct SessionState {
    intake: Option<IntakeRecord>,
    started: bool,
    transcript: Vec<Message>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Populate the session in one step: intake, flag, and a fresh transcript
    /// of `[summary, first_reply]`.
    pub(crate) fn begin(&mut self, intake: IntakeRecord, summary: Message, first_reply: Message) {
        self.intake = Some(intake);
        self.started = true;
        self.transcript = vec![summary, first_reply];
    }

    pub(crate) fn push(&mut self, message: Message) {
        debug_assert!(self.started, "transcript append before consultation start");
        self.transcript.push(message);
    }

    /// Return to the initial empty state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            started: self.started,
            intake: self.intake.clone(),
            transcript: self.transcript.clone(),
        }
    }
}

/// Read-only copy of a session, serialized by `GET /api/session`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub started: bool,
    pub intake: Option<IntakeRecord>,
    pub transcript: Vec<Message>,
}

// =============================================================================
// SESSION STORE
// =============================================================================

pub type SharedSession = Arc<Mutex<SessionState>>;

struct SessionEntry {
    state: SharedSession,
    last_seen: Instant,
}

/// Process-wide index of live sessions. Cheap to clone.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `token` to its session, or start a new one when the token is
    /// absent or unknown. Returns the token to keep using and the session.
    ///
    /// Unknown tokens are never adopted; the caller always gets a server
    /// generated token back.
    pub async fn open(&self, token: Option<&str>) -> (String, SharedSession) {
        let mut sessions = self.sessions.write().await;
        if let Some(token) = token {
            if let Some(entry) = sessions.get_mut(token) {
                entry.last_seen = Instant::now();
                return (token.to_owned(), entry.state.clone());
            }
        }

        let token = generate_token();
        let state: SharedSession = Arc::new(Mutex::new(SessionState::new()));
        sessions.insert(token.clone(), SessionEntry { state: state.clone(), last_seen: Instant::now() });
        debug!(session = log_id(&token), "session created");
        (token, state)
    }

    /// Look up an existing session without creating one.
    pub async fn get(&self, token: &str) -> Option<SharedSession> {
        let sessions = self.sessions.read().await;
        sessions.get(token).map(|entry| entry.state.clone())
    }

    /// Mark a session as active now. Called after a transition finishes so a
    /// long completion round trip does not count as idle time.
    pub async fn touch(&self, token: &str) {
        if let Some(entry) = self.sessions.write().await.get_mut(token) {
            entry.last_seen = Instant::now();
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions not seen within `max_idle`. Returns how many were removed.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        match Instant::now().checked_sub(max_idle) {
            Some(cutoff) => self.prune_seen_before(cutoff).await,
            None => 0,
        }
    }

    pub(crate) async fn prune_seen_before(&self, cutoff: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        // A locked session is mid-transition and is never evicted.
        sessions.retain(|_, entry| entry.last_seen >= cutoff || entry.state.try_lock().is_err());
        before - sessions.len()
    }
}

/// Spawn the idle-session sweeper. Returns a handle for shutdown.
pub fn spawn_session_sweeper(store: SessionStore, max_idle: Duration) -> JoinHandle<()> {
    let period = (max_idle / 4).max(MIN_SWEEP_INTERVAL);
    info!(idle_secs = max_idle.as_secs(), sweep_secs = period.as_secs(), "session sweeper configured");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let removed = store.prune_idle(max_idle).await;
            if removed > 0 {
                let remaining = store.len().await;
                info!(removed, remaining, "evicted idle sessions");
            }
        }
    })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
