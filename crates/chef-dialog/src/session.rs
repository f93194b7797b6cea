//! Per-conversation dialog sessions.
//!
//! Each session sits behind its own async mutex so turns within a session
//! run one at a time while different sessions proceed concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DialogError;
use crate::orchestrator::{ConversationOrchestrator, TurnOutcome};
use crate::slot::DialogSlotState;
use crate::store::ConversationStore;

/// Dialog state for one conversation.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: Uuid,
    pub slot: DialogSlotState,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            slot: DialogSlotState::new(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn is_expired(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_active > timeout
    }
}

type SessionHandle = Arc<AsyncMutex<Session>>;

/// Sessions keyed by conversation id.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
    timeout: Duration,
}

impl SessionRegistry {
    pub fn new(session_timeout_minutes: u32) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout: Duration::minutes(i64::from(session_timeout_minutes)),
        }
    }

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, SessionHandle>>, DialogError> {
        self.sessions
            .lock()
            .map_err(|e| DialogError::StorageError(format!("session lock poisoned: {}", e)))
    }

    /// Session for `id`, created on first use. An idle session past the
    /// timeout is replaced by a fresh one.
    pub fn session(&self, id: Uuid) -> Result<SessionHandle, DialogError> {
        let mut sessions = self.lock_sessions()?;

        if let Some(handle) = sessions.get(&id) {
            let expired = handle
                .try_lock()
                .map(|s| s.is_expired(self.timeout, Utc::now()))
                .unwrap_or(false);
            if !expired {
                return Ok(handle.clone());
            }
            debug!(session_id = %id, "Session expired; starting fresh");
        }

        let handle = Arc::new(AsyncMutex::new(Session::new(id)));
        sessions.insert(id, handle.clone());
        Ok(handle)
    }

    pub fn remove(&self, id: Uuid) -> Result<bool, DialogError> {
        Ok(self.lock_sessions()?.remove(&id).is_some())
    }

    pub fn len(&self) -> usize {
        self.lock_sessions().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop idle sessions past the timeout. Sessions mid-turn are kept.
    pub fn prune_expired(&self) -> Result<usize, DialogError> {
        self.prune_expired_at(Utc::now())
    }

    fn prune_expired_at(&self, now: DateTime<Utc>) -> Result<usize, DialogError> {
        let mut sessions = self.lock_sessions()?;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !session.is_expired(self.timeout, now),
            Err(_) => true,
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(pruned, remaining = sessions.len(), "Expired sessions pruned");
        }
        Ok(pruned)
    }

    /// Run one turn for conversation `id`: load its history, run the
    /// orchestrator, then persist the new messages and any first title.
    ///
    /// The session's slot state is committed only after the messages are
    /// stored. A turn dropped before then leaves the session unchanged.
    pub async fn run_turn(
        &self,
        id: Uuid,
        store: &dyn ConversationStore,
        orchestrator: &ConversationOrchestrator,
        text: &str,
    ) -> Result<TurnOutcome, DialogError> {
        let handle = self.session(id)?;
        let mut session = handle.lock().await;

        let conversation = match store.get(id) {
            Ok(c) => c,
            Err(e) => {
                drop(session);
                self.remove(id)?;
                return Err(e);
            }
        };

        let mut slot = session.slot.clone();
        let outcome = orchestrator
            .handle_turn(
                &mut slot,
                &conversation.messages,
                conversation.title.as_deref(),
                text,
            )
            .await;

        if outcome.is_applied() {
            store.replace_messages(id, outcome.history.clone())?;
            if let Some(title) = &outcome.title {
                store.rename(id, title)?;
            }
        }
        session.slot = slot;
        session.touch();
        Ok(outcome)
    }
}
