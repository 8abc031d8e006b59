// src/services/sessions.rs

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    models::{mode::GameMode, session::SessionView},
    services::quiz_session::QuizSession,
};

#[derive(Default)]
struct Registry {
    sessions: HashMap<(String, GameMode), QuizSession>,
    /// Above every generation handed out by a removed session, so a load
    /// started before a removal can never match a session created after it.
    next_generation: u64,
}

/// Live games, one per user and mode.
///
/// Only games in progress (and failed starts, to report why) occupy an
/// entry: reset and finished games are removed. The lock is held only for
/// synchronous state transitions, never across the question fetch, so a reset
/// can land while questions are loading.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` on the user's session for `mode`, creating it in setup if needed.
    pub async fn with<R>(
        &self,
        user_id: &str,
        mode: GameMode,
        f: impl FnOnce(&mut QuizSession) -> R,
    ) -> R {
        let mut inner = self.inner.lock().await;
        let generation = inner.next_generation;
        let session = inner
            .sessions
            .entry((user_id.to_string(), mode))
            .or_insert_with(|| QuizSession::with_generation(mode, generation));
        f(session)
    }

    /// Runs `f` on the user's session for `mode` if there is one.
    pub async fn with_existing<R>(
        &self,
        user_id: &str,
        mode: GameMode,
        f: impl FnOnce(&mut QuizSession) -> R,
    ) -> Option<R> {
        let mut inner = self.inner.lock().await;
        inner
            .sessions
            .get_mut(&(user_id.to_string(), mode))
            .map(f)
    }

    /// Current view, or a blank setup view when the user has no session.
    pub async fn view(&self, user_id: &str, mode: GameMode) -> SessionView {
        self.with_existing(user_id, mode, |s| s.view())
            .await
            .unwrap_or_else(|| QuizSession::new(mode).view())
    }

    /// Drops the session. Any load still in flight for it becomes stale.
    pub async fn remove(&self, user_id: &str, mode: GameMode) {
        self.remove_if(user_id, mode, |_| true).await;
    }

    /// Drops the session only if `pred` accepts it, e.g. when it is still the
    /// game the caller saw. Returns whether it was removed.
    pub async fn remove_if(
        &self,
        user_id: &str,
        mode: GameMode,
        pred: impl FnOnce(&QuizSession) -> bool,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        let key = (user_id.to_string(), mode);

        let Some(session) = inner.sessions.get(&key) else {
            return false;
        };
        if !pred(session) {
            return false;
        }

        let generation = session.generation();
        inner.sessions.remove(&key);
        inner.next_generation = inner.next_generation.max(generation + 1);
        true
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
