// src/services/game.rs

use std::{fmt, sync::Arc};

use crate::{
    models::{
        mode::{GameMode, QuizSettings},
        question::Answer,
        session::{Phase, ResultsPayload, SessionView},
    },
    services::{
        acquisition::QuestionSource,
        entitlement::EntitlementTracker,
        quiz_session::{Advance, LoadStatus, QuizSession, SessionError},
        results::{ResultsError, ResultsSink},
        sessions::SessionRegistry,
    },
    store::results_key,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The plan's allowance for this mode is used up for the current period.
    LimitReached(String),
    Session(SessionError),
    /// Nothing to play; the session is back in setup.
    NoQuestions(String),
    /// The game was reset while its questions were loading.
    Superseded,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::LimitReached(feature) => write!(
                f,
                "You have reached your '{}' limit for now. Upgrade your plan or come back later.",
                feature
            ),
            GameError::Session(e) => write!(f, "{}", e),
            GameError::NoQuestions(msg) => f.write_str(msg),
            GameError::Superseded => write!(f, "The game was reset before its questions arrived"),
        }
    }
}

impl std::error::Error for GameError {}

/// Error for a move that needs a game when the user has none.
fn no_game(action: &'static str) -> SessionError {
    SessionError::InvalidTransition {
        phase: Phase::Setup,
        action,
    }
}

impl From<SessionError> for GameError {
    fn from(err: SessionError) -> Self {
        GameError::Session(err)
    }
}

/// Runs games end to end: entitlement check, question loading, answering,
/// and handing finished games to the results sink.
#[derive(Clone)]
pub struct GameService {
    tracker: Arc<EntitlementTracker>,
    source: Arc<QuestionSource>,
    sessions: SessionRegistry,
    results: Arc<dyn ResultsSink>,
}

impl GameService {
    pub fn new(
        tracker: Arc<EntitlementTracker>,
        source: Arc<QuestionSource>,
        sessions: SessionRegistry,
        results: Arc<dyn ResultsSink>,
    ) -> Self {
        Self {
            tracker,
            source,
            sessions,
            results,
        }
    }

    pub fn tracker(&self) -> &EntitlementTracker {
        &self.tracker
    }

    /// Starts a game from the setup form.
    ///
    /// A finished game is cleared first; any other game in progress must be
    /// reset explicitly. Usage is recorded only once questions are in hand.
    pub async fn start(
        &self,
        user_id: &str,
        plan: Option<&str>,
        mode: GameMode,
        settings: QuizSettings,
    ) -> Result<SessionView, GameError> {
        let feature = mode.feature_key();
        if !self.tracker.can_use(user_id, feature, plan).await {
            tracing::info!("User {} is over the '{}' limit", user_id, feature);
            return Err(GameError::LimitReached(feature.to_string()));
        }

        let ticket = self
            .sessions
            .with(user_id, mode, |s| {
                if s.phase() == Phase::Finished {
                    s.reset();
                }
                s.submit_settings(settings)
            })
            .await?;

        let outcome = self.source.acquire(mode, &ticket.settings).await;

        let (status, view) = self
            .sessions
            .with_existing(user_id, mode, |s| {
                let status = s.complete_loading(&ticket, outcome);
                (status, s.view())
            })
            .await
            .ok_or(GameError::Superseded)?;

        match status {
            LoadStatus::Started => {
                self.tracker.record_usage(user_id, feature).await;
                tracing::info!(
                    "User {} started a {} game with {} questions",
                    user_id,
                    mode.slug(),
                    view.total_questions
                );
                Ok(view)
            }
            LoadStatus::Failed(reason) => Err(GameError::NoQuestions(reason)),
            LoadStatus::Stale => Err(GameError::Superseded),
        }
    }

    /// The user's game, or a blank setup view when there is none.
    pub async fn view(&self, user_id: &str, mode: GameMode) -> SessionView {
        self.sessions.view(user_id, mode).await
    }

    pub async fn answer(
        &self,
        user_id: &str,
        mode: GameMode,
        answer: Answer,
    ) -> Result<SessionView, GameError> {
        let view = self
            .sessions
            .with_existing(user_id, mode, |s| {
                s.submit_answer(answer)?;
                Ok::<_, SessionError>(s.view())
            })
            .await
            .unwrap_or(Err(no_game("answer")))?;
        Ok(view)
    }

    /// Moves to the next question, or ends the game and stores its results.
    ///
    /// A finished game leaves the registry once its results are handed to
    /// the sink; the results page reads them from there.
    pub async fn next(&self, user_id: &str, mode: GameMode) -> Result<SessionView, GameError> {
        let (advance, view, generation) = self
            .sessions
            .with_existing(user_id, mode, |s| {
                s.advance().map(|a| (a, s.view(), s.generation()))
            })
            .await
            .unwrap_or(Err(no_game("move on")))?;

        if let Advance::Finished(payload) = advance {
            let key = results_key(mode, user_id);
            match self.results.persist(&key, &payload).await {
                Ok(()) => tracing::info!(
                    "User {} finished a {} game: {}/{}",
                    user_id,
                    mode.slug(),
                    payload.score,
                    payload.total_questions
                ),
                Err(e) => tracing::error!("Failed to store results under '{}': {}", key, e),
            }

            self.sessions
                .remove_if(user_id, mode, |s| {
                    s.generation() == generation && s.phase() == Phase::Finished
                })
                .await;
        }

        Ok(view)
    }

    /// Abandons the user's game. Nothing is persisted.
    pub async fn reset(&self, user_id: &str, mode: GameMode) -> SessionView {
        self.sessions.remove(user_id, mode).await;
        QuizSession::new(mode).view()
    }

    /// Last stored results of `mode` for the user.
    pub async fn results(
        &self,
        user_id: &str,
        mode: GameMode,
    ) -> Result<Option<ResultsPayload>, ResultsError> {
        self.results.load(&results_key(mode, user_id)).await
    }
}
