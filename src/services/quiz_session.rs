// src/services/quiz_session.rs

use std::fmt;

use validator::Validate;

use crate::{
    models::{
        mode::{GameMode, QuizSettings},
        question::{Answer, Question},
        session::{AnswerResult, Phase, ResultsPayload, SessionView},
    },
    services::acquisition::{AcquireError, Acquired},
};

/// A request that does not fit the current phase, or bad input for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    InvalidTransition { phase: Phase, action: &'static str },
    InvalidSettings(String),
    /// Answer type does not fit the question (e.g. text for a true/false item).
    AnswerKindMismatch,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidTransition { phase, action } => {
                write!(f, "cannot {} while the game is in the {:?} phase", action, phase)
            }
            SessionError::InvalidSettings(msg) => write!(f, "invalid settings: {}", msg),
            SessionError::AnswerKindMismatch => {
                write!(f, "answer type does not match the current question")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Proof that a load was started. Carries the generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub mode: GameMode,
    pub settings: QuizSettings,
}

/// How a finished load was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Started,
    /// No usable questions. The session is back in setup.
    Failed(String),
    /// The session was reset (or restarted) since the load began; the result was dropped.
    Stale,
}

/// Result of moving on from a resolved question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    /// The game just ended. Returned exactly once per game.
    Finished(ResultsPayload),
}

/// One play-through of a quiz mode.
///
/// Setup -> Loading -> Presenting <-> Resolving -> Finished, with `reset`
/// returning to Setup from anywhere. Every method either applies a whole
/// transition or returns an error and leaves the session untouched.
#[derive(Debug, Clone)]
pub struct QuizSession {
    mode: GameMode,
    generation: u64,
    phase: Phase,
    settings: Option<QuizSettings>,
    questions: Vec<Question>,
    current_index: usize,
    score: u32,
    results: Vec<AnswerResult>,
    notice: Option<String>,
    failure: Option<String>,
    trace: Vec<Phase>,
}

impl QuizSession {
    pub fn new(mode: GameMode) -> Self {
        Self::with_generation(mode, 0)
    }

    /// A fresh session whose load tickets start after `generation`.
    pub fn with_generation(mode: GameMode, generation: u64) -> Self {
        Self {
            mode,
            generation,
            phase: Phase::Setup,
            settings: None,
            questions: Vec::new(),
            current_index: 0,
            score: 0,
            results: Vec::new(),
            notice: None,
            failure: None,
            trace: vec![Phase::Setup],
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settings(&self) -> Option<&QuizSettings> {
        self.settings.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn results(&self) -> &[AnswerResult] {
        &self.results
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Phases visited since the last reset, in order.
    pub fn trace(&self) -> &[Phase] {
        &self.trace
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Presenting | Phase::Resolving => self.questions.get(self.current_index),
            _ => None,
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.trace.push(phase);
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    /// Setup -> Loading. The caller fetches questions with the ticket's
    /// settings and hands the outcome to [`QuizSession::complete_loading`].
    pub fn submit_settings(&mut self, settings: QuizSettings) -> Result<LoadTicket, SessionError> {
        self.expect_phase(Phase::Setup, "start a game")?;

        settings
            .validate()
            .map_err(|e| SessionError::InvalidSettings(e.to_string()))?;

        self.generation += 1;
        self.settings = Some(settings.clone());
        self.failure = None;
        self.notice = None;
        self.enter(Phase::Loading);

        Ok(LoadTicket {
            generation: self.generation,
            mode: self.mode,
            settings,
        })
    }

    /// Loading -> Presenting, or back to Setup when nothing could be found.
    ///
    /// Outcomes for an older generation are dropped without touching state.
    pub fn complete_loading(
        &mut self,
        ticket: &LoadTicket,
        outcome: Result<Acquired, AcquireError>,
    ) -> LoadStatus {
        if ticket.generation != self.generation || self.phase != Phase::Loading {
            tracing::debug!(
                "Dropping stale question load (ticket {}, current {})",
                ticket.generation,
                self.generation
            );
            return LoadStatus::Stale;
        }

        let acquired = match outcome {
            Ok(acquired) if !acquired.questions.is_empty() => acquired,
            Ok(_) => {
                return self.fail_loading(
                    AcquireError::NoQuestions {
                        mode: self.mode,
                        topic: ticket.settings.topic.clone(),
                    }
                    .to_string(),
                );
            }
            Err(e) => return self.fail_loading(e.to_string()),
        };

        let wanted = ticket.settings.number_of_questions as usize;
        let mut questions = acquired.questions;
        questions.truncate(wanted);

        self.questions = questions;
        self.notice = acquired.notice;
        self.current_index = 0;
        self.score = 0;
        self.results.clear();
        self.enter(Phase::Presenting);
        LoadStatus::Started
    }

    fn fail_loading(&mut self, reason: String) -> LoadStatus {
        tracing::info!("Game for {} did not start: {}", self.mode.slug(), reason);
        self.settings = None;
        self.failure = Some(reason.clone());
        self.enter(Phase::Setup);
        LoadStatus::Failed(reason)
    }

    /// Presenting -> Resolving. Scores the answer and logs the result.
    pub fn submit_answer(&mut self, answer: Answer) -> Result<&AnswerResult, SessionError> {
        self.expect_phase(Phase::Presenting, "answer")?;

        let question = &self.questions[self.current_index];
        let is_correct = question
            .check(&answer)
            .ok_or(SessionError::AnswerKindMismatch)?;

        let result = AnswerResult {
            prompt_snapshot: question.prompt().to_string(),
            selected_answer: answer.to_string(),
            correct_answer: question.correct_answer().to_string(),
            is_correct,
            explanation: question.explanation().map(str::to_string),
            full_text: question.full_text().map(str::to_string),
        };

        if is_correct {
            self.score += 1;
        }
        self.results.push(result);
        self.enter(Phase::Resolving);

        Ok(&self.results[self.results.len() - 1])
    }

    /// Resolving -> Presenting (next question) or Finished.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        self.expect_phase(Phase::Resolving, "move on")?;

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.enter(Phase::Presenting);
            Ok(Advance::Next {
                index: self.current_index,
            })
        } else {
            self.enter(Phase::Finished);
            Ok(Advance::Finished(self.payload()))
        }
    }

    /// Back to Setup from any phase. Nothing is persisted and any load in
    /// flight becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.phase = Phase::Setup;
        self.settings = None;
        self.questions.clear();
        self.current_index = 0;
        self.score = 0;
        self.results.clear();
        self.notice = None;
        self.failure = None;
        self.trace = vec![Phase::Setup];
    }

    fn payload(&self) -> ResultsPayload {
        ResultsPayload {
            score: self.score,
            total_questions: self.questions.len() as u32,
            results: self.results.clone(),
            topic: self
                .settings
                .as_ref()
                .map(|s| s.topic.clone())
                .unwrap_or_default(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            mode: self.mode,
            phase: self.phase,
            topic: self.settings.as_ref().map(|s| s.topic.clone()),
            current_index: self.current_index,
            total_questions: self.questions.len(),
            score: self.score,
            question: self.current_question().map(Question::to_public),
            last_result: match self.phase {
                Phase::Resolving => self.results.last().cloned(),
                _ => None,
            },
            notice: self.notice.clone(),
            failure: self.failure.clone(),
            final_results: match self.phase {
                Phase::Finished => Some(self.payload()),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        mode::Difficulty,
        question::QuestionKind,
    };

    fn tf(id: &str, truth: bool) -> Question {
        Question {
            id: id.to_string(),
            topic: "Kings".to_string(),
            difficulty: Difficulty::Easy,
            image_hint: None,
            kind: QuestionKind::TrueFalse {
                statement: format!("Statement {}", id),
                correct_answer: truth,
                explanation: Some(format!("Because {}", id)),
            },
        }
    }

    fn settings(n: u32) -> QuizSettings {
        QuizSettings {
            topic: "Kings".to_string(),
            difficulty: Difficulty::Any,
            number_of_questions: n,
        }
    }

    fn acquired(questions: Vec<Question>) -> Result<Acquired, AcquireError> {
        Ok(Acquired {
            questions,
            notice: None,
            repaired: 0,
            discarded: 0,
            from_fallback: 0,
        })
    }

    fn started(questions: Vec<Question>) -> QuizSession {
        let n = questions.len() as u32;
        let mut session = QuizSession::new(GameMode::TrueFalse);
        let ticket = session.submit_settings(settings(n)).unwrap();
        assert_eq!(session.complete_loading(&ticket, acquired(questions)), LoadStatus::Started);
        session
    }

    /// Answers every question with `true` and returns the final payload.
    fn play_through(session: &mut QuizSession) -> ResultsPayload {
        loop {
            session.submit_answer(Answer::Boolean(true)).unwrap();
            match session.advance().unwrap() {
                Advance::Next { .. } => continue,
                Advance::Finished(payload) => return payload,
            }
        }
    }

    #[test]
    fn test_full_game_scores_and_logs_in_order() {
        let mut session = started(vec![tf("1", true), tf("2", false), tf("3", true)]);
        let payload = play_through(&mut session);

        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(payload.total_questions, 3);
        assert_eq!(payload.score, 2);
        assert_eq!(payload.topic, "Kings");

        let snapshots: Vec<&str> = payload.results.iter().map(|r| r.prompt_snapshot.as_str()).collect();
        assert_eq!(snapshots, vec!["Statement 1", "Statement 2", "Statement 3"]);
        assert_eq!(payload.results.len(), session.questions().len());
        assert_eq!(
            payload.score as usize,
            payload.results.iter().filter(|r| r.is_correct).count()
        );
        assert_eq!(payload.results[1].correct_answer, "false");
        assert_eq!(payload.results[1].selected_answer, "true");
    }

    #[test]
    fn test_finished_is_reported_once() {
        let mut session = started(vec![tf("1", true)]);
        play_through(&mut session);

        assert_eq!(
            session.advance(),
            Err(SessionError::InvalidTransition {
                phase: Phase::Finished,
                action: "move on"
            })
        );
    }

    #[test]
    fn test_empty_load_returns_to_setup() {
        let mut session = QuizSession::new(GameMode::TrueFalse);
        let ticket = session.submit_settings(settings(5)).unwrap();
        assert_eq!(session.phase(), Phase::Loading);

        let status = session.complete_loading(
            &ticket,
            Err(AcquireError::NoQuestions {
                mode: GameMode::TrueFalse,
                topic: "Kings".to_string(),
            }),
        );

        assert!(matches!(status, LoadStatus::Failed(_)));
        assert_eq!(session.phase(), Phase::Setup);
        assert!(session.failure().is_some());
        assert!(!session.trace().contains(&Phase::Presenting));

        let status = {
            let ticket = session.submit_settings(settings(5)).unwrap();
            session.complete_loading(&ticket, acquired(Vec::new()))
        };
        assert!(matches!(status, LoadStatus::Failed(_)));
        assert_eq!(session.phase(), Phase::Setup);
    }

    #[test]
    fn test_reset_during_load_discards_late_result() {
        let mut session = QuizSession::new(GameMode::TrueFalse);
        let ticket = session.submit_settings(settings(1)).unwrap();

        session.reset();
        assert_eq!(
            session.complete_loading(&ticket, acquired(vec![tf("1", true)])),
            LoadStatus::Stale
        );
        assert_eq!(session.phase(), Phase::Setup);
        assert!(session.questions().is_empty());

        // A newer load is not disturbed by the old ticket either.
        let fresh = session.submit_settings(settings(1)).unwrap();
        assert_eq!(
            session.complete_loading(&ticket, acquired(vec![tf("old", true)])),
            LoadStatus::Stale
        );
        assert_eq!(session.phase(), Phase::Loading);
        assert_eq!(
            session.complete_loading(&fresh, acquired(vec![tf("new", true)])),
            LoadStatus::Started
        );
        assert_eq!(session.questions()[0].id, "new");
    }

    #[test]
    fn test_transitions_out_of_order_are_rejected() {
        let mut session = QuizSession::new(GameMode::TrueFalse);
        assert!(session.submit_answer(Answer::Boolean(true)).is_err());
        assert!(session.advance().is_err());

        let mut session = started(vec![tf("1", true), tf("2", true)]);
        assert!(session.advance().is_err());
        assert!(session.submit_settings(settings(2)).is_err());

        session.submit_answer(Answer::Boolean(true)).unwrap();
        assert!(session.submit_answer(Answer::Boolean(true)).is_err());
        assert_eq!(session.results().len(), 1);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_wrong_answer_kind_keeps_presenting() {
        let mut session = started(vec![tf("1", true)]);
        assert_eq!(
            session.submit_answer(Answer::Text("true".to_string())),
            Err(SessionError::AnswerKindMismatch)
        );
        assert_eq!(session.phase(), Phase::Presenting);
        assert!(session.results().is_empty());
    }

    #[test]
    fn test_invalid_settings_stay_in_setup() {
        let mut session = QuizSession::new(GameMode::Quiz);
        assert!(matches!(
            session.submit_settings(settings(0)),
            Err(SessionError::InvalidSettings(_))
        ));
        assert!(matches!(
            session.submit_settings(settings(21)),
            Err(SessionError::InvalidSettings(_))
        ));
        assert_eq!(session.phase(), Phase::Setup);
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_reset_then_replay_is_identical() {
        let questions = vec![tf("1", true), tf("2", false)];

        let mut session = started(questions.clone());
        let first_payload = play_through(&mut session);
        let first_trace = session.trace().to_vec();

        session.reset();
        let ticket = session.submit_settings(settings(2)).unwrap();
        session.complete_loading(&ticket, acquired(questions));
        let second_payload = play_through(&mut session);

        assert_eq!(session.trace(), first_trace.as_slice());
        assert_eq!(second_payload, first_payload);
        assert_eq!(
            first_trace,
            vec![
                Phase::Setup,
                Phase::Loading,
                Phase::Presenting,
                Phase::Resolving,
                Phase::Presenting,
                Phase::Resolving,
                Phase::Finished
            ]
        );
    }

    #[test]
    fn test_view_hides_answer_until_resolved() {
        let mut session = started(vec![tf("1", true)]);
        let view = session.view();
        assert_eq!(view.phase, Phase::Presenting);
        assert!(view.question.is_some());
        assert!(view.last_result.is_none());

        session.submit_answer(Answer::Boolean(false)).unwrap();
        let view = session.view();
        let result = view.last_result.unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.explanation.as_deref(), Some("Because 1"));

        session.advance().unwrap();
        assert_eq!(session.view().final_results.unwrap().score, 0);
    }
}
