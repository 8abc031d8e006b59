// src/services/fallback.rs

use std::{collections::HashSet, fmt};

use crate::models::{
    mode::{GameMode, QuizSettings},
    question::Question,
};

const BUILTIN_QUESTIONS: &str = include_str!("../../data/fallback_questions.json");

#[derive(Debug)]
pub enum FallbackError {
    Parse(String),
    Invalid(String),
    DuplicateId(String),
}

impl fmt::Display for FallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackError::Parse(msg) => write!(f, "fallback set is not valid JSON: {}", msg),
            FallbackError::Invalid(id) => write!(f, "fallback question '{}' is malformed", id),
            FallbackError::DuplicateId(id) => write!(f, "fallback question id '{}' is repeated", id),
        }
    }
}

impl std::error::Error for FallbackError {}

/// Hand-written questions used when the generator fails or comes up short.
#[derive(Debug, Clone, Default)]
pub struct FallbackSet {
    questions: Vec<Question>,
}

impl FallbackSet {
    /// The set compiled into the binary.
    pub fn builtin() -> Result<Self, FallbackError> {
        Self::from_json(BUILTIN_QUESTIONS)
    }

    /// Parses a JSON array of questions. Every item must be well formed and
    /// ids must be unique across the set.
    pub fn from_json(json: &str) -> Result<Self, FallbackError> {
        let questions: Vec<Question> =
            serde_json::from_str(json).map_err(|e| FallbackError::Parse(e.to_string()))?;
        Self::from_questions(questions)
    }

    pub fn from_questions(questions: Vec<Question>) -> Result<Self, FallbackError> {
        let mut seen = HashSet::new();
        for q in &questions {
            if !q.is_well_formed() {
                return Err(FallbackError::Invalid(q.id.clone()));
            }
            if !seen.insert(q.id.as_str()) {
                return Err(FallbackError::DuplicateId(q.id.clone()));
            }
        }
        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions of `mode` admitted by `settings`, in authored order,
    /// skipping any id in `exclude`.
    pub fn matching<'a>(
        &'a self,
        mode: GameMode,
        settings: &'a QuizSettings,
        exclude: &'a HashSet<String>,
    ) -> impl Iterator<Item = &'a Question> + 'a {
        self.questions.iter().filter(move |q| {
            q.mode() == mode && q.matches(settings) && !exclude.contains(&q.id)
        })
    }
}
