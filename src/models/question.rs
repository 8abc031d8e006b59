// src/models/question.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::mode::{Difficulty, GameMode, QuizSettings};

/// Number of options every choice-based question carries.
pub const OPTION_COUNT: usize = 4;

/// A playable question of any variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique within one game.
    pub id: String,

    pub topic: String,

    pub difficulty: Difficulty,

    /// Short description used to generate an illustration, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hint: Option<String>,

    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// Variant-specific payload, discriminated by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum QuestionKind {
    MultipleChoice {
        question: String,
        options: Vec<String>,
        correct_answer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
    TrueFalse {
        statement: String,
        correct_answer: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
    GuessReference {
        verse_text: String,
        reference: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        full_text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
    },
    Attribution {
        quote: String,
        options: Vec<String>,
        speaker: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
    },
}

impl QuestionKind {
    /// The game mode that plays this variant.
    pub fn mode(&self) -> GameMode {
        match self {
            QuestionKind::MultipleChoice { .. } => GameMode::Quiz,
            QuestionKind::TrueFalse { .. } => GameMode::TrueFalse,
            QuestionKind::GuessReference { .. } => GameMode::GuessTheVerse,
            QuestionKind::Attribution { .. } => GameMode::WhoSaidIt,
        }
    }

    /// Wire name of the variant, as found in the `type` field.
    pub fn type_name(&self) -> &'static str {
        type_name_for(self.mode())
    }
}

pub fn type_name_for(mode: GameMode) -> &'static str {
    match mode {
        GameMode::Quiz => "multipleChoice",
        GameMode::TrueFalse => "trueFalse",
        GameMode::GuessTheVerse => "guessReference",
        GameMode::WhoSaidIt => "attribution",
    }
}

/// A player's answer. Text for choice and reference questions, a boolean for true/false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Boolean(bool),
    Text(String),
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Boolean(value) => write!(f, "{}", value),
            Answer::Text(value) => f.write_str(value),
        }
    }
}

impl Question {
    pub fn mode(&self) -> GameMode {
        self.kind.mode()
    }

    /// The text shown to the player: question, statement, verse or quote.
    pub fn prompt(&self) -> &str {
        match &self.kind {
            QuestionKind::MultipleChoice { question, .. } => question,
            QuestionKind::TrueFalse { statement, .. } => statement,
            QuestionKind::GuessReference { verse_text, .. } => verse_text,
            QuestionKind::Attribution { quote, .. } => quote,
        }
    }

    pub fn options(&self) -> Option<&[String]> {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. }
            | QuestionKind::Attribution { options, .. } => Some(options),
            _ => None,
        }
    }

    pub fn correct_answer(&self) -> Answer {
        match &self.kind {
            QuestionKind::MultipleChoice { correct_answer, .. } => {
                Answer::Text(correct_answer.clone())
            }
            QuestionKind::TrueFalse { correct_answer, .. } => Answer::Boolean(*correct_answer),
            QuestionKind::GuessReference { reference, .. } => Answer::Text(reference.clone()),
            QuestionKind::Attribution { speaker, .. } => Answer::Text(speaker.clone()),
        }
    }

    pub fn explanation(&self) -> Option<&str> {
        match &self.kind {
            QuestionKind::MultipleChoice { explanation, .. }
            | QuestionKind::TrueFalse { explanation, .. } => explanation.as_deref(),
            QuestionKind::GuessReference { context, .. }
            | QuestionKind::Attribution { context, .. } => context.as_deref(),
        }
    }

    pub fn full_text(&self) -> Option<&str> {
        match &self.kind {
            QuestionKind::GuessReference { full_text, .. } => full_text.as_deref(),
            _ => None,
        }
    }

    /// Exact comparison against the correct answer.
    ///
    /// Returns `None` when the answer is the wrong kind for this question
    /// (a boolean for a text question or the reverse).
    pub fn check(&self, answer: &Answer) -> Option<bool> {
        match (self.correct_answer(), answer) {
            (Answer::Boolean(expected), Answer::Boolean(given)) => Some(expected == *given),
            (Answer::Text(expected), Answer::Text(given)) => Some(&expected == given),
            _ => None,
        }
    }

    /// Required text present and, for choice variants, exactly four options
    /// with the correct answer among them.
    pub fn is_well_formed(&self) -> bool {
        if self.id.trim().is_empty() || self.topic.trim().is_empty() || self.prompt().trim().is_empty()
        {
            return false;
        }

        match &self.kind {
            QuestionKind::MultipleChoice {
                options,
                correct_answer,
                ..
            } => options_are_valid(options) && options.contains(correct_answer),
            QuestionKind::Attribution {
                options, speaker, ..
            } => options_are_valid(options) && options.contains(speaker),
            QuestionKind::GuessReference { reference, .. } => !reference.trim().is_empty(),
            QuestionKind::TrueFalse { .. } => true,
        }
    }

    pub fn matches(&self, settings: &QuizSettings) -> bool {
        settings.admits(&self.topic, self.difficulty)
    }

    /// Copy of the question safe to send while it is still unanswered.
    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id.clone(),
            question_type: self.kind.type_name(),
            topic: self.topic.clone(),
            difficulty: self.difficulty,
            image_hint: self.image_hint.clone(),
            prompt: self.prompt().to_string(),
            options: self.options().map(|o| o.to_vec()),
        }
    }
}

pub(crate) fn options_are_valid(options: &[String]) -> bool {
    options.len() == OPTION_COUNT && options.iter().all(|o| !o.trim().is_empty())
}

/// DTO for sending a question to the player (excludes the answer and explanation).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: &'static str,
    pub topic: String,
    pub difficulty: Difficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_hint: Option<String>,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}
