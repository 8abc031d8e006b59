// src/models/mode.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::MAX_QUESTIONS_PER_GAME;

/// Topic value that disables topic filtering.
pub const ALL_TOPICS: &str = "All Topics";

/// The quiz variants offered by the app.
/// Serialized as the URL slug, which doubles as the gated feature key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    /// Four-option multiple choice.
    Quiz,
    TrueFalse,
    /// Given a verse, name its reference.
    GuessTheVerse,
    /// Given a quote, pick who said it.
    WhoSaidIt,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::Quiz,
        GameMode::TrueFalse,
        GameMode::GuessTheVerse,
        GameMode::WhoSaidIt,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            GameMode::Quiz => "quiz",
            GameMode::TrueFalse => "true-false",
            GameMode::GuessTheVerse => "guess-the-verse",
            GameMode::WhoSaidIt => "who-said-it",
        }
    }

    pub fn feature_key(self) -> &'static str {
        self.slug()
    }

    /// Entry page of the mode, where a player lands when there is nothing to show.
    pub fn setup_path(self) -> String {
        format!("/{}", self.slug())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Disables difficulty filtering.
    #[default]
    Any,
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Any => "any",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "any" => Some(Difficulty::Any),
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Choices made on the setup form. Fixed for the life of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizSettings {
    #[validate(length(min = 1, max = 100), custom(function = validate_topic))]
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[validate(range(min = 1, max = MAX_QUESTIONS_PER_GAME))]
    pub number_of_questions: u32,
}

fn validate_topic(topic: &str) -> Result<(), validator::ValidationError> {
    if topic.trim().is_empty() {
        return Err(validator::ValidationError::new("topic_cannot_be_blank"));
    }
    Ok(())
}

impl QuizSettings {
    /// Whether a question with this topic and difficulty belongs in the game.
    pub fn admits(&self, topic: &str, difficulty: Difficulty) -> bool {
        let topic_ok = self.topic == ALL_TOPICS || self.topic == topic;
        let difficulty_ok = self.difficulty == Difficulty::Any || self.difficulty == difficulty;
        topic_ok && difficulty_ok
    }
}
