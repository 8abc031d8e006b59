// src/models/draft.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{
    mode::{Difficulty, GameMode},
    question::{Question, QuestionKind, options_are_valid, type_name_for},
};

/// A question as returned by a generator, before any checking.
///
/// Every field is optional so that one bad item never fails the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub image_hint: Option<String>,

    pub question: Option<String>,
    pub statement: Option<String>,
    pub verse_text: Option<String>,
    pub quote: Option<String>,

    pub options: Option<Vec<String>>,
    /// String for choice questions, boolean (or "true"/"false") for true/false.
    pub correct_answer: Option<Value>,
    pub reference: Option<String>,
    pub speaker: Option<String>,

    pub explanation: Option<String>,
    pub full_text: Option<String>,
    pub context: Option<String>,
}

/// Why a draft could not be turned into a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftRejection {
    MissingField(&'static str),
    WrongVariant { expected: GameMode, found: String },
    UnknownDifficulty(String),
    BadOptions(usize),
}

impl fmt::Display for DraftRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftRejection::MissingField(field) => write!(f, "missing field '{}'", field),
            DraftRejection::WrongVariant { expected, found } => write!(
                f,
                "expected a '{}' question, got '{}'",
                type_name_for(*expected),
                found
            ),
            DraftRejection::UnknownDifficulty(value) => write!(f, "unknown difficulty '{}'", value),
            DraftRejection::BadOptions(count) => {
                write!(f, "expected 4 non-blank options, got {}", count)
            }
        }
    }
}

/// A draft that passed checking. `repaired` is set when the correct answer
/// was not among the options and the first option was made correct.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedQuestion {
    pub question: Question,
    pub repaired: bool,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, DraftRejection> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DraftRejection::MissingField(field)),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn text_answer(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

fn bool_answer(value: Option<Value>) -> Option<bool> {
    match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Options of a choice question plus the answer, repaired if needed.
fn choice(
    options: Option<Vec<String>>,
    answer: Option<String>,
    answer_field: &'static str,
) -> Result<(Vec<String>, String, bool), DraftRejection> {
    let options = options.ok_or(DraftRejection::MissingField("options"))?;
    if !options_are_valid(&options) {
        return Err(DraftRejection::BadOptions(options.len()));
    }
    let answer = answer.ok_or(DraftRejection::MissingField(answer_field))?;

    if options.contains(&answer) {
        Ok((options, answer, false))
    } else {
        let first = options[0].clone();
        Ok((options, first, true))
    }
}

impl QuestionDraft {
    /// Checks the draft against the variant played by `mode`.
    ///
    /// `fallback_id` is used when the generator did not supply an id.
    pub fn check(self, mode: GameMode, fallback_id: String) -> Result<CheckedQuestion, DraftRejection> {
        if let Some(found) = self.question_type.as_deref() {
            if found != type_name_for(mode) {
                return Err(DraftRejection::WrongVariant {
                    expected: mode,
                    found: found.to_string(),
                });
            }
        }

        let id = non_blank(self.id).unwrap_or(fallback_id);
        let topic = required(self.topic, "topic")?;
        let difficulty_raw = required(self.difficulty, "difficulty")?;
        let difficulty = Difficulty::parse(&difficulty_raw)
            .ok_or(DraftRejection::UnknownDifficulty(difficulty_raw))?;

        let mut repaired = false;
        let kind = match mode {
            GameMode::Quiz => {
                let question = required(self.question, "question")?;
                let (options, correct_answer, fixed) = choice(
                    self.options,
                    text_answer(self.correct_answer),
                    "correctAnswer",
                )?;
                repaired = fixed;
                QuestionKind::MultipleChoice {
                    question,
                    options,
                    correct_answer,
                    explanation: non_blank(self.explanation),
                }
            }
            GameMode::TrueFalse => QuestionKind::TrueFalse {
                statement: required(self.statement, "statement")?,
                correct_answer: bool_answer(self.correct_answer)
                    .ok_or(DraftRejection::MissingField("correctAnswer"))?,
                explanation: non_blank(self.explanation),
            },
            GameMode::GuessTheVerse => QuestionKind::GuessReference {
                verse_text: required(self.verse_text, "verseText")?,
                reference: required(self.reference, "reference")?,
                full_text: non_blank(self.full_text),
                context: non_blank(self.context),
            },
            GameMode::WhoSaidIt => {
                let quote = required(self.quote, "quote")?;
                let (options, speaker, fixed) = choice(self.options, non_blank(self.speaker), "speaker")?;
                repaired = fixed;
                QuestionKind::Attribution {
                    quote,
                    options,
                    speaker,
                    context: non_blank(self.context),
                }
            }
        };

        Ok(CheckedQuestion {
            question: Question {
                id,
                topic,
                difficulty,
                image_hint: non_blank(self.image_hint),
                kind,
            },
            repaired,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> Option<Vec<String>> {
        Some(
            ["Peter", "Paul", "John", "James"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    fn attribution(speaker: &str) -> QuestionDraft {
        QuestionDraft {
            id: Some("a-1".to_string()),
            topic: Some("Acts".to_string()),
            difficulty: Some("medium".to_string()),
            quote: Some("Silver and gold have I none".to_string()),
            options: options(),
            speaker: Some(speaker.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_draft_passes_unchanged() {
        let checked = attribution("Peter").check(GameMode::WhoSaidIt, "gen-0".to_string()).unwrap();
        assert!(!checked.repaired);
        assert_eq!(checked.question.id, "a-1");
        assert!(checked.question.is_well_formed());
    }

    #[test]
    fn test_answer_outside_options_is_repaired_to_first_option() {
        let checked = attribution("Stephen").check(GameMode::WhoSaidIt, "gen-0".to_string()).unwrap();
        assert!(checked.repaired);
        match checked.question.kind {
            QuestionKind::Attribution { speaker, .. } => assert_eq!(speaker, "Peter"),
            other => panic!("unexpected variant {:?}", other),
        }
    }

    #[test]
    fn test_missing_fields_reject() {
        let mut draft = attribution("Peter");
        draft.quote = None;
        assert_eq!(
            draft.check(GameMode::WhoSaidIt, "gen-0".to_string()),
            Err(DraftRejection::MissingField("quote"))
        );

        let mut draft = attribution("Peter");
        draft.speaker = Some("  ".to_string());
        assert_eq!(
            draft.check(GameMode::WhoSaidIt, "gen-0".to_string()),
            Err(DraftRejection::MissingField("speaker"))
        );
    }

    #[test]
    fn test_wrong_option_count_rejects() {
        let mut draft = attribution("Peter");
        draft.options = Some(vec!["Peter".to_string(), "Paul".to_string()]);
        assert_eq!(
            draft.check(GameMode::WhoSaidIt, "gen-0".to_string()),
            Err(DraftRejection::BadOptions(2))
        );
    }

    #[test]
    fn test_wrong_variant_rejects() {
        let mut draft = attribution("Peter");
        draft.question_type = Some("multipleChoice".to_string());
        assert!(matches!(
            draft.check(GameMode::WhoSaidIt, "gen-0".to_string()),
            Err(DraftRejection::WrongVariant { .. })
        ));
    }

    #[test]
    fn test_missing_id_takes_fallback() {
        let mut draft = attribution("Peter");
        draft.id = None;
        let checked = draft.check(GameMode::WhoSaidIt, "gen-7".to_string()).unwrap();
        assert_eq!(checked.question.id, "gen-7");
    }

    #[test]
    fn test_true_false_accepts_string_booleans() {
        let draft: QuestionDraft = serde_json::from_value(json!({
            "topic": "Daniel",
            "difficulty": "Easy",
            "statement": "Daniel survived the lions' den.",
            "correctAnswer": "TRUE"
        }))
        .unwrap();

        let checked = draft.check(GameMode::TrueFalse, "gen-0".to_string()).unwrap();
        assert_eq!(
            checked.question.kind,
            QuestionKind::TrueFalse {
                statement: "Daniel survived the lions' den.".to_string(),
                correct_answer: true,
                explanation: None,
            }
        );
    }

    #[test]
    fn test_unknown_difficulty_rejects() {
        let mut draft = attribution("Peter");
        draft.difficulty = Some("legendary".to_string());
        assert_eq!(
            draft.check(GameMode::WhoSaidIt, "gen-0".to_string()),
            Err(DraftRejection::UnknownDifficulty("legendary".to_string()))
        );
    }
}
