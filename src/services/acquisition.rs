// src/services/acquisition.rs

use std::{collections::HashSet, fmt, sync::Arc};

use crate::{
    models::{
        mode::{GameMode, QuizSettings},
        question::Question,
    },
    services::{fallback::FallbackSet, provider::QuestionProvider},
};

/// Notice shown when the generator failed and built-in questions were used.
pub const FALLBACK_NOTICE: &str =
    "Fresh questions could not be generated right now, so this game uses questions from our built-in set.";

/// Notice shown when the generator came up short and built-in questions filled the gap.
pub const BACKFILL_NOTICE: &str =
    "Some questions in this game come from our built-in set.";

/// Questions ready to play, plus bookkeeping about where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquired {
    pub questions: Vec<Question>,
    pub notice: Option<String>,
    /// Generated items whose correct answer was replaced by the first option.
    pub repaired: usize,
    /// Generated items that were dropped.
    pub discarded: usize,
    /// Items taken from the fallback set.
    pub from_fallback: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    /// Neither the generator nor the fallback set had a single usable question.
    NoQuestions { mode: GameMode, topic: String },
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::NoQuestions { mode, topic } => write!(
                f,
                "No {} questions are available for '{}'. Try another topic or difficulty.",
                mode.slug(),
                topic
            ),
        }
    }
}

impl std::error::Error for AcquireError {}

/// Generator first, fallback set second.
#[derive(Clone)]
pub struct QuestionSource {
    provider: Arc<dyn QuestionProvider>,
    fallback: Arc<FallbackSet>,
}

impl QuestionSource {
    pub fn new(provider: Arc<dyn QuestionProvider>, fallback: Arc<FallbackSet>) -> Self {
        Self { provider, fallback }
    }

    /// Gathers exactly `settings.number_of_questions` questions when enough exist.
    ///
    /// 1. Ask the generator for the full count.
    /// 2. Check each draft: drop malformed ones, duplicates and items outside
    ///    the requested topic or difficulty; repair choice items whose answer
    ///    is missing from the options.
    /// 3. Top up from the fallback set with the same filter, skipping known ids.
    /// 4. Fail if nothing is left; otherwise cut to the requested count.
    pub async fn acquire(
        &self,
        mode: GameMode,
        settings: &QuizSettings,
    ) -> Result<Acquired, AcquireError> {
        let wanted = settings.number_of_questions as usize;
        let mut questions: Vec<Question> = Vec::with_capacity(wanted);
        let mut ids: HashSet<String> = HashSet::new();
        let mut repaired = 0;
        let mut discarded = 0;
        let mut provider_failed = false;

        match self
            .provider
            .generate(
                mode,
                &settings.topic,
                settings.difficulty,
                settings.number_of_questions,
            )
            .await
        {
            Ok(drafts) => {
                for (i, draft) in drafts.into_iter().enumerate() {
                    match draft.check(mode, format!("gen-{}", i + 1)) {
                        Ok(checked) => {
                            if !checked.question.matches(settings) {
                                tracing::warn!(
                                    "Discarding generated question '{}': {} / {} was not requested",
                                    checked.question.id,
                                    checked.question.topic,
                                    checked.question.difficulty.as_str()
                                );
                                discarded += 1;
                                continue;
                            }
                            if !ids.insert(checked.question.id.clone()) {
                                tracing::warn!(
                                    "Discarding generated question with repeated id '{}'",
                                    checked.question.id
                                );
                                discarded += 1;
                                continue;
                            }
                            if checked.repaired {
                                tracing::warn!(
                                    "Generated question '{}' had an answer outside its options; using the first option",
                                    checked.question.id
                                );
                                repaired += 1;
                            }
                            questions.push(checked.question);
                        }
                        Err(reason) => {
                            tracing::warn!("Discarding generated question {}: {}", i + 1, reason);
                            discarded += 1;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Question generation failed for {}: {}", mode.slug(), e);
                provider_failed = true;
            }
        }

        let mut from_fallback = 0;
        if questions.len() < wanted {
            let missing = wanted - questions.len();
            let backfill: Vec<Question> = self
                .fallback
                .matching(mode, settings, &ids)
                .take(missing)
                .cloned()
                .collect();
            from_fallback = backfill.len();
            questions.extend(backfill);
        }

        if questions.is_empty() {
            return Err(AcquireError::NoQuestions {
                mode,
                topic: settings.topic.clone(),
            });
        }

        questions.truncate(wanted);

        let notice = if provider_failed {
            Some(FALLBACK_NOTICE.to_string())
        } else if from_fallback > 0 {
            Some(BACKFILL_NOTICE.to_string())
        } else {
            None
        };

        tracing::debug!(
            "Acquired {} {} questions ({} repaired, {} discarded, {} from fallback)",
            questions.len(),
            mode.slug(),
            repaired,
            discarded,
            from_fallback
        );

        Ok(Acquired {
            questions,
            notice,
            repaired,
            discarded,
            from_fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            draft::QuestionDraft,
            mode::{ALL_TOPICS, Difficulty},
        },
        services::provider::ProviderError,
    };
    use async_trait::async_trait;

    struct StubProvider(Result<Vec<QuestionDraft>, ProviderError>);

    #[async_trait]
    impl QuestionProvider for StubProvider {
        async fn generate(
            &self,
            _mode: GameMode,
            _topic: &str,
            _difficulty: Difficulty,
            _count: u32,
        ) -> Result<Vec<QuestionDraft>, ProviderError> {
            self.0.clone()
        }
    }

    fn draft(id: &str, answer: &str) -> QuestionDraft {
        QuestionDraft {
            id: Some(id.to_string()),
            topic: Some("Gospels".to_string()),
            difficulty: Some("easy".to_string()),
            question: Some(format!("Question {}", id)),
            options: Some(vec!["A".into(), "B".into(), "C".into(), "D".into()]),
            correct_answer: Some(serde_json::Value::String(answer.to_string())),
            ..Default::default()
        }
    }

    fn fallback_json(n: usize, topic: &str) -> String {
        let items: Vec<String> = (0..n)
            .map(|i| {
                format!(
                    r#"{{"id": "fb-{i}", "type": "multipleChoice", "topic": "{topic}", "difficulty": "easy",
                        "question": "Fallback {i}", "options": ["A", "B", "C", "D"], "correctAnswer": "A"}}"#
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    fn source(
        provider: Result<Vec<QuestionDraft>, ProviderError>,
        fallback: FallbackSet,
    ) -> QuestionSource {
        QuestionSource::new(Arc::new(StubProvider(provider)), Arc::new(fallback))
    }

    fn settings(n: u32) -> QuizSettings {
        QuizSettings {
            topic: "Gospels".to_string(),
            difficulty: Difficulty::Any,
            number_of_questions: n,
        }
    }

    #[tokio::test]
    async fn test_malformed_item_is_repaired_not_discarded() {
        let src = source(
            Ok(vec![draft("q1", "A"), draft("q2", "B"), draft("q3", "Z")]),
            FallbackSet::default(),
        );

        let acquired = src.acquire(GameMode::Quiz, &settings(3)).await.unwrap();
        assert_eq!(acquired.questions.len(), 3);
        assert_eq!(acquired.repaired, 1);
        assert_eq!(acquired.notice, None);

        let repaired = &acquired.questions[2];
        assert_eq!(repaired.id, "q3");
        assert_eq!(
            repaired.correct_answer(),
            crate::models::question::Answer::Text("A".to_string())
        );
        assert!(acquired.questions.iter().all(|q| q.is_well_formed()));
    }

    #[tokio::test]
    async fn test_provider_failure_uses_fallback_with_notice() {
        let fallback = FallbackSet::from_json(&fallback_json(4, "Gospels")).unwrap();
        let src = source(Err(ProviderError::Transport("timeout".into())), fallback);

        let acquired = src.acquire(GameMode::Quiz, &settings(4)).await.unwrap();
        assert_eq!(acquired.questions.len(), 4);
        assert_eq!(acquired.from_fallback, 4);
        assert_eq!(acquired.notice.as_deref(), Some(FALLBACK_NOTICE));
    }

    #[tokio::test]
    async fn test_short_generation_is_backfilled_without_repeating_ids() {
        let fallback = FallbackSet::from_json(&fallback_json(5, "Gospels")).unwrap();
        let src = source(Ok(vec![draft("fb-0", "A")]), fallback);

        let acquired = src.acquire(GameMode::Quiz, &settings(3)).await.unwrap();
        let ids: Vec<&str> = acquired.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["fb-0", "fb-1", "fb-2"]);
        assert_eq!(acquired.notice.as_deref(), Some(BACKFILL_NOTICE));
    }

    #[tokio::test]
    async fn test_result_never_exceeds_request() {
        let drafts = (0..8).map(|i| draft(&format!("q{}", i), "A")).collect();
        let src = source(Ok(drafts), FallbackSet::default());

        let acquired = src.acquire(GameMode::Quiz, &settings(5)).await.unwrap();
        assert_eq!(acquired.questions.len(), 5);
    }

    #[tokio::test]
    async fn test_fallback_respects_filter() {
        let fallback = FallbackSet::from_json(&fallback_json(3, "Psalms")).unwrap();
        let src = source(Err(ProviderError::Unavailable), fallback.clone());

        let err = src.acquire(GameMode::Quiz, &settings(3)).await.unwrap_err();
        assert_eq!(
            err,
            AcquireError::NoQuestions {
                mode: GameMode::Quiz,
                topic: "Gospels".to_string()
            }
        );

        let src = source(Err(ProviderError::Unavailable), fallback);
        let any = QuizSettings {
            topic: ALL_TOPICS.to_string(),
            ..settings(10)
        };
        let acquired = src.acquire(GameMode::Quiz, &any).await.unwrap();
        assert_eq!(acquired.questions.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicates_and_wrong_variants_are_discarded() {
        let mut wrong = draft("q9", "A");
        wrong.question_type = Some("trueFalse".to_string());
        let src = source(
            Ok(vec![draft("q1", "A"), draft("q1", "B"), wrong]),
            FallbackSet::default(),
        );

        let acquired = src.acquire(GameMode::Quiz, &settings(3)).await.unwrap();
        assert_eq!(acquired.questions.len(), 1);
        assert_eq!(acquired.discarded, 2);
    }

    #[tokio::test]
    async fn test_generated_items_outside_the_filter_are_discarded() {
        let mut off_topic = draft("q2", "A");
        off_topic.topic = Some("Psalms".to_string());
        let mut too_hard = draft("q3", "A");
        too_hard.difficulty = Some("hard".to_string());

        let easy = QuizSettings {
            difficulty: Difficulty::Easy,
            ..settings(3)
        };
        let src = source(
            Ok(vec![draft("q1", "A"), off_topic, too_hard]),
            FallbackSet::default(),
        );

        let acquired = src.acquire(GameMode::Quiz, &easy).await.unwrap();
        let ids: Vec<&str> = acquired.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1"]);
        assert_eq!(acquired.discarded, 2);
    }

    #[tokio::test]
    async fn test_length_is_min_of_requested_and_available() {
        for available in 0..5 {
            for requested in 1..5u32 {
                let fallback = FallbackSet::from_json(&fallback_json(available, "Gospels")).unwrap();
                let src = source(Err(ProviderError::Unavailable), fallback);
                let result = src.acquire(GameMode::Quiz, &settings(requested)).await;

                match result {
                    Ok(acquired) => {
                        assert_eq!(acquired.questions.len(), available.min(requested as usize))
                    }
                    Err(_) => assert_eq!(available, 0),
                }
            }
        }
    }
}
