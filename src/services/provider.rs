// src/services/provider.rs

use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::models::{
    draft::QuestionDraft,
    mode::{Difficulty, GameMode},
};

/// Why a generator produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// No generator is configured.
    Unavailable,
    /// Network failure, timeout or non-success status.
    Transport(String),
    /// The response did not have the expected shape.
    Malformed(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Unavailable => write!(f, "question generator is not configured"),
            ProviderError::Transport(msg) => write!(f, "question generator unreachable: {}", msg),
            ProviderError::Malformed(msg) => write!(f, "question generator response malformed: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Primary source of questions (typically an AI generator).
///
/// Results may be partial or contain malformed items; callers check every draft.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    async fn generate(
        &self,
        mode: GameMode,
        topic: &str,
        difficulty: Difficulty,
        count: u32,
    ) -> Result<Vec<QuestionDraft>, ProviderError>;
}

/// Stand-in used when no generator endpoint is configured.
/// Every request fails, so games are served from the fallback set.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableProvider;

#[async_trait]
impl QuestionProvider for UnavailableProvider {
    async fn generate(
        &self,
        _mode: GameMode,
        _topic: &str,
        _difficulty: Difficulty,
        _count: u32,
    ) -> Result<Vec<QuestionDraft>, ProviderError> {
        Err(ProviderError::Unavailable)
    }
}

/// Body posted to the generator service.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    mode: GameMode,
    topic: &'a str,
    difficulty: Difficulty,
    count: u32,
}

/// The generator may answer with a bare array or wrap it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Wrapped { questions: Vec<Value> },
    Bare(Vec<Value>),
}

/// Calls an HTTP question-generation service.
#[derive(Debug, Clone)]
pub struct HttpQuestionProvider {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpQuestionProvider {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self { client, endpoint })
    }
}

/// Keeps every item that has the draft shape; drops the rest with a warning.
fn parse_drafts(items: Vec<Value>) -> Vec<QuestionDraft> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(draft) => Some(draft),
            Err(e) => {
                tracing::warn!("Dropping generated item {}: {}", i, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl QuestionProvider for HttpQuestionProvider {
    async fn generate(
        &self,
        mode: GameMode,
        topic: &str,
        difficulty: Difficulty,
        count: u32,
    ) -> Result<Vec<QuestionDraft>, ProviderError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&GenerateRequest {
                mode,
                topic,
                difficulty,
                count,
            })
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let items = match body {
            GenerateResponse::Wrapped { questions } => questions,
            GenerateResponse::Bare(items) => items,
        };

        Ok(parse_drafts(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_accepts_both_shapes() {
        let wrapped: GenerateResponse =
            serde_json::from_value(json!({"questions": [{"quote": "q"}]})).unwrap();
        assert!(matches!(wrapped, GenerateResponse::Wrapped { questions } if questions.len() == 1));

        let bare: GenerateResponse = serde_json::from_value(json!([{}, {}])).unwrap();
        assert!(matches!(bare, GenerateResponse::Bare(items) if items.len() == 2));
    }

    #[test]
    fn test_parse_drafts_skips_items_of_the_wrong_shape() {
        let drafts = parse_drafts(vec![
            json!({"question": "Who?", "options": ["a", "b", "c", "d"]}),
            json!({"options": "not a list"}),
            json!(42),
        ]);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].question.as_deref(), Some("Who?"));
    }

    #[tokio::test]
    async fn test_unavailable_provider_always_fails() {
        let result = UnavailableProvider
            .generate(GameMode::Quiz, "Genesis", Difficulty::Any, 5)
            .await;
        assert_eq!(result, Err(ProviderError::Unavailable));
    }

    #[tokio::test]
    async fn test_http_provider_reports_unreachable_endpoint() {
        let endpoint = Url::parse("http://127.0.0.1:9/generate").unwrap();
        let provider = HttpQuestionProvider::new(endpoint, Duration::from_millis(500)).unwrap();
        let result = provider
            .generate(GameMode::TrueFalse, "Exodus", Difficulty::Easy, 3)
            .await;
        assert!(matches!(result, Err(ProviderError::Transport(_))));
    }
}
