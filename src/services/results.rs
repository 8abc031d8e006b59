// src/services/results.rs

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::{
    models::session::ResultsPayload,
    store::{KeyValueStore, StoreError},
};

#[derive(Debug)]
pub enum ResultsError {
    Store(StoreError),
    /// Something is stored under the key but it is not a results payload.
    Corrupt(String),
}

impl fmt::Display for ResultsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultsError::Store(e) => write!(f, "{}", e),
            ResultsError::Corrupt(msg) => write!(f, "stored results are unreadable: {}", msg),
        }
    }
}

impl std::error::Error for ResultsError {}

impl From<StoreError> for ResultsError {
    fn from(err: StoreError) -> Self {
        ResultsError::Store(err)
    }
}

/// Where finished games are written for the results page to pick up.
#[async_trait]
pub trait ResultsSink: Send + Sync {
    async fn persist(&self, key: &str, payload: &ResultsPayload) -> Result<(), ResultsError>;

    async fn load(&self, key: &str) -> Result<Option<ResultsPayload>, ResultsError>;
}

/// Results kept as JSON in a key-value store.
#[derive(Clone)]
pub struct StoreResultsSink {
    store: Arc<dyn KeyValueStore>,
}

impl StoreResultsSink {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResultsSink for StoreResultsSink {
    async fn persist(&self, key: &str, payload: &ResultsPayload) -> Result<(), ResultsError> {
        let json =
            serde_json::to_string(payload).map_err(|e| ResultsError::Corrupt(e.to_string()))?;
        self.store.set(key, &json).await?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<ResultsPayload>, ResultsError> {
        match self.store.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| ResultsError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::session::AnswerResult, store::MemoryStore};

    #[tokio::test]
    async fn test_payload_is_stored_in_results_page_shape() {
        let store = Arc::new(MemoryStore::new());
        let sink = StoreResultsSink::new(store.clone());
        let payload = ResultsPayload {
            score: 1,
            total_questions: 1,
            results: vec![AnswerResult {
                prompt_snapshot: "Who built the ark?".to_string(),
                selected_answer: "Noah".to_string(),
                correct_answer: "Noah".to_string(),
                is_correct: true,
                explanation: None,
                full_text: None,
            }],
            topic: "Genesis".to_string(),
        };

        sink.persist("results_quiz_u1", &payload).await.unwrap();

        let raw = store.get("results_quiz_u1").await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["totalQuestions"], 1);
        assert_eq!(json["results"][0]["isCorrect"], true);
        assert_eq!(json["results"][0]["promptSnapshot"], "Who built the ark?");

        assert_eq!(sink.load("results_quiz_u1").await.unwrap(), Some(payload));
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_results() {
        let store = Arc::new(MemoryStore::new());
        let sink = StoreResultsSink::new(store.clone());
        assert_eq!(sink.load("results_quiz_u1").await.unwrap(), None);

        store.set("results_quiz_u1", "[1, 2").await.unwrap();
        assert!(matches!(
            sink.load("results_quiz_u1").await,
            Err(ResultsError::Corrupt(_))
        ));
    }
}
