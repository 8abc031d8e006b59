// src/models/session.rs

use serde::{Deserialize, Serialize};

use crate::models::{mode::GameMode, question::PublicQuestion};

/// Where a game currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Setup,
    Loading,
    Presenting,
    Resolving,
    Finished,
}

/// Outcome of one answered question. Never modified once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    /// Question text, verse or quote as shown when the answer was given.
    pub prompt_snapshot: String,
    pub selected_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}

/// What the results page reads back. The shape is a contract with that page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsPayload {
    pub score: u32,
    pub total_questions: u32,
    pub results: Vec<AnswerResult>,
    pub topic: String,
}

/// Snapshot of a session for the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub mode: GameMode,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub current_index: usize,
    pub total_questions: usize,
    pub score: u32,
    /// Present while presenting or resolving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<PublicQuestion>,
    /// Present while resolving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_result: Option<AnswerResult>,
    /// Informational message, e.g. fallback questions were used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Why the last attempt to start a game failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Present once finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_results: Option<ResultsPayload>,
}
