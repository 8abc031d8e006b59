// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        mode::{GameMode, QuizSettings},
        question::Answer,
    },
    services::game::GameService,
    utils::jwt::Claims,
};

/// DTO for answering the current question.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    /// Selected option or typed reference, or a boolean for true/false.
    pub answer: Answer,
}

/// Starts a game of `mode` with the setup form's settings.
///
/// * Checks the caller's plan allows another game of this mode.
/// * Loads questions (generator first, built-in set as fallback).
/// * Returns the first question. 403 when over the limit, 404 when no
///   questions match, 409 when a game is already running.
pub async fn start_game(
    State(game): State<GameService>,
    Extension(claims): Extension<Claims>,
    Path(mode): Path<GameMode>,
    Json(settings): Json<QuizSettings>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = settings.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let view = game
        .start(&claims.sub, claims.plan.as_deref(), mode, settings)
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Current state of the caller's game. The answer stays hidden until resolved.
pub async fn get_session(
    State(game): State<GameService>,
    Extension(claims): Extension<Claims>,
    Path(mode): Path<GameMode>,
) -> impl IntoResponse {
    Json(game.view(&claims.sub, mode).await)
}

/// Scores an answer and reveals the correct one.
pub async fn submit_answer(
    State(game): State<GameService>,
    Extension(claims): Extension<Claims>,
    Path(mode): Path<GameMode>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = game.answer(&claims.sub, mode, req.answer).await?;
    Ok(Json(view))
}

/// Moves to the next question. On the last one the game ends and its results are stored.
pub async fn next_question(
    State(game): State<GameService>,
    Extension(claims): Extension<Claims>,
    Path(mode): Path<GameMode>,
) -> Result<impl IntoResponse, AppError> {
    let view = game.next(&claims.sub, mode).await?;
    Ok(Json(view))
}

/// Abandons the current game without storing anything.
pub async fn reset_game(
    State(game): State<GameService>,
    Extension(claims): Extension<Claims>,
    Path(mode): Path<GameMode>,
) -> impl IntoResponse {
    Json(game.reset(&claims.sub, mode).await)
}

/// Results of the caller's last finished game.
///
/// Missing or unreadable results redirect (303) to the mode's setup page.
pub async fn get_results(
    State(game): State<GameService>,
    Extension(claims): Extension<Claims>,
    Path(mode): Path<GameMode>,
) -> Response {
    match game.results(&claims.sub, mode).await {
        Ok(Some(payload)) => Json(payload).into_response(),
        Ok(None) => Redirect::to(&mode.setup_path()).into_response(),
        Err(e) => {
            tracing::warn!(
                "Cannot read {} results for user {}: {}",
                mode.slug(),
                claims.sub,
                e
            );
            Redirect::to(&mode.setup_path()).into_response()
        }
    }
}
