// src/handlers/usage.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{mode::GameMode, usage::is_valid_feature_key},
    services::game::GameService,
    utils::jwt::Claims,
};

/// Accepts only features some plan lists.
fn check_feature_key(game: &GameService, feature: &str) -> Result<(), AppError> {
    if !is_valid_feature_key(feature) {
        return Err(AppError::BadRequest(format!("Invalid feature key '{}'", feature)));
    }
    if !game.tracker().plans().knows(feature) {
        return Err(AppError::NotFound(format!("Unknown feature '{}'", feature)));
    }
    Ok(())
}

fn is_game_mode(feature: &str) -> bool {
    GameMode::ALL.iter().any(|mode| mode.feature_key() == feature)
}

/// How much of `feature` the caller has left in the current period.
pub async fn get_usage(
    State(game): State<GameService>,
    Extension(claims): Extension<Claims>,
    Path(feature): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    check_feature_key(&game, &feature)?;

    let status = game
        .tracker()
        .usage_status(&claims.sub, &feature, claims.plan.as_deref())
        .await;

    Ok(Json(status))
}

/// Consumes one use of `feature` (e.g. an illustration or a generated prayer).
///
/// Quiz modes are consumed by starting a game, not here. 403 when the plan's
/// allowance is used up. The check and the write are not atomic; see
/// [`crate::services::entitlement::EntitlementTracker`].
pub async fn consume_usage(
    State(game): State<GameService>,
    Extension(claims): Extension<Claims>,
    Path(feature): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    check_feature_key(&game, &feature)?;
    if is_game_mode(&feature) {
        return Err(AppError::BadRequest(format!(
            "'{}' is counted when a game starts",
            feature
        )));
    }

    let tracker = game.tracker();
    let plan = claims.plan.as_deref();

    if !tracker.can_use(&claims.sub, &feature, plan).await {
        return Err(AppError::Forbidden(format!(
            "You have reached your '{}' limit for now. Upgrade your plan or come back later.",
            feature
        )));
    }

    tracker.record_usage(&claims.sub, &feature).await;

    Ok(Json(tracker.usage_status(&claims.sub, &feature, plan).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_quiz_slugs_are_game_modes() {
        assert!(is_game_mode("true-false"));
        assert!(is_game_mode("who-said-it"));
        assert!(!is_game_mode("image-generation"));
        assert!(!is_game_mode("prayer-generation"));
    }
}
