use axum::Json;
use axum::extract::{Path, State};
use kasboek_core::UserId;

use crate::dto::{AdvanceOnboardingRequest, OnboardingStateResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_onboarding_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<OnboardingStateResponse>> {
    let user_id = UserId::new(user_id)?;
    let tour = state.onboarding_store.load(&user_id).await;

    Ok(Json(OnboardingStateResponse::from(tour)))
}

pub async fn advance_onboarding_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<AdvanceOnboardingRequest>,
) -> ApiResult<Json<OnboardingStateResponse>> {
    let user_id = UserId::new(user_id)?;
    let tour = state
        .onboarding_store
        .advance_step(&user_id, payload.total_steps)
        .await?;

    Ok(Json(OnboardingStateResponse::from(tour)))
}

pub async fn complete_onboarding_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<OnboardingStateResponse>> {
    let user_id = UserId::new(user_id)?;
    let tour = state.onboarding_store.complete(&user_id).await;

    Ok(Json(OnboardingStateResponse::from(tour)))
}

pub async fn dismiss_onboarding_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<OnboardingStateResponse>> {
    let user_id = UserId::new(user_id)?;
    let tour = state.onboarding_store.dismiss(&user_id).await;

    Ok(Json(OnboardingStateResponse::from(tour)))
}

pub async fn reset_onboarding_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<OnboardingStateResponse>> {
    let user_id = UserId::new(user_id)?;
    let tour = state.onboarding_store.reset(&user_id).await;

    Ok(Json(OnboardingStateResponse::from(tour)))
}
