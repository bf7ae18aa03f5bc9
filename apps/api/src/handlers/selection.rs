use axum::Json;
use axum::extract::State;
use kasboek_core::{AppError, ClientId};

use crate::dto::{
    SelectFailedClientsRequest, SelectionClientRequest, SelectionClientsRequest,
    SelectionResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_selection_handler(State(state): State<AppState>) -> Json<SelectionResponse> {
    Json(SelectionResponse::from(state.selection_store.snapshot().await))
}

pub async fn replace_selection_handler(
    State(state): State<AppState>,
    Json(payload): Json<SelectionClientsRequest>,
) -> ApiResult<Json<SelectionResponse>> {
    let client_ids = parse_client_ids(payload.client_ids)?;
    let snapshot = state.selection_store.select_all(client_ids).await;

    Ok(Json(SelectionResponse::from(snapshot)))
}

pub async fn add_to_selection_handler(
    State(state): State<AppState>,
    Json(payload): Json<SelectionClientsRequest>,
) -> ApiResult<Json<SelectionResponse>> {
    let client_ids = parse_client_ids(payload.client_ids)?;
    let snapshot = state.selection_store.select_many(client_ids).await;

    Ok(Json(SelectionResponse::from(snapshot)))
}

pub async fn toggle_selection_handler(
    State(state): State<AppState>,
    Json(payload): Json<SelectionClientRequest>,
) -> ApiResult<Json<SelectionResponse>> {
    let client_id = ClientId::new(payload.client_id)?;
    let snapshot = state
        .selection_store
        .toggle_select(client_id.as_str())
        .await;

    Ok(Json(SelectionResponse::from(snapshot)))
}

pub async fn remove_from_selection_handler(
    State(state): State<AppState>,
    Json(payload): Json<SelectionClientRequest>,
) -> ApiResult<Json<SelectionResponse>> {
    let client_id = ClientId::new(payload.client_id)?;
    let snapshot = state
        .selection_store
        .remove_from_selection(client_id.as_str())
        .await;

    Ok(Json(SelectionResponse::from(snapshot)))
}

pub async fn select_only_failed_handler(
    State(state): State<AppState>,
    Json(payload): Json<SelectFailedClientsRequest>,
) -> ApiResult<Json<SelectionResponse>> {
    let entry = state
        .action_log_store
        .get_entry(payload.entry_id.as_str())
        .await
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "action log entry '{}' not found",
                payload.entry_id
            ))
        })?;

    let snapshot = state
        .selection_store
        .select_only_failed(entry.failed_client_ids())
        .await;

    Ok(Json(SelectionResponse::from(snapshot)))
}

pub async fn clear_selection_handler(State(state): State<AppState>) -> Json<SelectionResponse> {
    Json(SelectionResponse::from(
        state.selection_store.clear_all().await,
    ))
}

fn parse_client_ids(client_ids: Vec<String>) -> Result<Vec<ClientId>, AppError> {
    client_ids.into_iter().map(ClientId::new).collect()
}
