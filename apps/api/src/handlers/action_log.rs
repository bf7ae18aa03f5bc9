use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use kasboek_core::AppError;
use kasboek_domain::{BulkOperationResult, ReminderInfo, VatPeriod};

use crate::dto::{ActionLogEntryResponse, LogBulkOperationRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_action_log_handler(
    State(state): State<AppState>,
) -> Json<Vec<ActionLogEntryResponse>> {
    let entries = state
        .action_log_store
        .entries()
        .await
        .into_iter()
        .map(ActionLogEntryResponse::from)
        .collect();

    Json(entries)
}

pub async fn get_action_log_entry_handler(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> ApiResult<Json<ActionLogEntryResponse>> {
    let entry = state
        .action_log_store
        .get_entry(entry_id.as_str())
        .await
        .ok_or_else(|| AppError::NotFound(format!("action log entry '{entry_id}' not found")))?;

    Ok(Json(ActionLogEntryResponse::from(entry)))
}

pub async fn log_bulk_operation_handler(
    State(state): State<AppState>,
    Json(payload): Json<LogBulkOperationRequest>,
) -> ApiResult<(StatusCode, Json<ActionLogEntryResponse>)> {
    let result = BulkOperationResult::try_from(payload.result)?;
    let vat_period = payload.vat_period.map(VatPeriod::try_from).transpose()?;
    let reminder_info = payload
        .reminder_info
        .map(ReminderInfo::try_from)
        .transpose()?;

    let entry = state
        .action_log_store
        .log_bulk_operation(result, vat_period, reminder_info)
        .await;

    Ok((StatusCode::CREATED, Json(ActionLogEntryResponse::from(entry))))
}

pub async fn clear_action_log_handler(State(state): State<AppState>) -> StatusCode {
    state.action_log_store.clear_log().await;
    StatusCode::NO_CONTENT
}
