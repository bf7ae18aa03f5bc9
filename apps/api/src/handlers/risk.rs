use axum::Json;
use axum::extract::State;
use kasboek_core::AppError;
use kasboek_domain::ClientStatusSignals;

use crate::dto::{PrioritizeClientsRequest, PrioritizedClientsResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn prioritize_clients_handler(
    State(state): State<AppState>,
    Json(payload): Json<PrioritizeClientsRequest>,
) -> ApiResult<Json<PrioritizedClientsResponse>> {
    let signals = payload
        .clients
        .into_iter()
        .map(ClientStatusSignals::try_from)
        .collect::<Result<Vec<_>, AppError>>()?;

    let prioritization = state.prioritization_service.prioritize(signals);

    Ok(Json(PrioritizedClientsResponse::from(prioritization)))
}
