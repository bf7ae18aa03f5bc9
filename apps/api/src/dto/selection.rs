use kasboek_domain::SelectionSnapshot;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload naming one client.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/selection-client-request.ts"
)]
pub struct SelectionClientRequest {
    pub client_id: String,
}

/// Incoming payload naming several clients.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/selection-clients-request.ts"
)]
pub struct SelectionClientsRequest {
    pub client_ids: Vec<String>,
}

/// Incoming payload selecting the failed clients of a logged bulk operation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/select-failed-clients-request.ts"
)]
pub struct SelectFailedClientsRequest {
    pub entry_id: String,
}

/// API representation of the current client selection.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/selection-response.ts"
)]
pub struct SelectionResponse {
    pub client_ids: Vec<String>,
    pub count: usize,
    pub updated_at: String,
}

impl From<SelectionSnapshot> for SelectionResponse {
    fn from(value: SelectionSnapshot) -> Self {
        let updated_at = value.updated_at().to_rfc3339();
        let client_ids: Vec<String> = value.into_ids().into_iter().collect();

        Self {
            count: client_ids.len(),
            client_ids,
            updated_at,
        }
    }
}
