use chrono::NaiveDate;
use kasboek_core::{AppError, ClientId};
use kasboek_domain::{
    ActionLogEntry, BulkActionType, BulkOperationClientResult, BulkOperationResult, ClientResult,
    ClientResultStatus, ReminderInfo, ResultCounts, VatPeriod,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Bulk operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-action-type.ts"
)]
pub enum BulkActionTypeDto {
    Recalculate,
    AckYellow,
    GenerateVatDraft,
    SendReminders,
}

impl From<BulkActionType> for BulkActionTypeDto {
    fn from(value: BulkActionType) -> Self {
        match value {
            BulkActionType::Recalculate => Self::Recalculate,
            BulkActionType::AckYellow => Self::AckYellow,
            BulkActionType::GenerateVatDraft => Self::GenerateVatDraft,
            BulkActionType::SendReminders => Self::SendReminders,
        }
    }
}

impl From<BulkActionTypeDto> for BulkActionType {
    fn from(value: BulkActionTypeDto) -> Self {
        match value {
            BulkActionTypeDto::Recalculate => Self::Recalculate,
            BulkActionTypeDto::AckYellow => Self::AckYellow,
            BulkActionTypeDto::GenerateVatDraft => Self::GenerateVatDraft,
            BulkActionTypeDto::SendReminders => Self::SendReminders,
        }
    }
}

/// Per-client outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/client-result-status.ts"
)]
pub enum ClientResultStatusDto {
    Success,
    Failed,
    Skipped,
}

impl From<ClientResultStatus> for ClientResultStatusDto {
    fn from(value: ClientResultStatus) -> Self {
        match value {
            ClientResultStatus::Success => Self::Success,
            ClientResultStatus::Failed => Self::Failed,
            ClientResultStatus::Skipped => Self::Skipped,
        }
    }
}

impl From<ClientResultStatusDto> for ClientResultStatus {
    fn from(value: ClientResultStatusDto) -> Self {
        match value {
            ClientResultStatusDto::Success => Self::Success,
            ClientResultStatusDto::Failed => Self::Failed,
            ClientResultStatusDto::Skipped => Self::Skipped,
        }
    }
}

/// VAT filing quarter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/vat-period.ts"
)]
pub struct VatPeriodDto {
    pub year: i32,
    pub quarter: u8,
}

impl TryFrom<VatPeriodDto> for VatPeriod {
    type Error = AppError;

    fn try_from(value: VatPeriodDto) -> Result<Self, Self::Error> {
        Self::new(value.year, value.quarter)
    }
}

impl From<VatPeriod> for VatPeriodDto {
    fn from(value: VatPeriod) -> Self {
        Self {
            year: value.year(),
            quarter: value.quarter(),
        }
    }
}

/// Reminder batch details. `due_date` is formatted as `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/reminder-info.ts"
)]
pub struct ReminderInfoDto {
    pub reminder_type: String,
    pub title: String,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl TryFrom<ReminderInfoDto> for ReminderInfo {
    type Error = AppError;

    fn try_from(value: ReminderInfoDto) -> Result<Self, Self::Error> {
        let due_date = value
            .due_date
            .as_deref()
            .map(|date| {
                NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|error| {
                    AppError::Validation(format!("invalid due_date '{date}': {error}"))
                })
            })
            .transpose()?;

        Ok(Self {
            reminder_type: value.reminder_type,
            title: value.title,
            due_date,
        })
    }
}

impl From<&ReminderInfo> for ReminderInfoDto {
    fn from(value: &ReminderInfo) -> Self {
        Self {
            reminder_type: value.reminder_type.clone(),
            title: value.title.clone(),
            due_date: value
                .due_date
                .map(|date| date.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Backend outcome for one client of a bulk operation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-operation-client-result.ts"
)]
pub struct BulkOperationClientResultDto {
    pub client_id: String,
    pub client_name: String,
    pub status: ClientResultStatusDto,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Backend result of a bulk operation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/bulk-operation-result.ts"
)]
pub struct BulkOperationResultDto {
    pub action_type: BulkActionTypeDto,
    pub total_processed: u32,
    pub results: Vec<BulkOperationClientResultDto>,
}

impl TryFrom<BulkOperationResultDto> for BulkOperationResult {
    type Error = AppError;

    fn try_from(value: BulkOperationResultDto) -> Result<Self, Self::Error> {
        let results = value
            .results
            .into_iter()
            .map(|client| {
                Ok(BulkOperationClientResult {
                    client_id: ClientId::new(client.client_id)?,
                    client_name: client.client_name,
                    status: ClientResultStatus::from(client.status),
                    error_message: client.error_message,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(Self {
            action_type: BulkActionType::from(value.action_type),
            total_processed: value.total_processed,
            results,
        })
    }
}

/// Incoming payload for logging a finished bulk operation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/log-bulk-operation-request.ts"
)]
pub struct LogBulkOperationRequest {
    pub result: BulkOperationResultDto,
    #[serde(default)]
    pub vat_period: Option<VatPeriodDto>,
    #[serde(default)]
    pub reminder_info: Option<ReminderInfoDto>,
}

/// Per-status totals.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/result-counts-response.ts"
)]
pub struct ResultCountsResponse {
    pub success: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl From<ResultCounts> for ResultCountsResponse {
    fn from(value: ResultCounts) -> Self {
        Self {
            success: value.success,
            failed: value.failed,
            skipped: value.skipped,
        }
    }
}

/// Logged outcome for one client.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/client-result-response.ts"
)]
pub struct ClientResultResponse {
    pub client_id: String,
    pub name: String,
    pub status: ClientResultStatusDto,
    pub error_message: Option<String>,
}

impl From<&ClientResult> for ClientResultResponse {
    fn from(value: &ClientResult) -> Self {
        Self {
            client_id: value.client_id.to_string(),
            name: value.name.clone(),
            status: ClientResultStatusDto::from(value.status),
            error_message: value.error_message.clone(),
        }
    }
}

/// API representation of an action log entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/action-log-entry-response.ts"
)]
pub struct ActionLogEntryResponse {
    pub id: String,
    pub action_type: BulkActionTypeDto,
    pub timestamp: String,
    pub selected_count: u32,
    pub result_counts: ResultCountsResponse,
    pub client_results: Vec<ClientResultResponse>,
    pub vat_period: Option<VatPeriodDto>,
    pub reminder_info: Option<ReminderInfoDto>,
}

impl From<ActionLogEntry> for ActionLogEntryResponse {
    fn from(value: ActionLogEntry) -> Self {
        Self {
            id: value.id().to_owned(),
            action_type: BulkActionTypeDto::from(value.action_type()),
            timestamp: value.timestamp().to_rfc3339(),
            selected_count: value.selected_count(),
            result_counts: ResultCountsResponse::from(value.result_counts()),
            client_results: value
                .client_results()
                .iter()
                .map(ClientResultResponse::from)
                .collect(),
            vat_period: value.vat_period().map(VatPeriodDto::from),
            reminder_info: value.reminder_info().map(ReminderInfoDto::from),
        }
    }
}
