use chrono::{DateTime, NaiveDate, Utc};
use kasboek_core::{AppError, AppResult, ClientId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bulk operations an accountant can run over a client selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkActionType {
    /// Recalculates client status cards.
    Recalculate,
    /// Acknowledges yellow (geel) issues.
    AckYellow,
    /// Generates draft VAT (BTW) returns for a period.
    GenerateVatDraft,
    /// Sends document or payment reminders to clients.
    SendReminders,
}

impl BulkActionType {
    /// Returns a stable transport value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recalculate => "RECALCULATE",
            Self::AckYellow => "ACK_YELLOW",
            Self::GenerateVatDraft => "GENERATE_VAT_DRAFT",
            Self::SendReminders => "SEND_REMINDERS",
        }
    }
}

/// Outcome of a bulk operation for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientResultStatus {
    /// Operation applied.
    Success,
    /// Operation failed for this client.
    Failed,
    /// Operation not applicable and skipped.
    Skipped,
}

/// Per-status totals of a bulk operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCounts {
    /// Clients processed successfully.
    pub success: u32,
    /// Clients that failed.
    pub failed: u32,
    /// Clients skipped.
    pub skipped: u32,
}

impl ResultCounts {
    /// Tallies statuses.
    #[must_use]
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a ClientResultStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut counts, status| {
            match status {
                ClientResultStatus::Success => counts.success = counts.success.saturating_add(1),
                ClientResultStatus::Failed => counts.failed = counts.failed.saturating_add(1),
                ClientResultStatus::Skipped => counts.skipped = counts.skipped.saturating_add(1),
            }
            counts
        })
    }
}

/// Logged outcome for a single client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResult {
    /// Client the outcome belongs to.
    pub client_id: ClientId,
    /// Client display name at the time of the operation.
    pub name: String,
    /// Outcome.
    pub status: ClientResultStatus,
    /// Error reported by the backend, if any.
    #[serde(default)]
    pub error_message: Option<String>,
}

/// VAT (BTW) filing period, by quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "VatPeriodParts")]
pub struct VatPeriod {
    year: i32,
    quarter: u8,
}

#[derive(Deserialize)]
struct VatPeriodParts {
    year: i32,
    quarter: u8,
}

impl TryFrom<VatPeriodParts> for VatPeriod {
    type Error = AppError;

    fn try_from(value: VatPeriodParts) -> Result<Self, Self::Error> {
        Self::new(value.year, value.quarter)
    }
}

impl VatPeriod {
    /// Creates a validated quarter period.
    pub fn new(year: i32, quarter: u8) -> AppResult<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(AppError::Validation(format!(
                "vat quarter must be between 1 and 4, got {quarter}"
            )));
        }

        Ok(Self { year, quarter })
    }

    /// Returns the year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Returns the quarter (1–4).
    #[must_use]
    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Returns the label used on filings, e.g. `2026-Q1`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-Q{}", self.year, self.quarter)
    }
}

/// Details of a reminder batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderInfo {
    /// Reminder category, e.g. `DOCUMENT_MISSING`.
    pub reminder_type: String,
    /// Reminder title as sent to clients.
    pub title: String,
    /// Due date communicated to clients.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Per-client outcome reported by the backend for a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationClientResult {
    /// Client identifier.
    pub client_id: ClientId,
    /// Client display name.
    pub client_name: String,
    /// Outcome.
    pub status: ClientResultStatus,
    /// Backend error message.
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Result of a bulk operation as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationResult {
    /// Operation that ran.
    pub action_type: BulkActionType,
    /// Number of clients the backend processed.
    pub total_processed: u32,
    /// Per-client outcomes.
    pub results: Vec<BulkOperationClientResult>,
}

/// One persisted entry of the bulk action history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogEntry {
    id: String,
    action_type: BulkActionType,
    timestamp: DateTime<Utc>,
    selected_count: u32,
    result_counts: ResultCounts,
    client_results: Vec<ClientResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vat_period: Option<VatPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reminder_info: Option<ReminderInfo>,
}

/// Input for creating a log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLogEntryInput {
    /// Operation that ran.
    pub action_type: BulkActionType,
    /// Number of clients selected when the operation started.
    pub selected_count: u32,
    /// Per-client outcomes.
    pub client_results: Vec<ClientResult>,
    /// VAT period for VAT operations.
    pub vat_period: Option<VatPeriod>,
    /// Reminder details for reminder operations.
    pub reminder_info: Option<ReminderInfo>,
}

impl ActionLogEntry {
    /// Creates a new entry stamped at `timestamp` with a random id.
    ///
    /// Result counts are derived from the client outcomes.
    #[must_use]
    pub fn new(input: ActionLogEntryInput, timestamp: DateTime<Utc>) -> Self {
        let result_counts = ResultCounts::tally(input.client_results.iter().map(|r| &r.status));
        Self {
            id: Uuid::new_v4().to_string(),
            action_type: input.action_type,
            timestamp,
            selected_count: input.selected_count,
            result_counts,
            client_results: input.client_results,
            vat_period: input.vat_period,
            reminder_info: input.reminder_info,
        }
    }

    /// Maps a backend bulk operation result into an entry input.
    ///
    /// The selected count is the number of clients the backend processed.
    #[must_use]
    pub fn input_from_bulk_result(
        result: BulkOperationResult,
        vat_period: Option<VatPeriod>,
        reminder_info: Option<ReminderInfo>,
    ) -> ActionLogEntryInput {
        ActionLogEntryInput {
            action_type: result.action_type,
            selected_count: result.total_processed,
            client_results: result
                .results
                .into_iter()
                .map(|client| ClientResult {
                    client_id: client.client_id,
                    name: client.client_name,
                    status: client.status,
                    error_message: client.error_message,
                })
                .collect(),
            vat_period,
            reminder_info,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the operation type.
    #[must_use]
    pub fn action_type(&self) -> BulkActionType {
        self.action_type
    }

    /// Returns when the operation completed.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns how many clients were selected.
    #[must_use]
    pub fn selected_count(&self) -> u32 {
        self.selected_count
    }

    /// Returns per-status totals.
    #[must_use]
    pub fn result_counts(&self) -> ResultCounts {
        self.result_counts
    }

    /// Returns per-client outcomes.
    #[must_use]
    pub fn client_results(&self) -> &[ClientResult] {
        &self.client_results
    }

    /// Returns the VAT period, if any.
    #[must_use]
    pub fn vat_period(&self) -> Option<VatPeriod> {
        self.vat_period
    }

    /// Returns reminder details, if any.
    #[must_use]
    pub fn reminder_info(&self) -> Option<&ReminderInfo> {
        self.reminder_info.as_ref()
    }

    /// Returns the clients whose operation failed.
    #[must_use]
    pub fn failed_client_ids(&self) -> Vec<ClientId> {
        self.client_results
            .iter()
            .filter(|result| result.status == ClientResultStatus::Failed)
            .map(|result| result.client_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use kasboek_core::ClientId;

    use super::{
        ActionLogEntry, BulkActionType, BulkOperationClientResult, BulkOperationResult,
        ClientResultStatus, VatPeriod,
    };

    fn client_result(id: &str, status: ClientResultStatus) -> BulkOperationClientResult {
        BulkOperationClientResult {
            client_id: ClientId::new(id).unwrap_or_else(|_| unreachable!()),
            client_name: format!("Client {id}"),
            status,
            error_message: (status == ClientResultStatus::Failed).then(|| "boom".to_owned()),
        }
    }

    #[test]
    fn bulk_result_maps_into_entry_with_tallied_counts() {
        let result = BulkOperationResult {
            action_type: BulkActionType::GenerateVatDraft,
            total_processed: 4,
            results: vec![
                client_result("a", ClientResultStatus::Success),
                client_result("b", ClientResultStatus::Failed),
                client_result("c", ClientResultStatus::Skipped),
                client_result("d", ClientResultStatus::Success),
            ],
        };
        let period = VatPeriod::new(2026, 1).ok();
        let timestamp = Utc
            .with_ymd_and_hms(2026, 4, 2, 10, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);

        let entry = ActionLogEntry::new(
            ActionLogEntry::input_from_bulk_result(result, period, None),
            timestamp,
        );

        assert_eq!(entry.selected_count(), 4);
        assert_eq!(entry.result_counts().success, 2);
        assert_eq!(entry.result_counts().failed, 1);
        assert_eq!(entry.result_counts().skipped, 1);
        assert_eq!(entry.client_results()[1].name, "Client b");
        assert_eq!(
            entry
                .failed_client_ids()
                .iter()
                .map(ClientId::as_str)
                .collect::<Vec<_>>(),
            vec!["b"]
        );
        assert_eq!(entry.vat_period().map(|p| p.label()), Some("2026-Q1".to_owned()));
    }

    #[test]
    fn entry_serializes_with_camel_case_wire_names() {
        let entry = ActionLogEntry::new(
            ActionLogEntry::input_from_bulk_result(
                BulkOperationResult {
                    action_type: BulkActionType::AckYellow,
                    total_processed: 0,
                    results: Vec::new(),
                },
                None,
                None,
            ),
            Utc::now(),
        );

        let json = serde_json::to_value(&entry).unwrap_or_default();
        assert_eq!(json["actionType"], "ACK_YELLOW");
        assert!(json.get("resultCounts").is_some());
        assert!(json.get("vatPeriod").is_none());
    }

    #[test]
    fn vat_quarter_is_validated() {
        assert!(VatPeriod::new(2026, 0).is_err());
        assert!(VatPeriod::new(2026, 5).is_err());
        assert!(VatPeriod::new(2026, 4).is_ok());
        assert!(serde_json::from_str::<VatPeriod>(r#"{"year":2026,"quarter":7}"#).is_err());
    }

    #[test]
    fn action_type_transport_value_matches_wire_name() {
        for action in [
            BulkActionType::Recalculate,
            BulkActionType::AckYellow,
            BulkActionType::GenerateVatDraft,
            BulkActionType::SendReminders,
        ] {
            assert_eq!(
                serde_json::to_value(action).ok(),
                Some(serde_json::Value::from(action.as_str()))
            );
        }
        assert!(serde_json::from_str::<BulkActionType>(r#""DELETE_ALL""#).is_err());
    }
}
