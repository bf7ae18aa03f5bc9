use kasboek_application::ClientPrioritization;
use kasboek_core::{AppError, ClientId};
use kasboek_domain::{ClientRiskRecord, ClientStatusSignals, RiskLevel, RiskSummary};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::parse_timestamp;

/// Traffic-light risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/risk-level.ts"
)]
pub enum RiskLevelDto {
    Ok,
    Geel,
    Rood,
}

impl From<RiskLevel> for RiskLevelDto {
    fn from(value: RiskLevel) -> Self {
        match value {
            RiskLevel::Ok => Self::Ok,
            RiskLevel::Geel => Self::Geel,
            RiskLevel::Rood => Self::Rood,
        }
    }
}

/// Status signals reported for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/client-signals.ts"
)]
pub struct ClientSignalsDto {
    pub client_id: String,
    #[serde(default)]
    pub red_issue_count: Option<u32>,
    #[serde(default)]
    pub documents_needing_review_count: Option<u32>,
    #[serde(default)]
    pub days_to_vat_deadline: Option<i32>,
    #[serde(default)]
    pub backlog_age_max_days: Option<i32>,
    #[serde(default)]
    pub last_activity_at: Option<String>,
}

impl TryFrom<ClientSignalsDto> for ClientStatusSignals {
    type Error = AppError;

    fn try_from(value: ClientSignalsDto) -> Result<Self, Self::Error> {
        Ok(Self {
            client_id: ClientId::new(value.client_id)?,
            red_issue_count: value.red_issue_count,
            documents_needing_review_count: value.documents_needing_review_count,
            days_to_vat_deadline: value.days_to_vat_deadline.map(i64::from),
            backlog_age_max_days: value.backlog_age_max_days.map(i64::from),
            last_activity_at: value
                .last_activity_at
                .as_deref()
                .map(|timestamp| parse_timestamp("last_activity_at", timestamp))
                .transpose()?,
        })
    }
}

impl From<&ClientStatusSignals> for ClientSignalsDto {
    fn from(value: &ClientStatusSignals) -> Self {
        Self {
            client_id: value.client_id.to_string(),
            red_issue_count: value.red_issue_count,
            documents_needing_review_count: value.documents_needing_review_count,
            days_to_vat_deadline: value.days_to_vat_deadline.map(saturating_days),
            backlog_age_max_days: value.backlog_age_max_days.map(saturating_days),
            last_activity_at: value
                .last_activity_at
                .map(|timestamp| timestamp.to_rfc3339()),
        }
    }
}

fn saturating_days(days: i64) -> i32 {
    i32::try_from(days).unwrap_or(if days < 0 { i32::MIN } else { i32::MAX })
}

/// Incoming payload for ranking a client portfolio.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/prioritize-clients-request.ts"
)]
pub struct PrioritizeClientsRequest {
    pub clients: Vec<ClientSignalsDto>,
}

/// API representation of a scored client.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/client-risk-response.ts"
)]
pub struct ClientRiskResponse {
    pub client_id: String,
    pub risk_score: u8,
    pub risk_level: RiskLevelDto,
    pub signals: ClientSignalsDto,
}

impl From<ClientRiskRecord> for ClientRiskResponse {
    fn from(value: ClientRiskRecord) -> Self {
        Self {
            client_id: value.client_id().to_string(),
            risk_score: value.risk_score(),
            risk_level: RiskLevelDto::from(value.risk_level()),
            signals: ClientSignalsDto::from(value.raw_signals()),
        }
    }
}

/// Number of clients per risk level.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/risk-summary-response.ts"
)]
pub struct RiskSummaryResponse {
    pub ok: usize,
    pub geel: usize,
    pub rood: usize,
    pub total: usize,
}

impl From<RiskSummary> for RiskSummaryResponse {
    fn from(value: RiskSummary) -> Self {
        Self {
            ok: value.ok,
            geel: value.geel,
            rood: value.rood,
            total: value.total(),
        }
    }
}

/// Ranked client list.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/prioritized-clients-response.ts"
)]
pub struct PrioritizedClientsResponse {
    pub clients: Vec<ClientRiskResponse>,
    pub summary: RiskSummaryResponse,
}

impl From<ClientPrioritization> for PrioritizedClientsResponse {
    fn from(value: ClientPrioritization) -> Self {
        Self {
            clients: value
                .records
                .into_iter()
                .map(ClientRiskResponse::from)
                .collect(),
            summary: RiskSummaryResponse::from(value.summary),
        }
    }
}
