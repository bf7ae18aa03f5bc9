//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod action_log;
mod onboarding;
mod risk;
mod selection;

pub use action_log::{
    ActionLogEntry, ActionLogEntryInput, BulkActionType, BulkOperationClientResult,
    BulkOperationResult, ClientResult, ClientResultStatus, ReminderInfo, ResultCounts, VatPeriod,
};
pub use onboarding::OnboardingTourState;
pub use risk::{
    ClientRiskRecord, ClientStatusSignals, RISK_LEVEL_GEEL_THRESHOLD, RISK_LEVEL_ROOD_THRESHOLD,
    RISK_SCORE_MAX, RiskLevel, RiskSummary, calculate_risk_score, prioritize_clients,
};
pub use selection::SelectionSnapshot;
