//! Client risk scoring used to prioritize accountant attention.
//!
//! The score is a fixed additive rule over five signals reported by the
//! bookkeeping backend for each client. It is recomputed on every request and
//! never stored.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use kasboek_core::ClientId;
use serde::{Deserialize, Serialize};

/// Upper bound of the risk score.
pub const RISK_SCORE_MAX: u8 = 100;

/// Score at or above which a client is flagged red.
pub const RISK_LEVEL_ROOD_THRESHOLD: u8 = 70;

/// Score at or above which a client is flagged yellow.
pub const RISK_LEVEL_GEEL_THRESHOLD: u8 = 40;

const RED_ISSUES_WEIGHT: u8 = 30;
const DOCUMENTS_REVIEW_WEIGHT: u8 = 20;
const VAT_DEADLINE_WEIGHT: u8 = 20;
const BACKLOG_WEIGHT: u8 = 10;
const INACTIVITY_WEIGHT: u8 = 5;

const VAT_DEADLINE_WINDOW_DAYS: i64 = 7;
const INACTIVITY_THRESHOLD_DAYS: i64 = 14;

/// Raw per-client signals as reported on a client status card.
///
/// Every signal is optional; a missing signal never contributes to the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatusSignals {
    /// Client the signals belong to.
    pub client_id: ClientId,
    /// Number of open red (blocking) issues.
    #[serde(default)]
    pub red_issue_count: Option<u32>,
    /// Number of uploaded documents awaiting review.
    #[serde(default)]
    pub documents_needing_review_count: Option<u32>,
    /// Days until the next VAT (BTW) filing deadline; negative when overdue.
    #[serde(default)]
    pub days_to_vat_deadline: Option<i64>,
    /// Age in days of the oldest unprocessed backlog item.
    #[serde(default)]
    pub backlog_age_max_days: Option<i64>,
    /// Last time the client showed activity in the administration.
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl ClientStatusSignals {
    /// Creates a signal set with no signal present.
    #[must_use]
    pub fn empty(client_id: ClientId) -> Self {
        Self {
            client_id,
            red_issue_count: None,
            documents_needing_review_count: None,
            days_to_vat_deadline: None,
            backlog_age_max_days: None,
            last_activity_at: None,
        }
    }
}

/// Coarse urgency bucket derived from the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Nothing requires attention.
    Ok,
    /// Needs attention soon.
    Geel,
    /// Needs attention now.
    Rood,
}

impl RiskLevel {
    /// Maps a score to its level.
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        if score >= RISK_LEVEL_ROOD_THRESHOLD {
            Self::Rood
        } else if score >= RISK_LEVEL_GEEL_THRESHOLD {
            Self::Geel
        } else {
            Self::Ok
        }
    }
}

/// Computes the 0–100 urgency score for a client at the given instant.
///
/// `now` only affects the inactivity signal.
#[must_use]
pub fn calculate_risk_score(signals: &ClientStatusSignals, now: DateTime<Utc>) -> u8 {
    let mut score: u32 = 0;

    if signals.red_issue_count.is_some_and(|count| count > 0) {
        score += u32::from(RED_ISSUES_WEIGHT);
    }

    if signals
        .documents_needing_review_count
        .is_some_and(|count| count > 0)
    {
        score += u32::from(DOCUMENTS_REVIEW_WEIGHT);
    }

    if signals
        .days_to_vat_deadline
        .is_some_and(|days| days <= VAT_DEADLINE_WINDOW_DAYS)
    {
        score += u32::from(VAT_DEADLINE_WEIGHT);
    }

    if signals.backlog_age_max_days.is_some_and(|days| days > 0) {
        score += u32::from(BACKLOG_WEIGHT);
    }

    if signals
        .last_activity_at
        .is_some_and(|last_activity| (now - last_activity).num_days() > INACTIVITY_THRESHOLD_DAYS)
    {
        score += u32::from(INACTIVITY_WEIGHT);
    }

    u8::try_from(score.min(u32::from(RISK_SCORE_MAX))).unwrap_or(RISK_SCORE_MAX)
}

/// Derived risk view of a single client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRiskRecord {
    client_id: ClientId,
    raw_signals: ClientStatusSignals,
    risk_score: u8,
    risk_level: RiskLevel,
}

impl ClientRiskRecord {
    /// Scores the given signals at `now`.
    #[must_use]
    pub fn evaluate(signals: ClientStatusSignals, now: DateTime<Utc>) -> Self {
        let risk_score = calculate_risk_score(&signals, now);
        Self {
            client_id: signals.client_id.clone(),
            raw_signals: signals,
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
        }
    }

    /// Returns the client identifier.
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Returns the signals the score was computed from.
    #[must_use]
    pub fn raw_signals(&self) -> &ClientStatusSignals {
        &self.raw_signals
    }

    /// Returns the clamped score.
    #[must_use]
    pub fn risk_score(&self) -> u8 {
        self.risk_score
    }

    /// Returns the level derived from the score.
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }
}

/// Scores every client and orders them by descending urgency.
///
/// Ties are broken by client id so the order is stable across requests.
#[must_use]
pub fn prioritize_clients(
    signals: impl IntoIterator<Item = ClientStatusSignals>,
    now: DateTime<Utc>,
) -> Vec<ClientRiskRecord> {
    let mut records: Vec<ClientRiskRecord> = signals
        .into_iter()
        .map(|client| ClientRiskRecord::evaluate(client, now))
        .collect();

    records.sort_by(|left, right| match right.risk_score.cmp(&left.risk_score) {
        Ordering::Equal => left.client_id.cmp(&right.client_id),
        other => other,
    });

    records
}

/// Number of clients per risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    /// Clients at level `ok`.
    pub ok: usize,
    /// Clients at level `geel`.
    pub geel: usize,
    /// Clients at level `rood`.
    pub rood: usize,
}

impl RiskSummary {
    /// Counts records per level.
    #[must_use]
    pub fn from_records(records: &[ClientRiskRecord]) -> Self {
        records
            .iter()
            .fold(Self::default(), |mut summary, record| {
                match record.risk_level {
                    RiskLevel::Ok => summary.ok += 1,
                    RiskLevel::Geel => summary.geel += 1,
                    RiskLevel::Rood => summary.rood += 1,
                }
                summary
            })
    }

    /// Total number of clients counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.ok + self.geel + self.rood
    }
}
