use std::sync::Arc;

use kasboek_domain::{ClientRiskRecord, ClientStatusSignals, RiskSummary, prioritize_clients};
use tracing::debug;

use crate::storage_ports::Clock;

/// Ranked client list with per-level totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPrioritization {
    /// Records ordered by descending risk score.
    pub records: Vec<ClientRiskRecord>,
    /// Counts per risk level.
    pub summary: RiskSummary,
}

/// Scores clients against the injected clock.
#[derive(Clone)]
pub struct ClientPrioritizationService {
    clock: Arc<dyn Clock>,
}

impl ClientPrioritizationService {
    /// Creates the service.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Scores and ranks a batch of clients.
    #[must_use]
    pub fn prioritize(&self, signals: Vec<ClientStatusSignals>) -> ClientPrioritization {
        let records = prioritize_clients(signals, self.clock.now());
        let summary = RiskSummary::from_records(&records);

        debug!(
            clients = summary.total(),
            rood = summary.rood,
            geel = summary.geel,
            "prioritized clients"
        );

        ClientPrioritization { records, summary }
    }
}
