//! Application services and ports.

#![forbid(unsafe_code)]

mod action_log_service;
mod onboarding_service;
mod persisted_json;
mod prioritization_service;
mod selection_service;
mod storage_ports;

#[cfg(test)]
mod test_support;

pub use action_log_service::{
    ACTION_LOG_STORAGE_KEY, ActionLogPolicy, ActionLogStore, DEFAULT_ACTION_LOG_MAX_ENTRIES,
    DEFAULT_ACTION_LOG_RETENTION_DAYS,
};
pub use onboarding_service::{ONBOARDING_STORAGE_KEY_PREFIX, OnboardingTourStore};
pub use prioritization_service::{ClientPrioritization, ClientPrioritizationService};
pub use selection_service::{
    DEFAULT_SELECTION_MAX_AGE_HOURS, SELECTION_STORAGE_KEY, SelectionPolicy, SelectionStore,
};
pub use storage_ports::{Clock, KeyValueStorage, StorageChange, SystemClock};
