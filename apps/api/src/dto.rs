mod action_log;
mod common;
mod onboarding;
mod risk;
mod selection;

pub use action_log::{ActionLogEntryResponse, LogBulkOperationRequest};
pub use common::HealthResponse;
pub use onboarding::{AdvanceOnboardingRequest, OnboardingStateResponse};
pub use risk::{PrioritizeClientsRequest, PrioritizedClientsResponse};
pub use selection::{
    SelectFailedClientsRequest, SelectionClientRequest, SelectionClientsRequest,
    SelectionResponse,
};
