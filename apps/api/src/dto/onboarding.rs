use kasboek_domain::OnboardingTourState;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for moving to the next tour step.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/advance-onboarding-request.ts"
)]
pub struct AdvanceOnboardingRequest {
    pub total_steps: u32,
}

/// API representation of a user's onboarding tour progress.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/onboarding-state-response.ts"
)]
pub struct OnboardingStateResponse {
    pub current_step: u32,
    pub completed: bool,
    pub dismissed: bool,
    pub active: bool,
    pub updated_at: Option<String>,
}

impl From<OnboardingTourState> for OnboardingStateResponse {
    fn from(value: OnboardingTourState) -> Self {
        Self {
            current_step: value.current_step(),
            completed: value.completed(),
            dismissed: value.dismissed(),
            active: value.is_active(),
            updated_at: value.updated_at().map(|timestamp| timestamp.to_rfc3339()),
        }
    }
}
