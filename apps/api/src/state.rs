use kasboek_application::{
    ActionLogStore, ClientPrioritizationService, OnboardingTourStore, SelectionStore,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub prioritization_service: ClientPrioritizationService,
    pub action_log_store: ActionLogStore,
    pub selection_store: SelectionStore,
    pub onboarding_store: OnboardingTourStore,
}
