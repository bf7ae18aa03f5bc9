use std::sync::Arc;

use kasboek_core::{AppResult, UserId};
use kasboek_domain::OnboardingTourState;
use tracing::info;

use crate::persisted_json::{read_json, remove_key, write_json};
use crate::storage_ports::{Clock, KeyValueStorage};

/// Prefix of the per-user onboarding storage keys.
pub const ONBOARDING_STORAGE_KEY_PREFIX: &str = "kasboek:onboarding";

/// Per-user onboarding tour progress.
#[derive(Clone)]
pub struct OnboardingTourStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
}

impl OnboardingTourStore {
    /// Creates a store over the given storage.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Returns the storage key for a user.
    #[must_use]
    pub fn storage_key(user_id: &UserId) -> String {
        format!("{ONBOARDING_STORAGE_KEY_PREFIX}:{user_id}")
    }

    /// Loads the tour state, defaulting to a fresh tour.
    pub async fn load(&self, user_id: &UserId) -> OnboardingTourState {
        read_json(self.storage.as_ref(), Self::storage_key(user_id).as_str())
            .await
            .unwrap_or_default()
    }

    /// Moves the user to the next step of a tour with `total_steps` steps.
    pub async fn advance_step(
        &self,
        user_id: &UserId,
        total_steps: u32,
    ) -> AppResult<OnboardingTourState> {
        let mut state = self.load(user_id).await;
        state.advance(total_steps, self.clock.now())?;
        self.save(user_id, &state).await;

        if state.completed() {
            info!(user_id = %user_id, "onboarding tour completed");
        }

        Ok(state)
    }

    /// Marks the tour as completed.
    pub async fn complete(&self, user_id: &UserId) -> OnboardingTourState {
        let mut state = self.load(user_id).await;
        state.complete(self.clock.now());
        self.save(user_id, &state).await;
        state
    }

    /// Marks the tour as dismissed.
    pub async fn dismiss(&self, user_id: &UserId) -> OnboardingTourState {
        let mut state = self.load(user_id).await;
        state.dismiss(self.clock.now());
        self.save(user_id, &state).await;
        state
    }

    /// Forgets the user's progress so the tour starts over.
    pub async fn reset(&self, user_id: &UserId) -> OnboardingTourState {
        remove_key(self.storage.as_ref(), Self::storage_key(user_id).as_str()).await;
        OnboardingTourState::default()
    }

    async fn save(&self, user_id: &UserId, state: &OnboardingTourState) {
        write_json(
            self.storage.as_ref(),
            Self::storage_key(user_id).as_str(),
            state,
        )
        .await;
    }
}
