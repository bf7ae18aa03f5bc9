use chrono::{DateTime, Utc};
use kasboek_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Progress of a user through the dashboard onboarding tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingTourState {
    current_step: u32,
    completed: bool,
    dismissed: bool,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl Default for OnboardingTourState {
    fn default() -> Self {
        Self {
            current_step: 0,
            completed: false,
            dismissed: false,
            updated_at: None,
        }
    }
}

impl OnboardingTourState {
    /// Returns the zero-based step the user is on.
    #[must_use]
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// Returns whether the tour was finished.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Returns whether the user closed the tour early.
    #[must_use]
    pub fn dismissed(&self) -> bool {
        self.dismissed
    }

    /// Returns when the state last changed.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns whether the tour should still be shown.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.completed && !self.dismissed
    }

    /// Moves to the next step, completing the tour after the last one.
    pub fn advance(&mut self, total_steps: u32, now: DateTime<Utc>) -> AppResult<()> {
        if total_steps == 0 {
            return Err(AppError::Validation(
                "onboarding tour must have at least one step".to_owned(),
            ));
        }

        if !self.is_active() {
            return Ok(());
        }

        self.current_step = self.current_step.saturating_add(1);
        if self.current_step >= total_steps {
            self.current_step = total_steps;
            self.completed = true;
        }
        self.updated_at = Some(now);
        Ok(())
    }

    /// Marks the tour as finished.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.completed = true;
        self.updated_at = Some(now);
    }

    /// Marks the tour as closed without finishing.
    pub fn dismiss(&mut self, now: DateTime<Utc>) {
        self.dismissed = true;
        self.updated_at = Some(now);
    }
}
