pub mod action_log;
pub mod health;
pub mod onboarding;
pub mod risk;
pub mod selection;

#[cfg(test)]
mod tests;
