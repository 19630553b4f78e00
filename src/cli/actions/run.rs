use crate::cli::actions::{csrf_token, general, specialties, tracking, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::CsrfToken(globals) => csrf_token::execute(&globals).await,
        Action::Health(globals) => general::health(&globals).await,
        Action::Info(globals) => general::info(&globals).await,
        Action::Specialties(args) => specialties::execute(args).await,
        Action::Tracking(args) => tracking::execute(args).await,
    }
}
