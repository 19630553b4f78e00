pub mod csrf_token;
pub mod general;
pub mod specialties;
pub mod tracking;

use crate::cli::globals::GlobalArgs;

// Internal "interpreter" for `Action`.
// We keep the match in a separate module so `mod.rs` stays small as more actions are added.
mod run;

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    CsrfToken(GlobalArgs),
    Health(GlobalArgs),
    Info(GlobalArgs),
    Specialties(specialties::Args),
    Tracking(tracking::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
