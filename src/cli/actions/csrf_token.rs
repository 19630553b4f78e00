use crate::{
    cli::globals::GlobalArgs,
    csrf::{self, CsrfError, CsrfTokenManager},
};
use anyhow::Result;
use std::time::Instant;
use tracing::debug;

/// Fetch a token and print a log-safe prefix with its remaining lifetime.
/// # Errors
/// Returns an error if the client cannot be built or the fetch fails for any reason
/// other than CSRF protection being disabled.
pub async fn execute(globals: &GlobalArgs) -> Result<()> {
    let client = globals.client()?;
    debug!(endpoint = client.csrf().endpoint(), "requesting CSRF token");

    println!("{}", describe(client.csrf()).await?);

    Ok(())
}

async fn describe(manager: &CsrfTokenManager) -> Result<String> {
    match manager.get_token().await {
        Ok(token) => {
            let remaining = manager
                .cached_expiry()
                .map_or(0, |expiry| expiry.saturating_duration_since(Instant::now()).as_secs());

            Ok(format!(
                "token: {}\nexpires in: {remaining}s",
                csrf::redacted(&token)
            ))
        }
        Err(CsrfError::FeatureDisabled) => {
            Ok("CSRF protection is disabled on this backend".to_string())
        }
        Err(err) => Err(err.into()),
    }
}
