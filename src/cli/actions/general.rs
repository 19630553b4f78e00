use crate::{api, cli::globals::GlobalArgs};
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if the backend is unreachable or unhealthy.
pub async fn health(globals: &GlobalArgs) -> Result<()> {
    let client = globals.client()?;
    let body = api::general::health(&client)
        .await
        .context("health check failed")?;

    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(())
}

/// # Errors
/// Returns an error if the backend is unreachable or the response is not JSON.
pub async fn info(globals: &GlobalArgs) -> Result<()> {
    let client = globals.client()?;
    let body = api::general::info(&client)
        .await
        .context("failed to fetch backend info")?;

    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(())
}
