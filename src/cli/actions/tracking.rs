use crate::{
    api::{self, types::TrackingStatus},
    cli::globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Status,
    Enable,
    Disable,
    Toggle,
}

impl FromStr for Operation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "status" => Ok(Self::Status),
            "enable" => Ok(Self::Enable),
            "disable" => Ok(Self::Disable),
            "toggle" => Ok(Self::Toggle),
            other => Err(anyhow!("unknown debug-tracking operation: {other}")),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Args {
    pub globals: GlobalArgs,
    pub operation: Operation,
}

/// # Errors
/// Returns an error if the request fails.
pub async fn execute(args: Args) -> Result<()> {
    let client = args.globals.client()?;

    match args.operation {
        Operation::Status | Operation::Toggle => {}
        Operation::Enable => {
            let enabled = api::tracking::enable(&client)
                .await
                .context("failed to enable debug tracking")?;
            info!(retention_days = ?enabled.retention_days, "debug tracking enabled");
        }
        Operation::Disable => {
            let disabled = api::tracking::disable(&client)
                .await
                .context("failed to disable debug tracking")?;
            println!("deleted records: {}", disabled.deleted_records);
        }
    }

    let status = if args.operation == Operation::Toggle {
        api::tracking::toggle(&client)
            .await
            .context("failed to toggle debug tracking")?
    } else {
        api::tracking::status(&client)
            .await
            .context("failed to read debug tracking status")?
    };

    println!("{}", render(&status));

    Ok(())
}

fn render(status: &TrackingStatus) -> String {
    if !status.enabled {
        return "debug tracking: disabled".to_string();
    }

    let mut lines = vec!["debug tracking: enabled".to_string()];
    if let Some(days) = status.retention_days {
        lines.push(format!("retention: {days} days"));
    }
    if let Some(since) = &status.enabled_at {
        lines.push(format!("enabled at: {since}"));
    }
    if let Some(reason) = &status.tracking_reason {
        lines.push(format!("reason: {reason}"));
    }
    lines.join("\n")
}
