use crate::cli::{
    actions::{specialties, tracking, Action},
    commands::{
        backend::{ARG_API_URL, ARG_BACKEND_URL, ARG_TIMEOUT},
        ARG_MINE, ARG_TRACKING_OP, CMD_CSRF_TOKEN, CMD_DEBUG_TRACKING, CMD_HEALTH, CMD_INFO,
        CMD_SPECIALTIES,
    },
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use std::time::Duration;

/// # Errors
/// Returns an error if required arguments are missing or the subcommand is unknown.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = global_args(matches)?;

    match matches.subcommand() {
        Some((CMD_CSRF_TOKEN, _)) => Ok(Action::CsrfToken(globals)),
        Some((CMD_HEALTH, _)) => Ok(Action::Health(globals)),
        Some((CMD_INFO, _)) => Ok(Action::Info(globals)),
        Some((CMD_SPECIALTIES, sub_m)) => Ok(Action::Specialties(specialties::Args {
            globals,
            mine: sub_m.get_flag(ARG_MINE),
        })),
        Some((CMD_DEBUG_TRACKING, sub_m)) => {
            let operation = sub_m
                .get_one::<String>(ARG_TRACKING_OP)
                .map_or("status", String::as_str)
                .parse::<tracking::Operation>()?;

            Ok(Action::Tracking(tracking::Args { globals, operation }))
        }
        Some((other, _)) => Err(anyhow!("unknown command: {other}")),
        None => Err(anyhow!("missing command")),
    }
}

fn global_args(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let backend_url = matches
        .get_one::<String>(ARG_BACKEND_URL)
        .cloned()
        .context("missing required argument: --backend-url")?;

    let mut globals = GlobalArgs::new(backend_url);

    if let Some(api_url) = matches.get_one::<String>(ARG_API_URL) {
        globals.set_api_url(api_url.clone());
    }

    if let Some(timeout) = matches.get_one::<u64>(ARG_TIMEOUT) {
        globals.set_timeout(Duration::from_secs(*timeout));
    }

    Ok(globals)
}
