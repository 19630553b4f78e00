pub mod backend;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const CMD_CSRF_TOKEN: &str = "csrf-token";
pub const CMD_HEALTH: &str = "health";
pub const CMD_INFO: &str = "info";
pub const CMD_SPECIALTIES: &str = "specialties";
pub const CMD_DEBUG_TRACKING: &str = "debug-tracking";

pub const ARG_MINE: &str = "mine";
pub const ARG_TRACKING_OP: &str = "operation";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("referto")
        .about("RefertoSicuro API client")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_CSRF_TOKEN)
                .about("Fetch a CSRF token and show its prefix and expiry"),
        )
        .subcommand(Command::new(CMD_HEALTH).about("Check backend health"))
        .subcommand(Command::new(CMD_INFO).about("Show backend version information"))
        .subcommand(
            Command::new(CMD_SPECIALTIES)
                .about("List medical specialties")
                .arg(
                    Arg::new(ARG_MINE)
                        .long(ARG_MINE)
                        .help("Only the specialties enabled for the signed-in user")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new(CMD_DEBUG_TRACKING)
                .about("Show or change debug tracking consent")
                .arg(
                    Arg::new(ARG_TRACKING_OP)
                        .help("Operation to perform")
                        .value_parser(["status", "enable", "disable", "toggle"])
                        .default_value("status"),
                ),
        );

    let command = backend::with_args(command);
    logging::with_args(command)
}
