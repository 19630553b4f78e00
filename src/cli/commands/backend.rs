use clap::{Arg, Command};

pub const ARG_BACKEND_URL: &str = "backend-url";
pub const ARG_API_URL: &str = "api-url";
pub const ARG_TIMEOUT: &str = "timeout";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BACKEND_URL)
                .short('b')
                .long(ARG_BACKEND_URL)
                .help("Backend base URL, example: https://api.refertosicuro.it")
                .long_help(
                    "Backend base URL. CSRF tokens are always fetched from <URL>/api/v1/auth/csrf-token.",
                )
                .env("REFERTO_BACKEND_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base URL for API calls (default: the backend URL)")
                .env("REFERTO_API_URL")
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .short('t')
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds")
                .default_value("30")
                .env("REFERTO_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
