use crate::auth::SessionMode;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SESSION_MODE: &str = "session-mode";
pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const CMD_SIGN_SESSION: &str = "sign-session";

#[derive(Debug)]
pub struct Options {
    pub mode: SessionMode,
    pub secret: Option<SecretString>,
}

impl Options {
    /// Parse admin session arguments from matches.
    ///
    /// # Errors
    /// Returns an error if signed mode is selected without a secret.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let mode = matches
            .get_one::<SessionMode>(ARG_SESSION_MODE)
            .copied()
            .unwrap_or(SessionMode::Literal);

        let secret = matches
            .get_one::<String>(ARG_SESSION_SECRET)
            .filter(|v| !v.trim().is_empty())
            .map(|v| SecretString::from(v.clone()));

        if mode == SessionMode::Signed && secret.is_none() {
            anyhow::bail!(
                "missing required argument: --{ARG_SESSION_SECRET} (required for --{ARG_SESSION_MODE} signed)"
            );
        }

        Ok(Self { mode, secret })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_MODE)
                .long(ARG_SESSION_MODE)
                .help("Admin cookie check: literal or signed")
                .long_help(
                    "Admin cookie check.\n\n`literal` accepts `admin_session=authenticated` as-is; anyone able to set that cookie is an admin. `signed` only accepts the marker when it was signed with --session-secret.",
                )
                .env("DOHY_SESSION_MODE")
                .default_value("literal")
                .value_parser(|value: &str| value.parse::<SessionMode>()),
        )
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("Cookie signing key, at least 64 bytes")
                .env("DOHY_SESSION_SECRET")
                .hide_env_values(true)
                .global(true),
        )
        .subcommand(
            Command::new(CMD_SIGN_SESSION)
                .about("Print a signed admin_session cookie for --session-mode signed"),
        )
}

/// Read the signing secret for `sign-session`.
///
/// # Errors
/// Returns an error if no secret was given.
pub fn sign_secret(matches: &ArgMatches) -> anyhow::Result<SecretString> {
    matches
        .get_one::<String>(ARG_SESSION_SECRET)
        .filter(|v| !v.trim().is_empty())
        .map(|v| SecretString::from(v.clone()))
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_SESSION_SECRET}"))
}
