//! Map validated CLI arguments to the action to run.

use crate::cli::actions::{Action, server::Args, sign};
use crate::cli::commands::{ARG_PORT, session, store};
use anyhow::{Context, Result};

/// Map validated CLI matches to an action; no subcommand runs the server.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    if matches.subcommand_name() == Some(session::CMD_SIGN_SESSION) {
        let sub_m = matches
            .subcommand_matches(session::CMD_SIGN_SESSION)
            .context("arguments not found")?;
        return Ok(Action::SignSession(sign::Args {
            secret: session::sign_secret(sub_m)?,
        }));
    }

    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    Ok(Action::Server(Args {
        port,
        store: store::Options::parse(matches)?,
        session: session::Options::parse(matches)?,
    }))
}
