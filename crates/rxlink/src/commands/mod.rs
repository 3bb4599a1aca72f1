//! Command dispatch: bridges CLI args -> provider calls -> output formatting.

pub mod auth;
pub mod clients;
pub mod config_cmd;
pub mod orders;
pub mod patients;
pub mod prescriptions;
pub mod util;
pub mod webhooks;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::session::Connection;

/// Dispatch a command that needs a signed-in session.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let conn = Connection::authenticated(global).await?;

    let result = match cmd {
        Command::Whoami => auth::whoami(&conn, global),
        Command::Token(args) => auth::token(&conn, args, global).await,
        Command::Patients(args) => patients::handle(&conn, args, global).await,
        Command::Orders(args) => orders::handle(&conn, args, global).await,
        Command::Prescriptions(args) => prescriptions::handle(&conn, args, global).await,
        Command::Webhooks(args) => webhooks::handle(&conn, args, global).await,
        Command::Clients(args) => clients::handle(&conn, args, global).await,
        // Session and local commands are handled before dispatch
        Command::Login(_)
        | Command::Logout(_)
        | Command::Config(_)
        | Command::Completions(_) => unreachable!(),
    };

    // Token reads may have rotated the refresh token.
    conn.persist_quietly();
    result
}
