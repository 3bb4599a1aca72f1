//! Session commands: login, logout, whoami, token.

use dialoguer::Input;
use secrecy::ExposeSecret;
use url::Url;

use rxlink_core::{Principal, has_auth_params};

use crate::cli::{GlobalOpts, LoginArgs, LogoutArgs, TokenArgs};
use crate::error::CliError;
use crate::output;
use crate::session::Connection;

use super::util;

fn detail(p: &Principal) -> String {
    let mut lines = vec![
        format!("Subject:       {}", p.id),
        format!("Name:          {}", p.display_name()),
        format!("Email:         {}", output::or_dash(p.email.as_deref())),
    ];
    if let Some(org) = &p.organization {
        lines.push(format!(
            "Organization:  {} ({})",
            org.name.as_deref().unwrap_or("-"),
            org.id
        ));
    }
    if let Some(updated) = &p.updated_at {
        lines.push(format!("Updated:       {updated}"));
    }
    lines.join("\n")
}

fn print_principal(p: &Principal, global: &GlobalOpts) {
    let out = output::render_single(&global.output, p, detail, |p| p.id.clone());
    output::print_output(&out, global.quiet);
}

// ── Login ───────────────────────────────────────────────────────────

pub async fn login(args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let conn = Connection::open(global, false)?;
    conn.provider
        .login(args.organization, args.invitation, None)
        .await?;

    let authorize = conn.navigator.last().ok_or_else(|| CliError::AuthFailed {
        message: "no authorization URL was produced".into(),
    })?;
    eprintln!("Open this URL in your browser and sign in:\n\n  {authorize}\n");

    let pasted: String = Input::new()
        .with_prompt("Paste the URL you were redirected to")
        .interact_text()
        .map_err(util::prompt_err)?;
    let callback = parse_callback(&pasted)?;

    conn.provider.initialize(&callback).await;
    if let Some(err) = conn.provider.error() {
        return Err(CliError::AuthFailed {
            message: err.message,
        });
    }
    let principal = conn.provider.user().ok_or_else(|| CliError::AuthFailed {
        message: "the identity provider returned no user".into(),
    })?;

    conn.persist()?;
    output::print_status(
        &output::ok(&format!(
            "Signed in as {} (profile '{}')",
            principal.display_name(),
            conn.profile
        )),
        global.quiet,
    );
    print_principal(&principal, global);
    Ok(())
}

/// The pasted redirect target must carry the handshake parameters.
fn parse_callback(pasted: &str) -> Result<Url, CliError> {
    let url = Url::parse(pasted.trim()).map_err(|e| CliError::Validation {
        field: "callback".into(),
        reason: format!("not a URL: {e}"),
    })?;
    let search = url.query().map(|q| format!("?{q}")).unwrap_or_default();
    if !has_auth_params(&search) {
        return Err(CliError::Validation {
            field: "callback".into(),
            reason: "expected a URL with code (or error) and state parameters".into(),
        });
    }
    Ok(url)
}

// ── Logout ──────────────────────────────────────────────────────────

pub async fn logout(args: LogoutArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let conn = Connection::open(global, false)?;
    conn.provider.logout(args.return_to).await?;
    conn.forget()?;

    output::print_status(
        &format!("Session for profile '{}' removed", conn.profile),
        global.quiet,
    );
    if let Some(url) = conn.navigator.last() {
        output::print_output(url.as_str(), global.quiet);
    }
    Ok(())
}

// ── Whoami / token ──────────────────────────────────────────────────

pub fn whoami(conn: &Connection, global: &GlobalOpts) -> Result<(), CliError> {
    let principal = conn.provider.user().ok_or_else(|| CliError::NotLoggedIn {
        profile: conn.profile.clone(),
    })?;
    print_principal(&principal, global);
    Ok(())
}

pub async fn token(conn: &Connection, args: TokenArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let token = conn.provider.get_token(args.audience.as_deref()).await?;
    output::print_output(token.expose_secret(), global.quiet);
    Ok(())
}
