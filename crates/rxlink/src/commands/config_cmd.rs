//! Config subcommand handlers.

use dialoguer::{Confirm, Input};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display as TOML-ish text.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "domain = \"{}\"", p.domain);
        let _ = writeln!(out, "client_id = \"{}\"", p.client_id);
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if let Some(ref uri) = p.redirect_uri {
            let _ = writeln!(out, "redirect_uri = \"{uri}\"");
        }
        if let Some(ref audience) = p.audience {
            let _ = writeln!(out, "audience = \"{audience}\"");
        }
        if let Some(ref org) = p.organization {
            let _ = writeln!(out, "organization = \"{org}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

fn prompt(label: &str, default: Option<&str>) -> Result<String, CliError> {
    let mut input = Input::<String>::new().with_prompt(label);
    if let Some(default) = default {
        input = input.default(default.to_owned());
    }
    input.interact_text().map_err(prompt_err)
}

fn prompt_optional(label: &str) -> Result<Option<String>, CliError> {
    let value: String = Input::new()
        .with_prompt(label)
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_owned()))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("rxlink configuration");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config_or_default();

            let profile_name = prompt(
                "Profile name",
                Some(global.profile.as_deref().unwrap_or("default")),
            )?;
            let domain = prompt("Identity provider domain (https://...)", None)?;
            let client_id = prompt("OAuth client id", None)?;
            let api_url = prompt("GraphQL endpoint (https://.../graphql)", None)?;
            let redirect_uri = prompt("Redirect URI", Some(rxlink_config::DEFAULT_REDIRECT_URI))?;
            let organization = prompt_optional("Organization id (optional)")?;

            let profile = Profile {
                domain,
                client_id,
                api_url,
                redirect_uri: (redirect_uri != rxlink_config::DEFAULT_REDIRECT_URI)
                    .then_some(redirect_uri),
                organization,
                ..Profile::default()
            };
            // Catch typos before they land in the file.
            rxlink_config::profile_to_provider_config(&profile, &cfg.defaults)?;

            let make_default = cfg.profiles.is_empty()
                || Confirm::new()
                    .with_prompt(format!("Make '{profile_name}' the default profile?"))
                    .default(true)
                    .interact()
                    .map_err(prompt_err)?;
            if make_default {
                cfg.default_profile = Some(profile_name.clone());
            }
            cfg.profiles.insert(profile_name.clone(), profile);

            let path = config::save_config(&cfg)?;
            eprintln!("\n{}", output::ok(&format!("Configuration written to {}", path.display())));
            eprintln!("  Sign in with: rxlink login --profile {profile_name}");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(&global.output, &cfg, format_config, |c| {
                c.profiles.keys().cloned().collect::<Vec<_>>().join("\n")
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
