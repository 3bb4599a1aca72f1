//! CLI configuration: thin wrapper around `rxlink_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--domain, --client-id, --api-url, --insecure, --timeout).

use rxlink_core::ProviderConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use rxlink_config::{
    Config, Profile, SessionStore, config_path, load_config, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Apply flag overrides on top of a profile. Flags win.
pub fn apply_overrides(profile: &Profile, global: &GlobalOpts) -> Profile {
    let mut merged = profile.clone();
    if let Some(domain) = &global.domain {
        merged.domain.clone_from(domain);
    }
    if let Some(client_id) = &global.client_id {
        merged.client_id.clone_from(client_id);
    }
    if let Some(api_url) = &global.api_url {
        merged.api_url.clone_from(api_url);
    }
    if global.insecure {
        merged.insecure = Some(true);
    }
    if global.timeout.is_some() {
        merged.timeout = global.timeout;
    }
    merged
}

/// Translate the active profile + global flags into a `ProviderConfig`.
///
/// Without a stored profile, the flags alone must name the domain, client
/// id and API URL.
pub fn resolve_provider_config(
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(String, ProviderConfig), CliError> {
    let profile_name = active_profile_name(global, cfg);

    let profile = if let Some(profile) = cfg.profiles.get(&profile_name) {
        apply_overrides(profile, global)
    } else if global.profile.is_some() {
        return Err(rxlink_config::ConfigError::UnknownProfile {
            profile: profile_name,
        }
        .into());
    } else if global.domain.is_some() && global.client_id.is_some() && global.api_url.is_some() {
        apply_overrides(&Profile::default(), global)
    } else {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    };

    let config = rxlink_config::profile_to_provider_config(&profile, &cfg.defaults)?;
    Ok((profile_name, config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["rxlink"];
        argv.extend_from_slice(args);
        argv.push("whoami");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_dev() -> Config {
        let mut cfg = Config::default();
        cfg.default_profile = Some("dev".into());
        cfg.profiles.insert(
            "dev".into(),
            Profile {
                domain: "https://auth.dev.example.org".into(),
                client_id: "dev-client".into(),
                api_url: "https://api.dev.example.org/graphql".into(),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn flags_override_profile() {
        let g = global(&[
            "--api-url",
            "http://localhost:4000/graphql",
            "--timeout",
            "5",
            "-k",
        ]);
        let (name, config) = resolve_provider_config(&config_with_dev(), &g).unwrap();

        assert_eq!(name, "dev");
        assert_eq!(config.client_id, "dev-client");
        assert_eq!(config.api_url.as_str(), "http://localhost:4000/graphql");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.tls, rxlink_core::TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn flags_alone_are_enough() {
        let g = global(&[
            "--domain",
            "https://auth.example.org",
            "--client-id",
            "cli",
            "--api-url",
            "https://api.example.org/graphql",
        ]);
        let (name, config) = resolve_provider_config(&Config::default(), &g).unwrap();
        assert_eq!(name, "default");
        assert_eq!(config.effective_audience(), "https://api.example.org");
    }

    #[test]
    fn missing_profile_without_flags() {
        let g = global(&[]);
        let err = resolve_provider_config(&Config::default(), &g).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn named_profile_must_exist() {
        let g = global(&["--profile", "prod"]);
        let err = resolve_provider_config(&config_with_dev(), &g).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { ref name, .. } if name == "prod"));
    }
}
