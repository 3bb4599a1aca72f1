#![allow(clippy::unwrap_used)]
// Profile loading, saving and translation to `ProviderConfig`.

use std::path::Path;
use std::time::Duration;

use figment::Jail;
use pretty_assertions::assert_eq;

use rxlink_config::{
    Config, ConfigError, Defaults, Profile, load_config_from, profile_to_provider_config,
    save_config_to,
};
use rxlink_core::TlsVerification;

fn profile() -> Profile {
    Profile {
        domain: "https://auth.example.org".into(),
        client_id: "client-123".into(),
        api_url: "https://api.example.org/graphql".into(),
        organization: Some("org_1".into()),
        ..Profile::default()
    }
}

// ── Load / save ─────────────────────────────────────────────────────

#[test]
fn test_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    cfg.profiles.insert("default".into(), profile());
    save_config_to(&cfg, &path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("[profiles.default]"));
    assert!(!written.contains("refresh"));

    let loaded = load_config_from(&path).unwrap();
    assert_eq!(loaded, cfg);
}

#[test]
fn test_missing_file_yields_defaults() {
    let loaded = load_config_from(Path::new("/nonexistent/rxlink/config.toml")).unwrap();
    assert_eq!(loaded.default_profile.as_deref(), Some("default"));
    assert!(loaded.profiles.is_empty());
    assert_eq!(loaded.defaults.output, "table");
}

#[test]
fn test_environment_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            default_profile = "dev"

            [profiles.dev]
            domain = "https://auth.dev.example.org"
            client_id = "dev-client"
            api_url = "https://api.dev.example.org/graphql"
            "#,
        )?;
        jail.set_env("RXLINK_PROFILES__DEV__API_URL", "http://localhost:4000/graphql");
        jail.set_env("RXLINK_DEFAULTS__TIMEOUT", "5");

        let cfg = load_config_from(&jail.directory().join("config.toml"))
            .map_err(|e| e.to_string())?;
        let (name, dev) = cfg.profile(None).map_err(|e| e.to_string())?;

        assert_eq!(name, "dev");
        assert_eq!(dev.client_id, "dev-client");
        assert_eq!(dev.api_url, "http://localhost:4000/graphql");
        assert_eq!(cfg.defaults.timeout, 5);
        Ok(())
    });
}

#[test]
fn test_unknown_profile() {
    let cfg = Config::default();
    assert!(matches!(
        cfg.profile(Some("prod")),
        Err(ConfigError::UnknownProfile { profile }) if profile == "prod"
    ));
}

// ── Translation ─────────────────────────────────────────────────────

#[test]
fn test_profile_to_provider_config() {
    let config = profile_to_provider_config(&profile(), &Defaults::default()).unwrap();

    assert_eq!(config.domain.as_str(), "https://auth.example.org/");
    assert_eq!(config.redirect_uri.as_str(), "http://localhost:3000/callback");
    assert_eq!(config.effective_audience(), "https://api.example.org");
    assert_eq!(config.organization.as_deref(), Some("org_1"));
    assert_eq!(config.tls, TlsVerification::SystemDefaults);
    assert_eq!(config.timeout, Duration::from_secs(30));
}

#[test]
fn test_profile_overrides_defaults() {
    let mut p = profile();
    p.timeout = Some(3);
    p.audience = Some("urn:rx-api".into());
    p.ca_cert = Some("/etc/ssl/rx.pem".into());

    let config = profile_to_provider_config(&p, &Defaults::default()).unwrap();
    assert_eq!(config.timeout, Duration::from_secs(3));
    assert_eq!(config.effective_audience(), "urn:rx-api");
    assert_eq!(config.tls, TlsVerification::CustomCa("/etc/ssl/rx.pem".into()));

    p.insecure = Some(true);
    let config = profile_to_provider_config(&p, &Defaults::default()).unwrap();
    assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
}

#[test]
fn test_missing_required_fields() {
    for (field, p) in [
        ("domain", Profile { domain: String::new(), ..profile() }),
        ("client_id", Profile { client_id: "  ".into(), ..profile() }),
        ("api_url", Profile { api_url: String::new(), ..profile() }),
    ] {
        match profile_to_provider_config(&p, &Defaults::default()) {
            Err(ConfigError::Validation { field: f, reason }) => {
                assert_eq!(f, field);
                assert_eq!(reason, "missing");
            }
            other => panic!("expected validation error for {field}, got {other:?}"),
        }
    }
}

#[test]
fn test_malformed_url() {
    let p = Profile {
        api_url: "not a url".into(),
        ..profile()
    };
    let err = profile_to_provider_config(&p, &Defaults::default()).unwrap_err();
    assert!(err.to_string().starts_with("invalid api_url"));
}
