//! Shared configuration for rxlink tools.
//!
//! TOML profiles with an `RXLINK_*` environment overlay, keyring-backed
//! session persistence, and translation to `rxlink_core::ProviderConfig`.
//! The CLI adds flag-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use rxlink_core::{ProviderConfig, TlsVerification};

/// Environment overlay prefix. Nested keys are separated by `__`, e.g.
/// `RXLINK_PROFILES__DEV__API_URL`.
pub const ENV_PREFIX: &str = "RXLINK_";

/// Keyring service name sessions are stored under.
pub const KEYRING_SERVICE: &str = "rxlink";

/// Redirect URI used when a profile names none.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/callback";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no profile named '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named tenant/API profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Resolve `name`, falling back to the default profile.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// One identity tenant plus the API it issues tokens for.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Identity provider domain (e.g. "https://auth.example.org").
    #[serde(default)]
    pub domain: String,

    /// Public OAuth client id.
    #[serde(default)]
    pub client_id: String,

    /// GraphQL endpoint (e.g. "https://api.example.org/graphql").
    #[serde(default)]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Token audience. Defaults to the API origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,

    /// Organization to log in as by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "rxlink", "rxlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("rxlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing is fine) with the environment overlay on top.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

fn required_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "missing"));
    }
    value
        .parse()
        .map_err(|e| invalid(field, format!("invalid URL '{value}': {e}")))
}

/// Build a `ProviderConfig` from a profile, no CLI flag overrides.
pub fn profile_to_provider_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ProviderConfig, ConfigError> {
    let domain = required_url("domain", &profile.domain)?;
    let api_url = required_url("api_url", &profile.api_url)?;
    if profile.client_id.trim().is_empty() {
        return Err(invalid("client_id", "missing"));
    }
    let redirect_uri = required_url(
        "redirect_uri",
        profile.redirect_uri.as_deref().unwrap_or(DEFAULT_REDIRECT_URI),
    )?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ProviderConfig::new(domain, profile.client_id.clone(), redirect_uri, api_url);
    config.audience.clone_from(&profile.audience);
    config.organization.clone_from(&profile.organization);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(config)
}

// ── Session persistence ─────────────────────────────────────────────

/// Per-profile refresh tokens in the OS keyring. Never written to the
/// config file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    service: String,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl SessionStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, profile: &str) -> Result<keyring::Entry, ConfigError> {
        Ok(keyring::Entry::new(
            &self.service,
            &format!("{profile}/refresh-token"),
        )?)
    }

    pub fn load(&self, profile: &str) -> Result<Option<SecretString>, ConfigError> {
        match self.entry(profile)?.get_password() {
            Ok(secret) => Ok(Some(SecretString::from(secret))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, profile: &str, refresh_token: &SecretString) -> Result<(), ConfigError> {
        self.entry(profile)?
            .set_password(refresh_token.expose_secret())?;
        debug!(profile, "session stored in keyring");
        Ok(())
    }

    /// Forget the stored session. Missing is fine.
    pub fn clear(&self, profile: &str) -> Result<(), ConfigError> {
        match self.entry(profile)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
