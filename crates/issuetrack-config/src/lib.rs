//! Shared configuration for the issuetrack CLI and TUI.
//!
//! TOML profiles, token resolution (env + keyring + plaintext), and
//! translation to `issuetrack_core::ClientConfig`. The CLI layers its
//! flag overrides on top of `profile_to_client_config`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use issuetrack_core::{ClientConfig, ROLE_USER, TlsVerification};

/// Keyring service under which profile tokens are stored.
pub const KEYRING_SERVICE: &str = "issuetrack";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' is not defined")]
    UnknownProfile { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// A config with a single `default` profile pointing at `server`.
    pub fn starter(server: &str) -> Self {
        let mut cfg = Self::default();
        cfg.profiles.insert("default".into(), Profile::new(server));
        cfg
    }

    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|profile| (name.to_owned(), profile))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Output format: table, json, json-compact, yaml, plain.
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Translation language.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            language: default_language(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_language() -> String {
    "en".into()
}

/// A named server profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Server root URL (e.g., "http://localhost:8080/").
    pub server: String,

    /// Application name used in alert header names.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// API token (plaintext, prefer keyring or env var).
    pub api_token: Option<String>,

    /// Environment variable name containing the API token.
    pub api_token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Authorities granted to the user of this profile.
    #[serde(default = "default_authorities")]
    pub authorities: Vec<String>,
}

impl Profile {
    pub fn new(server: &str) -> Self {
        Self {
            server: server.into(),
            app_name: default_app_name(),
            api_token: None,
            api_token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            authorities: default_authorities(),
        }
    }
}

fn default_app_name() -> String {
    issuetrack_core::DEFAULT_APP_NAME.into()
}
fn default_authorities() -> Vec<String> {
    vec![ROLE_USER.into()]
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "issuetrack", "issuetrack").map_or_else(
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
    p.push("issuetrack");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` + environment. A missing file yields defaults.
///
/// Env keys nest on `__`, e.g. `ISSUETRACK_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ISSUETRACK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
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

// ── Token resolution (without CLI flags) ────────────────────────────

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/api-token")
}

/// Resolve the profile's API token: `api_token_env`, then the system
/// keyring, then plaintext. `None` when no source has one.
pub fn resolve_api_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    let from_env = profile
        .api_token_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok());
    let from_keyring = || {
        keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
            .and_then(|entry| entry.get_password())
            .ok()
    };
    first_token(from_env, from_keyring, profile.api_token.as_deref())
}

fn first_token(
    from_env: Option<String>,
    from_keyring: impl FnOnce() -> Option<String>,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    from_env
        .filter(|token| !token.is_empty())
        .or_else(from_keyring)
        .or_else(|| plaintext.map(str::to_owned))
        .map(SecretString::from)
}

/// Store a token for `profile_name` in the system keyring.
pub fn store_api_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(token)?;
    Ok(())
}

/// Build a `ClientConfig` from a profile, no CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let url: url::Url = profile
        .server
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", profile.server),
        })?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(ClientConfig {
        url,
        token: resolve_api_token(profile, profile_name),
        app_name: profile.app_name.clone(),
        tls,
        timeout,
        authorities: profile.authorities.clone(),
        language: defaults.language.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "staging"

[defaults]
output = "json"
timeout = 10

[profiles.staging]
server = "https://issues.example.com/"
app_name = "trackerApp"
ca_cert = "/etc/ssl/tracker.pem"

[profiles.local]
server = "http://localhost:8080/"
insecure = true
timeout = 5
"#;

    fn load(contents: &str) -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.defaults.language, "en");
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn file_values_override_defaults() {
        let cfg = load(SAMPLE);
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.language, "en");

        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "staging");
        assert_eq!(profile.app_name, "trackerApp");
        assert_eq!(profile.authorities, vec![ROLE_USER.to_string()]);
    }

    #[test]
    fn unknown_profile_is_reported() {
        let cfg = load(SAMPLE);
        let err = cfg.profile(Some("prod")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { profile } if profile == "prod"));
    }

    #[test]
    fn profile_maps_to_client_config() {
        let cfg = load(SAMPLE);

        let (name, staging) = cfg.profile(Some("staging")).unwrap();
        let client = profile_to_client_config(staging, &name, &cfg.defaults).unwrap();
        assert_eq!(client.url.as_str(), "https://issues.example.com/");
        assert_eq!(client.app_name, "trackerApp");
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert_eq!(
            client.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/ssl/tracker.pem"))
        );

        let (name, local) = cfg.profile(Some("local")).unwrap();
        let client = profile_to_client_config(local, &name, &cfg.defaults).unwrap();
        assert_eq!(client.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(client.app_name, "issueTrackerApp");
    }

    #[test]
    fn bad_server_url_fails_validation() {
        let profile = Profile::new("not a url");
        let err = profile_to_client_config(&profile, "default", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field, .. } if field == "server"));
    }

    #[test]
    fn token_chain_prefers_env_then_keyring_then_plaintext() {
        let token = first_token(Some("env".into()), || Some("ring".into()), Some("plain"));
        assert_eq!(token.unwrap().expose_secret(), "env");

        let token = first_token(None, || Some("ring".into()), Some("plain"));
        assert_eq!(token.unwrap().expose_secret(), "ring");

        let token = first_token(Some(String::new()), || None, Some("plain"));
        assert_eq!(token.unwrap().expose_secret(), "plain");

        assert!(first_token(None, || None, None).is_none());
    }

    #[test]
    fn starter_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        save_config_to(&Config::starter("http://localhost:8080/"), &path).unwrap();

        let cfg = load_config_from(&path).unwrap();
        let (_, profile) = cfg.profile(None).unwrap();
        assert_eq!(profile.server, "http://localhost:8080/");
    }
}
