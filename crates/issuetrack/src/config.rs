//! CLI flag overrides on top of `issuetrack-config`.
//!
//! Core never sees these types; it receives a pre-built `ClientConfig`.

use std::time::Duration;

use secrecy::SecretString;

use issuetrack_config::{Config, Profile};
use issuetrack_core::{ClientConfig, TlsVerification};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use issuetrack_config::{config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Output format: flag, then config default, then table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        clap::ValueEnum::from_str(&config.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
pub fn build_client_config(global: &GlobalOpts, cfg: &Config) -> Result<ClientConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let base = match cfg.profiles.get(&profile_name) {
        Some(profile) => {
            issuetrack_config::profile_to_client_config(profile, &profile_name, &cfg.defaults)?
        }
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available.join(", "),
            });
        }
        None => {
            // No profile: build from CLI flags / env vars alone.
            let server = global.server.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let profile = Profile::new(server);
            issuetrack_config::profile_to_client_config(&profile, &profile_name, &cfg.defaults)?
        }
    };

    apply_overrides(base, global)
}

fn apply_overrides(mut config: ClientConfig, global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    if let Some(ref server) = global.server {
        config.url = server.parse().map_err(|_| CliError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {server}"),
        })?;
    }
    if let Some(ref token) = global.api_token {
        config.token = Some(SecretString::from(token.clone()));
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}
