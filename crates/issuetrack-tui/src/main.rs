//! `issuetrack-tui`: terminal front end for the issue tracker.
//!
//! Browse the paged issue list, open an issue, and create, edit or delete
//! issues in modal forms. Navigation runs through the same state table as
//! the CLI, so authorities, resolves and modal exits behave identically.
//!
//! Logs go to a file (default `/tmp/issuetrack-tui.log`) so they never
//! corrupt the terminal.

mod action;
mod app;
mod component;
mod event;
mod overlays;
mod screens;
mod theme;
mod tui;
mod widgets;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, bail};
use secrecy::SecretString;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use issuetrack_config::{Config, Profile};
use issuetrack_core::{ClientConfig, TlsVerification};

use crate::app::App;

/// Terminal UI for browsing and editing issues.
#[derive(Parser, Debug)]
#[command(name = "issuetrack-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short, long, env = "ISSUETRACK_PROFILE")]
    profile: Option<String>,

    /// Server base URL (overrides the profile)
    #[arg(short, long, env = "ISSUETRACK_SERVER")]
    server: Option<String>,

    /// Bearer token for the API
    #[arg(long, env = "ISSUETRACK_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/issuetrack-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may be written to stdout or stderr while
/// the terminal is in raw mode. Hold the guard until exit so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "issuetrack_tui={log_level},issuetrack_core={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("issuetrack-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Resolve the client config: profile first, then flag overrides. Without
/// a matching profile `--server` alone is enough.
fn build_config(cli: &Cli, cfg: &Config) -> Result<ClientConfig> {
    let mut config = match cfg.profile(cli.profile.as_deref()) {
        Ok((name, profile)) => {
            issuetrack_config::profile_to_client_config(profile, &name, &cfg.defaults)?
        }
        Err(err) if cli.profile.is_some() => return Err(err.into()),
        Err(_) => {
            let Some(server) = cli.server.as_deref() else {
                bail!(
                    "no profile in {} and no --server given; run `issuetrack config init`",
                    issuetrack_config::config_path().display()
                );
            };
            issuetrack_config::profile_to_client_config(
                &Profile::new(server),
                "default",
                &cfg.defaults,
            )?
        }
    };

    if let Some(server) = &cli.server {
        config.url = server
            .parse()
            .wrap_err_with(|| format!("invalid server URL: {server}"))?;
    }
    if let Some(token) = &cli.api_token {
        config.token = Some(SecretString::from(token.clone()));
    }
    if cli.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Before the terminal switches to raw mode.
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let config = build_config(&cli, &issuetrack_config::load_config_or_default())?;
    info!(
        server = %config.url,
        profile = cli.profile.as_deref().unwrap_or("(default)"),
        "starting issuetrack-tui"
    );

    let mut app = App::new(&config)?;
    app.run().await
}
