//! Command dispatch: bridges CLI args -> core controllers -> output formatting.

pub mod config_cmd;
pub mod issues;
pub mod util;

use std::sync::Arc;

use issuetrack_core::{
    AlertSink, ClientConfig, IssueUpdates, RestIssueResource, RestIssueSearch,
};

use crate::alerts::CliAlerts;
use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Everything a server-bound command needs.
pub struct Session {
    pub resource: RestIssueResource,
    pub search: RestIssueSearch,
    pub updates: IssueUpdates,
    pub config: ClientConfig,
    pub output: OutputFormat,
    pub quiet: bool,
    pub yes: bool,
}

impl Session {
    pub fn connect(
        config: ClientConfig,
        output: OutputFormat,
        global: &GlobalOpts,
    ) -> Result<Self, CliError> {
        let sink: Option<Arc<dyn AlertSink>> = if global.quiet {
            None
        } else {
            Some(Arc::new(CliAlerts::stderr(&config.language)?))
        };
        let client = config.api_client(sink)?;
        Ok(Self {
            resource: RestIssueResource::new(client.clone()),
            search: RestIssueSearch::new(client),
            updates: IssueUpdates::new(),
            config,
            output,
            quiet: global.quiet,
            yes: global.yes,
        })
    }
}

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session) -> Result<(), CliError> {
    match cmd {
        Command::Issues(args) => issues::handle(args, session).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before connecting".into(),
        )),
    }
}
