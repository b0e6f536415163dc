//! Issue command handlers.

use std::path::Path;
use std::sync::Arc;

use tabled::Tabled;

use issuetrack_core::data_utils::{abbreviate, byte_size};
use issuetrack_core::{
    BundledTranslations, Issue, IssueDeleteController, IssueDetailController,
    IssueDialogController, IssueId, IssueListController, IssueRecord, IssueSearch, PagingParams,
    PreviousState, RestIssueResource, Router, SearchQuery,
};

use crate::cli::{IssueFields, IssuesArgs, IssuesCommand};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Attachment")]
    attachment: String,
}

impl From<&Issue> for IssueRow {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id.map(|id| id.to_string()).unwrap_or_default(),
            name: issue.name.clone().unwrap_or_default(),
            description: issue.description.as_deref().map(abbreviate).unwrap_or_default(),
            created: issue.created.map(|d| d.to_string()).unwrap_or_default(),
            state: issue.state.clone().unwrap_or_default(),
            priority: issue.priority.clone().unwrap_or_default(),
            attachment: attachment_summary(
                issue.attachment_content_type.as_deref(),
                issue.attachment.as_deref(),
            ),
        }
    }
}

/// Search hits are shown as the server sent them.
impl From<&IssueRecord> for IssueRow {
    fn from(record: &IssueRecord) -> Self {
        Self {
            id: record.id.map(|id| id.to_string()).unwrap_or_default(),
            name: record.name.clone().unwrap_or_default(),
            description: record.description.as_deref().map(abbreviate).unwrap_or_default(),
            created: record.created.clone().unwrap_or_default(),
            state: record.state.clone().unwrap_or_default(),
            priority: record.priority.clone().unwrap_or_default(),
            attachment: attachment_summary(
                record.attachment_content_type.as_deref(),
                record.attachment.as_deref(),
            ),
        }
    }
}

fn attachment_summary(content_type: Option<&str>, data: Option<&str>) -> String {
    match data {
        Some(data) if !data.is_empty() => {
            format!("{}, {}", content_type.unwrap_or("?"), byte_size(data))
        }
        _ => String::new(),
    }
}

fn detail(issue: &Issue) -> String {
    let dash = |v: Option<&str>| v.unwrap_or("-").to_owned();
    let mut lines = vec![
        format!("ID:          {}", issue.id.map_or_else(|| "-".into(), |id| id.to_string())),
        format!("Name:        {}", dash(issue.name.as_deref())),
        format!("Description: {}", dash(issue.description.as_deref())),
        format!("Created:     {}", issue.created.map_or_else(|| "-".into(), |d| d.to_string())),
        format!("State:       {}", dash(issue.state.as_deref())),
        format!("Priority:    {}", dash(issue.priority.as_deref())),
        format!("Comment:     {}", dash(issue.comment.as_deref())),
    ];
    if issue.has_attachment() {
        lines.push(format!(
            "Attachment:  {}",
            attachment_summary(
                issue.attachment_content_type.as_deref(),
                issue.attachment.as_deref()
            )
        ));
    }
    lines.join("\n")
}

fn issue_id(issue: &Issue) -> String {
    issue.id.map(|id| id.to_string()).unwrap_or_default()
}

// ── Helpers ─────────────────────────────────────────────────────────

fn router(session: &Session) -> Router<RestIssueResource> {
    Router::new(
        session.resource.clone(),
        Arc::new(BundledTranslations),
        session.config.authorities.clone(),
        &session.config.language,
    )
}

/// Enter `url` and return the issue its state resolved.
async fn resolve_issue(
    router: &mut Router<RestIssueResource>,
    url: &str,
) -> Result<(Issue, Option<PreviousState>), CliError> {
    let activation = router.navigate(url).await?;
    let issue = activation
        .entity()
        .cloned()
        .ok_or_else(|| CliError::Internal(format!("{url} resolved no issue")))?;
    let previous = activation
        .resolved(activation.state)
        .and_then(|resolved| resolved.previous_state.clone());
    Ok((issue, previous))
}

fn apply_fields(issue: &mut Issue, fields: &IssueFields) {
    let IssueFields {
        name,
        description,
        created,
        state,
        priority,
        comment,
        ..
    } = fields;
    if let Some(name) = name {
        issue.name = Some(name.clone());
    }
    if let Some(description) = description {
        issue.description = Some(description.clone());
    }
    if let Some(created) = created {
        issue.created = Some(*created);
    }
    if let Some(state) = state {
        issue.state = Some(state.clone());
    }
    if let Some(priority) = priority {
        issue.priority = Some(priority.clone());
    }
    if let Some(comment) = comment {
        issue.comment = Some(comment.clone());
    }
}

/// Run the create/edit dialog on `issue` with `fields` applied, then save.
async fn save(session: &Session, issue: Issue, fields: &IssueFields) -> Result<Issue, CliError> {
    let mut dialog =
        IssueDialogController::new(session.resource.clone(), session.updates.clone(), issue);
    apply_fields(dialog.issue_mut(), fields);
    if fields.clear_attachment {
        dialog.clear_attachment();
    } else {
        dialog.set_attachment(fields.attachment.as_deref()).await?;
    }
    Ok(dialog.save().await?)
}

fn print_issue(session: &Session, issue: &Issue) {
    let out = output::render_single(session.output, issue, detail, issue_id);
    output::print_output(&out, session.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: IssuesArgs, session: &Session) -> Result<(), CliError> {
    match args.command {
        IssuesCommand::List { page, sort, search } => {
            let paging =
                PagingParams::from_query(page.as_deref(), sort.as_deref(), search.as_deref());
            let mut list = IssueListController::new(
                session.resource.clone(),
                session.search.clone(),
                paging,
                session.updates.subscribe(),
            );
            list.load_all().await?;

            let out = output::render_list(
                session.output,
                list.issues(),
                |i| IssueRow::from(i),
                issue_id,
            );
            output::print_output(&out, session.quiet);
            if !session.quiet {
                eprintln!(
                    "page {} of {} ({} issues)",
                    list.paging().page,
                    list.page_count().max(1),
                    list.total_count()
                );
            }
            Ok(())
        }

        IssuesCommand::Get { id } => {
            let mut router = router(session);
            let (issue, _) = resolve_issue(&mut router, &format!("/issue/{id}")).await?;
            print_issue(session, &issue);
            Ok(())
        }

        IssuesCommand::Search { text, page } => {
            let paging = PagingParams::default()
                .with_sort("_score", false)
                .with_search(Some(text.clone()))
                .with_page(page.unwrap_or(1));
            let query = SearchQuery::from_paging(&paging).unwrap_or_else(|| SearchQuery::new(text));
            let hits = session.search.search(&query).await?;

            let out = output::render_list(session.output, &hits, |r| IssueRow::from(r), |r| {
                r.id.map(|id| id.to_string()).unwrap_or_default()
            });
            output::print_output(&out, session.quiet);
            Ok(())
        }

        IssuesCommand::Create { fields } => {
            if fields.name.as_deref().is_none_or(str::is_empty) {
                return Err(CliError::Validation {
                    field: "name".into(),
                    reason: "a new issue needs --name".into(),
                });
            }
            let mut router = router(session);
            let (blank, _) = resolve_issue(&mut router, "/issue/new").await?;
            let saved = save(session, blank, &fields).await?;
            print_issue(session, &saved);
            Ok(())
        }

        IssuesCommand::Update { id, fields } => {
            let mut router = router(session);
            let (issue, _) = resolve_issue(&mut router, &format!("/issue/{id}/edit")).await?;
            let saved = save(session, issue, &fields).await?;
            print_issue(session, &saved);
            Ok(())
        }

        IssuesCommand::Delete { id } => {
            let mut router = router(session);
            let (issue, _) = resolve_issue(&mut router, &format!("/issue/{id}/delete")).await?;
            let question = router.translations().translate_with(
                "issueTrackerApp.issue.delete.question",
                &[("id", &id.to_string())],
            );
            if !util::confirm(&question, "issues delete", session.yes)? {
                return Ok(());
            }

            let mut controller = IssueDeleteController::new(session.resource.clone(), issue);
            controller.confirm_delete(IssueId::new(id)).await?;
            Ok(())
        }

        IssuesCommand::Attachment { id, dir } => {
            let mut router = router(session);
            let (issue, previous) = resolve_issue(&mut router, &format!("/issue/{id}")).await?;
            let view = IssueDetailController::new(
                issue,
                previous.unwrap_or_else(PreviousState::list),
                session.updates.subscribe(),
            );
            write_attachment(&view, &dir, session.quiet).await
        }
    }
}

async fn write_attachment(
    detail: &IssueDetailController,
    dir: &Path,
    quiet: bool,
) -> Result<(), CliError> {
    let issue = detail.issue();
    let (Some(data), Some(content_type)) = (
        issue.attachment.as_deref().filter(|d| !d.is_empty()),
        issue.attachment_content_type.as_deref(),
    ) else {
        return Err(CliError::NotFound {
            identifier: format!("attachment of issue {}", issue_id(issue)),
        });
    };
    let path = detail.open_file(content_type, data, dir).await?;
    if !quiet {
        eprintln!("wrote {} ({})", path.display(), detail.byte_size(data));
    }
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn fields_only_touch_given_values() {
        let mut issue = Issue {
            id: Some(IssueId::new(7)),
            name: Some("Bug A".into()),
            state: Some("OPEN".into()),
            ..Issue::default()
        };
        apply_fields(
            &mut issue,
            &IssueFields {
                created: NaiveDate::from_ymd_opt(2017, 3, 14),
                state: Some("CLOSED".into()),
                ..IssueFields::default()
            },
        );
        assert_eq!(issue.name.as_deref(), Some("Bug A"));
        assert_eq!(issue.state.as_deref(), Some("CLOSED"));
        assert_eq!(issue.created, NaiveDate::from_ymd_opt(2017, 3, 14));
    }

    #[test]
    fn row_abbreviates_long_descriptions() {
        let issue = Issue {
            description: Some("a description that is far too long for a table".into()),
            ..Issue::default()
        };
        let row = IssueRow::from(&issue);
        assert_eq!(row.description, "a description t...or a table");
    }

    #[test]
    fn attachment_summary_shows_size() {
        assert_eq!(attachment_summary(Some("text/plain"), Some("aGVsbG8=")), "text/plain, 5 bytes");
        assert_eq!(attachment_summary(None, None), "");
    }
}
