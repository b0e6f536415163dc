//! Read-only view of one issue.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Row, Table};

use issuetrack_core::{
    Issue, IssueDetailController, StateName, StateParams, Translations,
};

use crate::action::Action;
use crate::component::Component;
use crate::{theme, widgets};

pub struct DetailScreen {
    detail: IssueDetailController,
    translations: Translations,
}

impl DetailScreen {
    pub fn new(detail: IssueDetailController, translations: Translations) -> Self {
        Self {
            detail,
            translations,
        }
    }

    pub fn controller(&self) -> &IssueDetailController {
        &self.detail
    }

    pub fn controller_mut(&mut self) -> &mut IssueDetailController {
        &mut self.detail
    }

    pub fn set_translations(&mut self, translations: Translations) {
        self.translations = translations;
    }

    /// Where the back key leads.
    fn back(&self) -> Action {
        let previous = self.detail.previous();
        match previous.name.parse::<StateName>() {
            Ok(state) => Action::Go {
                state,
                params: previous.params.clone(),
            },
            Err(_) => Action::Go {
                state: StateName::Issue,
                params: StateParams::default(),
            },
        }
    }

    fn rows(&self) -> Vec<Row<'static>> {
        let issue = self.detail.issue();
        let t = &self.translations;
        let field = |key: &str| t.translate(&format!("issueTrackerApp.issue.fields.{key}"), None);
        let text = |value: Option<&str>| value.unwrap_or_default().to_owned();

        let mut rows = vec![
            (field("name"), text(issue.name.as_deref())),
            (field("description"), text(issue.description.as_deref())),
            (
                field("created"),
                issue.created.map(|d| d.to_string()).unwrap_or_default(),
            ),
            (
                field("state"),
                widgets::enum_label(t, "State", issue.state.as_deref()),
            ),
            (
                field("priority"),
                widgets::enum_label(t, "Priority", issue.priority.as_deref()),
            ),
            (field("comment"), text(issue.comment.as_deref())),
        ];
        if let Some(summary) = self.attachment_summary(issue) {
            rows.push((field("attachment"), summary));
        }

        rows.into_iter()
            .map(|(label, value)| {
                Row::new(vec![
                    Cell::from(label).style(theme::label()),
                    Cell::from(value).style(theme::value()),
                ])
            })
            .collect()
    }

    fn attachment_summary(&self, issue: &Issue) -> Option<String> {
        let data = issue.attachment.as_deref().filter(|_| issue.has_attachment())?;
        Some(format!(
            "{}, {}",
            issue.attachment_content_type.as_deref().unwrap_or("?"),
            self.detail.byte_size(data)
        ))
    }
}

impl Component for DetailScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => Some(self.back()),
            KeyCode::Char('e') => self.detail.issue().id.map(|id| Action::Go {
                state: StateName::IssueDetailEdit,
                params: StateParams::with_id(id),
            }),
            KeyCode::Char('o') if self.detail.issue().has_attachment() => {
                Some(Action::OpenAttachment)
            }
            _ => None,
        };
        Ok(action)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let issue = self.detail.issue();
        let title = format!(
            " {} {} ",
            self.translations.translate("issueTrackerApp.issue.detail.title", None),
            issue.id.map(|id| id.to_string()).unwrap_or_default()
        );
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let header = Row::new(vec![
            Cell::from(self.translations.translate("entity.detail.field", None)),
            Cell::from(self.translations.translate("entity.detail.value", None)),
        ])
        .style(theme::table_header());

        let table = Table::new(self.rows(), [Constraint::Length(16), Constraint::Min(10)])
            .header(header)
            .block(block);
        frame.render_widget(table, area);
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("esc", "back"), ("e", "edit"), ("o", "open attachment")]
    }

    fn id(&self) -> &str {
        "detail"
    }
}
