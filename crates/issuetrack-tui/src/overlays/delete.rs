//! Delete confirmation.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Paragraph, Wrap};

use issuetrack_core::controller::{DeleteRequest, DeleteResponse};
use issuetrack_core::{CoreError, IssueDeleteController, RestIssueResource, Translations};

use crate::action::Action;
use crate::component::Component;
use crate::{theme, widgets};

pub type DeleteController = IssueDeleteController<RestIssueResource>;

pub struct DeleteOverlay {
    delete: DeleteController,
    translations: Translations,
    deleting: bool,
    error: Option<String>,
}

impl DeleteOverlay {
    pub fn new(delete: DeleteController, translations: Translations) -> Self {
        Self {
            delete,
            translations,
            deleting: false,
            error: None,
        }
    }

    pub fn controller(&self) -> &DeleteController {
        &self.delete
    }

    pub fn controller_mut(&mut self) -> &mut DeleteController {
        &mut self.delete
    }

    /// Detach the delete. `None` while one is running or for an unsaved issue.
    pub fn request(&mut self) -> Option<DeleteRequest<RestIssueResource>> {
        if self.deleting || !self.delete.modal().is_open() {
            return None;
        }
        let id = self.delete.issue().id?;
        self.deleting = true;
        self.error = None;
        Some(self.delete.delete_request(id))
    }

    /// `Ok(false)` when the response was for another issue; the running
    /// delete is still awaited then.
    pub fn complete(&mut self, response: DeleteResponse) -> Result<bool, CoreError> {
        let result = self.delete.complete_delete(response);
        if !matches!(result, Ok(false)) {
            self.deleting = false;
        }
        result
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

impl Component for DeleteOverlay {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.delete.modal().is_open() {
            return Ok(None);
        }
        let action = match key.code {
            KeyCode::Char('y') | KeyCode::Enter if !self.deleting => Some(Action::ConfirmDelete),
            KeyCode::Char('n') | KeyCode::Esc => Some(Action::CancelModal),
            _ => None,
        };
        Ok(action)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let t = &self.translations;
        let popup_area = widgets::centered_rect(56, 8, area);
        let inner = widgets::popup(frame, popup_area, &t.translate("entity.delete.title", None));

        let [question_area, error_area, hint_area] = Layout::vertical([
            Constraint::Min(2),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let id = self
            .delete
            .issue()
            .id
            .map(|id| id.to_string())
            .unwrap_or_default();
        let question = t.translate_with("issueTrackerApp.issue.delete.question", &[("id", &id)]);
        frame.render_widget(
            Paragraph::new(question)
                .style(theme::value())
                .wrap(Wrap { trim: true }),
            question_area,
        );

        if let Some(error) = &self.error {
            frame.render_widget(
                Paragraph::new(error.as_str()).style(Style::default().fg(theme::ERROR_RED)),
                error_area,
            );
        }

        let delete = t.translate("entity.action.delete", None);
        let cancel = t.translate("entity.action.cancel", None);
        frame.render_widget(
            Paragraph::new(widgets::key_hints(&[
                ("y", delete.as_str()),
                ("n", cancel.as_str()),
            ])),
            hint_area,
        );
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("y", "delete"), ("n/esc", "cancel")]
    }

    fn id(&self) -> &str {
        "delete"
    }
}
