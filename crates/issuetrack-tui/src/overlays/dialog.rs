//! Create/edit form shown over the list or detail page.
//!
//! Text fields are edited in place and copied into the bound issue on
//! submit. State and priority cycle through their allowed values; the
//! created date has a calendar picker.

use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDate, TimeDelta};
use color_eyre::eyre::Result;
use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use issuetrack_core::controller::SaveRequest;
use issuetrack_core::data_utils::byte_size;
use issuetrack_core::date::{WIRE_DATE_FORMAT, local_date_from_server, local_date_to_server};
use issuetrack_core::{CoreError, IssueDialogController, RestIssueResource, Translations};

use crate::action::Action;
use crate::component::Component;
use crate::{theme, widgets};

pub type DialogController = IssueDialogController<RestIssueResource>;

const STATES: &[&str] = &["OPEN", "IN_PROGRESS", "RESOLVED", "CLOSED"];
const PRIORITIES: &[&str] = &["LOW", "MEDIUM", "HIGH", "CRITICAL"];
const CREATED: &str = "created";
const LABEL_WIDTH: u16 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Description,
    Created,
    State,
    Priority,
    Comment,
    Attachment,
}

impl Field {
    const ALL: [Self; 7] = [
        Self::Name,
        Self::Description,
        Self::Created,
        Self::State,
        Self::Priority,
        Self::Comment,
        Self::Attachment,
    ];

    fn label_key(self) -> &'static str {
        match self {
            Self::Name => "issueTrackerApp.issue.fields.name",
            Self::Description => "issueTrackerApp.issue.fields.description",
            Self::Created => "issueTrackerApp.issue.fields.created",
            Self::State => "issueTrackerApp.issue.fields.state",
            Self::Priority => "issueTrackerApp.issue.fields.priority",
            Self::Comment => "issueTrackerApp.issue.fields.comment",
            Self::Attachment => "issueTrackerApp.issue.fields.attachment",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

pub struct DialogOverlay {
    dialog: DialogController,
    translations: Translations,
    name: Input,
    description: Input,
    created: Input,
    comment: Input,
    /// Path of a file to attach.
    attachment: Input,
    focus: Field,
    error: Option<String>,
}

impl DialogOverlay {
    pub fn new(dialog: DialogController, translations: Translations) -> Self {
        let issue = dialog.issue();
        let text = |value: Option<&str>| Input::new(value.unwrap_or_default().to_owned());
        Self {
            name: text(issue.name.as_deref()),
            description: text(issue.description.as_deref()),
            created: Input::new(local_date_to_server(issue.created).unwrap_or_default()),
            comment: text(issue.comment.as_deref()),
            attachment: Input::default(),
            dialog,
            translations,
            focus: Field::Name,
            error: None,
        }
    }

    pub fn controller(&self) -> &DialogController {
        &self.dialog
    }

    pub fn controller_mut(&mut self) -> &mut DialogController {
        &mut self.dialog
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Copy the form into the issue and detach a save.
    pub fn submit(&mut self) -> Result<SaveRequest<RestIssueResource>, CoreError> {
        self.apply_inputs()?;
        self.error = None;
        self.dialog.begin_save()
    }

    fn apply_inputs(&mut self) -> Result<(), CoreError> {
        let created = local_date_from_server(Some(self.created.value()))?;
        let non_empty = |input: &Input| {
            let value = input.value().trim();
            (!value.is_empty()).then(|| value.to_owned())
        };
        let name = non_empty(&self.name);
        let description = non_empty(&self.description);
        let comment = non_empty(&self.comment);

        let issue = self.dialog.issue_mut();
        issue.name = name;
        issue.description = description;
        issue.comment = comment;
        issue.created = created;
        Ok(())
    }

    fn input_mut(&mut self, field: Field) -> Option<&mut Input> {
        match field {
            Field::Name => Some(&mut self.name),
            Field::Description => Some(&mut self.description),
            Field::Created => Some(&mut self.created),
            Field::Comment => Some(&mut self.comment),
            Field::Attachment => Some(&mut self.attachment),
            Field::State | Field::Priority => None,
        }
    }

    fn input(&self, field: Field) -> Option<&Input> {
        match field {
            Field::Name => Some(&self.name),
            Field::Description => Some(&self.description),
            Field::Created => Some(&self.created),
            Field::Comment => Some(&self.comment),
            Field::Attachment => Some(&self.attachment),
            Field::State | Field::Priority => None,
        }
    }

    /// Step state or priority through its allowed values.
    fn cycle(&mut self, field: Field, forward: bool) {
        let issue = self.dialog.issue_mut();
        let (values, slot) = match field {
            Field::State => (STATES, &mut issue.state),
            Field::Priority => (PRIORITIES, &mut issue.priority),
            _ => return,
        };
        let len = values.len();
        let current = slot
            .as_deref()
            .and_then(|value| values.iter().position(|v| *v == value));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        *slot = Some(values[next].to_owned());
    }

    fn picked_date(&self) -> NaiveDate {
        local_date_from_server(Some(self.created.value()))
            .ok()
            .flatten()
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn shift_date(&mut self, days: i64) {
        let current = self.picked_date();
        let date = current
            .checked_add_signed(TimeDelta::days(days))
            .unwrap_or(current);
        self.created = Input::new(date.format(WIRE_DATE_FORMAT).to_string());
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.shift_date(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_date(1),
            KeyCode::Up | KeyCode::Char('k') => self.shift_date(-7),
            KeyCode::Down | KeyCode::Char('j') => self.shift_date(7),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                if self.created.value().trim().is_empty() {
                    self.shift_date(0);
                }
                self.dialog.close_calendar(CREATED);
            }
            _ => {}
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn value_row(&self, frame: &mut Frame, area: Rect, field: Field) {
        let label = self.translations.translate(field.label_key(), None);
        let focused = self.focus == field;
        if let Some(input) = self.input(field) {
            widgets::input_row(frame, area, &label, input, focused, LABEL_WIDTH);
            return;
        }

        let issue = self.dialog.issue();
        let (kind, value) = match field {
            Field::State => ("State", issue.state.as_deref()),
            _ => ("Priority", issue.priority.as_deref()),
        };
        let shown = widgets::enum_label(&self.translations, kind, value);
        let marker = if focused { "▸" } else { " " };
        let style = if focused {
            theme::table_selected()
        } else {
            theme::value()
        };
        let line = Line::from(vec![
            Span::styled(
                format!("{marker}{label:<width$}", width = usize::from(LABEL_WIDTH)),
                theme::label(),
            ),
            Span::styled(format!("◂ {shown} ▸"), style),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn attachment_line(&self) -> Line<'static> {
        let issue = self.dialog.issue();
        let summary = match issue.attachment.as_deref() {
            Some(data) if issue.has_attachment() => format!(
                "{}, {}",
                issue.attachment_content_type.as_deref().unwrap_or("?"),
                byte_size(data)
            ),
            _ => String::from("-"),
        };
        Line::from(vec![
            Span::raw(" ".repeat(usize::from(LABEL_WIDTH) + 1)),
            Span::styled(summary, theme::key_hint()),
        ])
    }

    fn render_calendar(&self, frame: &mut Frame, anchor: Rect) {
        let selected = self.picked_date();
        let area = Rect::new(anchor.x + LABEL_WIDTH + 1, anchor.y + 1, 24, 10)
            .intersection(frame.area());
        let inner = widgets::popup(frame, area, &selected.format("%B %Y").to_string());
        frame.render_widget(Paragraph::new(calendar_lines(selected)), inner);
    }
}

/// Month grid for `selected`, weeks starting on Monday.
fn calendar_lines(selected: NaiveDate) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled("Mo Tu We Th Fr Sa Su", theme::table_header())];
    let Some(first) = selected.with_day(1) else {
        return lines;
    };
    let offset = first.weekday().num_days_from_monday() as usize;
    let days = first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(28, |last| last.day());

    let mut week: Vec<Span<'static>> = vec![Span::raw("   ".repeat(offset))];
    for day in 1..=days {
        let style = if day == selected.day() {
            theme::table_selected()
        } else {
            theme::table_row()
        };
        week.push(Span::styled(format!("{day:>2}"), style));
        week.push(Span::raw(" "));
        if (offset + day as usize) % 7 == 0 {
            lines.push(Line::from(std::mem::take(&mut week)));
        }
    }
    if !week.is_empty() {
        lines.push(Line::from(week));
    }
    lines
}

impl Component for DialogOverlay {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.dialog.modal().is_open() {
            return Ok(None);
        }
        if self.dialog.date_picker_open(CREATED) {
            self.handle_calendar_key(key);
            return Ok(None);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => return Ok(Some(Action::SubmitDialog)),
                KeyCode::Char('x') if self.focus == Field::Attachment => {
                    self.dialog.clear_attachment();
                    self.attachment.reset();
                    return Ok(None);
                }
                _ => {}
            }
        }

        let action = match key.code {
            KeyCode::Esc => Some(Action::CancelModal),
            KeyCode::Tab | KeyCode::Down => {
                self.focus = self.focus.next();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = self.focus.prev();
                None
            }
            KeyCode::Left if matches!(self.focus, Field::State | Field::Priority) => {
                self.cycle(self.focus, false);
                None
            }
            KeyCode::Right | KeyCode::Char(' ')
                if matches!(self.focus, Field::State | Field::Priority) =>
            {
                self.cycle(self.focus, true);
                None
            }
            KeyCode::Char(' ') if self.focus == Field::Created => {
                self.dialog.open_calendar(CREATED);
                None
            }
            KeyCode::Enter if self.focus == Field::Attachment => {
                let path = self.attachment.value().trim();
                (!path.is_empty()).then(|| Action::Attach(PathBuf::from(path)))
            }
            KeyCode::Enter => {
                self.focus = self.focus.next();
                None
            }
            _ => {
                if let Some(input) = self.input_mut(self.focus) {
                    input.handle_event(&CrosstermEvent::Key(key));
                }
                None
            }
        };
        Ok(action)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let issue = self.dialog.issue();
        let mut title = self
            .translations
            .translate("issueTrackerApp.issue.home.createOrEditLabel", None);
        if let Some(id) = issue.id {
            title.push_str(&format!(" #{id}"));
        }
        if self.dialog.is_saving() {
            title.push_str(" · saving…");
        }

        let popup_area = widgets::centered_rect(72, 15, area);
        let inner = widgets::popup(frame, popup_area, &title);

        let mut constraints = vec![Constraint::Length(1); Field::ALL.len() + 1];
        constraints.push(Constraint::Length(1));
        constraints.push(Constraint::Min(1));
        constraints.push(Constraint::Length(1));
        let rows = Layout::vertical(constraints).split(inner);

        for (i, field) in Field::ALL.iter().enumerate() {
            self.value_row(frame, rows[i], *field);
        }
        frame.render_widget(Paragraph::new(self.attachment_line()), rows[Field::ALL.len()]);

        if let Some(error) = &self.error {
            frame.render_widget(
                Paragraph::new(error.as_str()).style(Style::default().fg(theme::ERROR_RED)),
                rows[Field::ALL.len() + 1],
            );
        }

        let save = self.translations.translate("entity.action.save", None);
        let cancel = self.translations.translate("entity.action.cancel", None);
        frame.render_widget(
            Paragraph::new(widgets::key_hints(&[
                ("ctrl+s", save.as_str()),
                ("esc", cancel.as_str()),
            ])),
            rows[Field::ALL.len() + 3],
        );

        if self.dialog.date_picker_open(CREATED) {
            self.render_calendar(frame, rows[Field::Created.index()]);
        }
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        match self.focus {
            Field::Created => &[("space", "calendar"), ("tab", "next field")],
            Field::State | Field::Priority => &[("← →", "choose"), ("tab", "next field")],
            Field::Attachment => &[("enter", "attach file"), ("ctrl+x", "remove")],
            _ => &[("tab", "next field"), ("shift+tab", "previous field")],
        }
    }

    fn id(&self) -> &str {
        "dialog"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use issuetrack_core::{Issue, IssueId, IssueUpdates};

    use super::*;
    use crate::testing::{client_config, translations};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn overlay(issue: Issue) -> DialogOverlay {
        let resource = RestIssueResource::new(client_config().api_client(None).unwrap());
        let dialog = IssueDialogController::new(resource, IssueUpdates::new(), issue);
        DialogOverlay::new(dialog, translations())
    }

    fn type_text(overlay: &mut DialogOverlay, text: &str) {
        for c in text.chars() {
            overlay.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn typed_fields_reach_the_issue_on_submit() {
        let mut overlay = overlay(Issue::blank());
        type_text(&mut overlay, "Bug A");
        overlay.handle_key_event(key(KeyCode::Tab)).unwrap();
        overlay.handle_key_event(key(KeyCode::Tab)).unwrap();
        type_text(&mut overlay, "2017-03-14");

        let request = overlay.submit().unwrap();
        assert_eq!(request.issue().name.as_deref(), Some("Bug A"));
        assert_eq!(request.issue().description, None);
        assert_eq!(request.issue().created, NaiveDate::from_ymd_opt(2017, 3, 14));
        assert!(overlay.controller().is_saving());
    }

    #[test]
    fn bad_date_blocks_the_save() {
        let mut overlay = overlay(Issue::blank());
        overlay.handle_key_event(key(KeyCode::Tab)).unwrap();
        overlay.handle_key_event(key(KeyCode::Tab)).unwrap();
        type_text(&mut overlay, "14/03/2017");

        assert!(matches!(overlay.submit(), Err(CoreError::InvalidDate { .. })));
        assert!(!overlay.controller().is_saving());
    }

    #[test]
    fn second_submit_while_saving_is_rejected() {
        let mut overlay = overlay(Issue::blank());
        let _first = overlay.submit().unwrap();
        assert!(matches!(overlay.submit(), Err(CoreError::SaveInProgress)));
    }

    #[test]
    fn state_cycles_through_values() {
        let mut overlay = overlay(Issue {
            id: Some(IssueId::new(7)),
            state: Some("CLOSED".into()),
            ..Issue::default()
        });
        for _ in 0..3 {
            overlay.handle_key_event(key(KeyCode::Tab)).unwrap();
        }
        overlay.handle_key_event(key(KeyCode::Right)).unwrap();
        assert_eq!(overlay.controller().issue().state.as_deref(), Some("OPEN"));
        overlay.handle_key_event(key(KeyCode::Left)).unwrap();
        overlay.handle_key_event(key(KeyCode::Left)).unwrap();
        assert_eq!(overlay.controller().issue().state.as_deref(), Some("RESOLVED"));
    }

    #[test]
    fn calendar_moves_the_created_date() {
        let mut overlay = overlay(Issue {
            created: NaiveDate::from_ymd_opt(2017, 3, 14),
            ..Issue::default()
        });
        overlay.handle_key_event(key(KeyCode::Tab)).unwrap();
        overlay.handle_key_event(key(KeyCode::Tab)).unwrap();
        overlay.handle_key_event(key(KeyCode::Char(' '))).unwrap();
        assert!(overlay.controller().date_picker_open(CREATED));

        overlay.handle_key_event(key(KeyCode::Down)).unwrap();
        overlay.handle_key_event(key(KeyCode::Left)).unwrap();
        overlay.handle_key_event(key(KeyCode::Enter)).unwrap();

        assert!(!overlay.controller().date_picker_open(CREATED));
        let request = overlay.submit().unwrap();
        assert_eq!(request.issue().created, NaiveDate::from_ymd_opt(2017, 3, 20));
    }

    #[test]
    fn attachment_path_and_clear() {
        let mut overlay = overlay(Issue {
            attachment: Some("aGVsbG8=".into()),
            attachment_content_type: Some("text/plain".into()),
            ..Issue::default()
        });
        // Back from the first field wraps to the attachment.
        overlay.handle_key_event(key(KeyCode::BackTab)).unwrap();
        assert!(overlay.handle_key_event(key(KeyCode::Enter)).unwrap().is_none());
        type_text(&mut overlay, "notes.txt");
        match overlay.handle_key_event(key(KeyCode::Enter)).unwrap() {
            Some(Action::Attach(path)) => assert_eq!(path, PathBuf::from("notes.txt")),
            other => panic!("expected attach, got {other:?}"),
        }

        overlay.handle_key_event(ctrl('x')).unwrap();
        assert!(!overlay.controller().issue().has_attachment());
    }

    #[test]
    fn esc_cancels_and_ctrl_s_submits() {
        let mut overlay = overlay(Issue::blank());
        assert!(matches!(
            overlay.handle_key_event(key(KeyCode::Esc)).unwrap(),
            Some(Action::CancelModal)
        ));
        assert!(matches!(
            overlay.handle_key_event(ctrl('s')).unwrap(),
            Some(Action::SubmitDialog)
        ));
    }

    #[test]
    fn calendar_grid_starts_on_monday() {
        // 2017-03-01 was a Wednesday.
        let lines = calendar_lines(NaiveDate::from_ymd_opt(2017, 3, 14).unwrap());
        let first_week: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first_week, "       1  2  3  4  5 ");
        assert_eq!(lines.len(), 1 + 5);
    }
}
