//! Issue list: paged table with sorting and full-text search.

use color_eyre::eyre::Result;
use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use issuetrack_core::controller::{LoadRequest, LoadResponse};
use issuetrack_core::data_utils::{abbreviate, byte_size};
use issuetrack_core::{
    CoreError, Issue, IssueListController, PagingParams, RestIssueResource,
    RestIssueSearch, StateName, StateParams, Translations,
};

use crate::action::Action;
use crate::component::Component;
use crate::{theme, widgets};

pub type ListController = IssueListController<RestIssueResource, RestIssueSearch>;

/// Sortable columns, in the order `s` cycles through them.
const SORT_COLUMNS: &[(&str, &str)] = &[
    ("id", "global.field.id"),
    ("name", "issueTrackerApp.issue.fields.name"),
    ("description", "issueTrackerApp.issue.fields.description"),
    ("created", "issueTrackerApp.issue.fields.created"),
    ("state", "issueTrackerApp.issue.fields.state"),
    ("priority", "issueTrackerApp.issue.fields.priority"),
    ("attachment", "issueTrackerApp.issue.fields.attachment"),
];

pub struct IssuesScreen {
    list: ListController,
    translations: Translations,
    table_state: TableState,
    /// Search text being typed, while the search bar is open.
    search: Option<Input>,
    loading: bool,
}

impl IssuesScreen {
    pub fn new(list: ListController, translations: Translations) -> Self {
        Self {
            list,
            translations,
            table_state: TableState::default().with_selected(Some(0)),
            search: None,
            loading: false,
        }
    }

    pub fn controller(&self) -> &ListController {
        &self.list
    }

    pub fn controller_mut(&mut self) -> &mut ListController {
        &mut self.list
    }

    pub fn set_translations(&mut self, translations: Translations) {
        self.translations = translations;
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    /// Detach a load for the current paging.
    pub fn load_request(&mut self) -> LoadRequest<RestIssueResource, RestIssueSearch> {
        self.loading = true;
        self.list.load_request()
    }

    /// Apply a load. Returns `Ok(false)` for a superseded response.
    pub fn complete_load(&mut self, response: LoadResponse) -> Result<bool, CoreError> {
        let result = self.list.complete_load(response);
        match result {
            Ok(true) => {
                self.loading = false;
                let last = self.list.issues().len().saturating_sub(1);
                let selected = self.table_state.selected().unwrap_or(0);
                self.table_state.select(Some(selected.min(last)));
            }
            Ok(false) => {}
            Err(_) => self.loading = false,
        }
        result
    }

    pub fn selected(&self) -> Option<&Issue> {
        self.list.issues().get(self.table_state.selected()?)
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.list.issues().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.table_state.select(Some(next));
    }

    fn list_params(&self) -> StateParams {
        StateParams::from_paging(self.list.paging())
    }

    fn go_list(paging: &PagingParams) -> Action {
        Action::Go {
            state: StateName::Issue,
            params: StateParams::from_paging(paging),
        }
    }

    /// Navigate to a child state for the selected issue.
    fn go_selected(&self, state: StateName) -> Option<Action> {
        let id = self.selected()?.id?;
        let params = if state == StateName::IssueDetail {
            StateParams::with_id(id)
        } else {
            self.list_params().and_id(id)
        };
        Some(Action::Go { state, params })
    }

    /// Next sort column after the current predicate.
    fn next_sort_column(&self) -> &'static str {
        let predicate = &self.list.paging().predicate;
        let index = SORT_COLUMNS
            .iter()
            .position(|(column, _)| column == predicate)
            .map_or(0, |i| (i + 1) % SORT_COLUMNS.len());
        SORT_COLUMNS[index].0
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Option<Action> {
        let input = self.search.as_mut()?;
        match key.code {
            KeyCode::Enter => {
                let paging = self.list.search(input.value());
                self.search = None;
                Some(Self::go_list(&paging))
            }
            KeyCode::Esc => {
                self.search = None;
                None
            }
            _ => {
                input.handle_event(&CrosstermEvent::Key(key));
                None
            }
        }
    }

    fn header(&self) -> Row<'static> {
        let paging = self.list.paging();
        let arrow = if paging.ascending { " ▲" } else { " ▼" };
        Row::new(SORT_COLUMNS.iter().map(|(column, key)| {
            let mut label = self.translations.translate(key, None);
            if *column == paging.predicate {
                label.push_str(arrow);
            }
            Cell::from(label).style(theme::table_header())
        }))
    }

    fn row(&self, issue: &Issue) -> Row<'static> {
        let attachment = match issue.attachment.as_deref() {
            Some(data) if issue.has_attachment() => format!(
                "{}, {}",
                issue.attachment_content_type.as_deref().unwrap_or("?"),
                byte_size(data)
            ),
            _ => String::new(),
        };
        let state = issue.state.as_deref().unwrap_or_default();
        let priority = issue.priority.as_deref().unwrap_or_default();
        Row::new(vec![
            Cell::from(issue.id.map(|id| id.to_string()).unwrap_or_default()),
            Cell::from(issue.name.clone().unwrap_or_default()),
            Cell::from(issue.description.as_deref().map(abbreviate).unwrap_or_default()),
            Cell::from(issue.created.map(|d| d.to_string()).unwrap_or_default()),
            Cell::from(widgets::enum_label(&self.translations, "State", issue.state.as_deref()))
                .style(theme::state_style(state)),
            Cell::from(widgets::enum_label(
                &self.translations,
                "Priority",
                issue.priority.as_deref(),
            ))
            .style(theme::priority_style(priority)),
            Cell::from(attachment),
        ])
        .style(theme::table_row())
    }

    fn footer(&self) -> Line<'static> {
        let paging = self.list.paging();
        let mut spans = vec![Span::styled(
            format!(
                " page {} of {} · {} issues",
                paging.page,
                self.list.page_count().max(1),
                self.list.total_count()
            ),
            theme::label(),
        )];
        if let Some(search) = &paging.search {
            spans.push(Span::styled(format!(" · search: {search}"), theme::value()));
        }
        if self.loading {
            spans.push(Span::styled(" · loading…", theme::key_hint()));
        }
        Line::from(spans)
    }
}

impl Component for IssuesScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.search.is_some() {
            return Ok(self.handle_search_key(key));
        }
        let paging = self.list.paging();
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Char('g') => {
                self.table_state.select(Some(0));
                None
            }
            KeyCode::Char('G') => {
                let last = self.list.issues().len().saturating_sub(1);
                self.table_state.select(Some(last));
                None
            }
            KeyCode::Char(']') | KeyCode::Right
                if u64::from(paging.page) < self.list.page_count() =>
            {
                Some(Self::go_list(&self.list.transition(paging.page + 1)))
            }
            KeyCode::Char('[') | KeyCode::Left if paging.page > 1 => {
                Some(Self::go_list(&self.list.transition(paging.page - 1)))
            }
            KeyCode::Char('s') => Some(Self::go_list(&self.list.sort_by(self.next_sort_column()))),
            KeyCode::Char('S') => {
                let predicate = paging.predicate.clone();
                Some(Self::go_list(&self.list.sort_by(&predicate)))
            }
            KeyCode::Char('/') => {
                self.search = Some(Input::new(paging.search.clone().unwrap_or_default()));
                None
            }
            KeyCode::Char('c') if paging.search.is_some() => Some(Self::go_list(&self.list.clear())),
            KeyCode::Enter => self.go_selected(StateName::IssueDetail),
            KeyCode::Char('n') => Some(Action::Go {
                state: StateName::IssueNew,
                params: self.list_params(),
            }),
            KeyCode::Char('e') => self.go_selected(StateName::IssueEdit),
            KeyCode::Char('d') => self.go_selected(StateName::IssueDelete),
            _ => None,
        };
        Ok(action)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " {} ({}) ",
            self.translations.translate("issueTrackerApp.issue.home.title", None),
            self.list.total_count()
        );
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [table_area, footer_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

        if self.list.is_loaded() && self.list.issues().is_empty() {
            frame.render_widget(
                Paragraph::new(
                    self.translations
                        .translate("issueTrackerApp.issue.home.notFound", None),
                )
                .style(theme::key_hint()),
                table_area,
            );
        } else {
            let rows: Vec<Row> = self.list.issues().iter().map(|i| self.row(i)).collect();
            let widths = [
                Constraint::Length(6),
                Constraint::Percentage(20),
                Constraint::Percentage(25),
                Constraint::Length(11),
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Min(10),
            ];
            let table = Table::new(rows, widths)
                .header(self.header())
                .row_highlight_style(theme::table_selected())
                .highlight_symbol("▸");
            let mut state = self.table_state.clone();
            frame.render_stateful_widget(table, table_area, &mut state);
        }

        match &self.search {
            Some(input) => {
                let label = self.translations.translate("issueTrackerApp.issue.home.search", None);
                let width = u16::try_from(label.chars().count() + 2).unwrap_or(u16::MAX);
                widgets::input_row(frame, footer_area, &format!("{label}: "), input, true, width);
            }
            None => frame.render_widget(Paragraph::new(self.footer()), footer_area),
        }
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        if self.search.is_some() {
            return &[("enter", "search"), ("esc", "cancel")];
        }
        &[
            ("enter", "view"),
            ("n", "new"),
            ("e", "edit"),
            ("d", "delete"),
            ("[ ]", "page"),
            ("s/S", "sort"),
            ("/", "search"),
            ("c", "clear"),
        ]
    }

    fn id(&self) -> &str {
        "issues"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    use issuetrack_core::IssueUpdates;

    use super::*;
    use crate::testing::{client_config, translations};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen(paging: PagingParams) -> IssuesScreen {
        let client = client_config().api_client(None).unwrap();
        let list = IssueListController::new(
            RestIssueResource::new(client.clone()),
            RestIssueSearch::new(client),
            paging,
            IssueUpdates::new().subscribe(),
        );
        IssuesScreen::new(list, translations())
    }

    fn go(action: Option<Action>) -> (StateName, StateParams) {
        match action {
            Some(Action::Go { state, params }) => (state, params),
            other => panic!("expected navigation, got {other:?}"),
        }
    }

    #[test]
    fn sort_cycles_columns_then_flips() {
        let mut screen = screen(PagingParams::default());
        let (state, params) = go(screen.handle_key_event(key(KeyCode::Char('s'))).unwrap());
        assert_eq!(state, StateName::Issue);
        assert_eq!(params.sort.as_deref(), Some("name,asc"));

        let (_, params) = go(screen.handle_key_event(key(KeyCode::Char('S'))).unwrap());
        assert_eq!(params.sort.as_deref(), Some("id,desc"));
    }

    #[test]
    fn search_bar_submits_scored_search() {
        let mut screen = screen(PagingParams::default());
        assert!(screen.handle_key_event(key(KeyCode::Char('/'))).unwrap().is_none());
        assert!(screen.is_searching());
        for c in "crash".chars() {
            screen.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
        let (_, params) = go(screen.handle_key_event(key(KeyCode::Enter)).unwrap());
        assert!(!screen.is_searching());
        assert_eq!(params.search.as_deref(), Some("crash"));
        assert_eq!(params.sort.as_deref(), Some("_score,desc"));
        assert_eq!(params.page, None);
    }

    #[test]
    fn clear_only_applies_to_a_search() {
        let mut plain = screen(PagingParams::default());
        assert!(plain.handle_key_event(key(KeyCode::Char('c'))).unwrap().is_none());

        let mut searching =
            screen(PagingParams::from_query(Some("3"), Some("_score,desc"), Some("crash")));
        let (_, params) = go(searching.handle_key_event(key(KeyCode::Char('c'))).unwrap());
        assert_eq!(params, StateParams::default());
    }

    #[test]
    fn paging_stays_in_range() {
        let mut screen = screen(PagingParams::default());
        // Nothing loaded: one page, so neither direction navigates.
        assert!(screen.handle_key_event(key(KeyCode::Char(']'))).unwrap().is_none());
        assert!(screen.handle_key_event(key(KeyCode::Char('['))).unwrap().is_none());

        let mut later = self::screen(PagingParams::from_query(Some("2"), None, None));
        let (_, params) = go(later.handle_key_event(key(KeyCode::Char('['))).unwrap());
        assert_eq!(params.page, None);
    }

    #[test]
    fn new_keeps_list_params() {
        let mut screen = screen(PagingParams::from_query(Some("2"), Some("name,desc"), None));
        let (state, params) = go(screen.handle_key_event(key(KeyCode::Char('n'))).unwrap());
        assert_eq!(state, StateName::IssueNew);
        assert_eq!(params.page.as_deref(), Some("2"));
        assert_eq!(params.sort.as_deref(), Some("name,desc"));
    }

    #[test]
    fn row_actions_need_a_selection() {
        let mut screen = screen(PagingParams::default());
        assert!(screen.selected().is_none());
        assert!(screen.handle_key_event(key(KeyCode::Enter)).unwrap().is_none());
        assert!(screen.handle_key_event(key(KeyCode::Char('d'))).unwrap().is_none());
    }
}
