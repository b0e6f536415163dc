//! Application core: event loop, action dispatch, and rendering.
//!
//! Navigation goes through the [`Router`]: `prepare` runs on the loop,
//! entity fetches run on a spawned task, and the result comes back as
//! [`Action::Resolved`] to be committed. A result from a navigation that
//! was superseded in the meantime is dropped by the commit. Saves, deletes,
//! loads and attachment encodes follow the same detach-then-complete shape.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use issuetrack_core::{
    Activation, AlertSink, BundledTranslations, ClientConfig, CoreError, IssueDeleteController,
    IssueDetailController, IssueDialogController, IssueListController, IssueUpdates, ModalExit,
    PreviousState, RestIssueResource, RestIssueSearch, RouteError, Router, SaveOutcome, StateName,
    StateParams, Translations, data_utils,
};
use issuetrack_core::controller::SaveResponse;

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::overlays::{DeleteOverlay, DialogOverlay, Overlay};
use crate::screens::{DetailScreen, IssuesScreen};
use crate::tui::Tui;
use crate::{theme, widgets};

const TICK_RATE: Duration = Duration::from_millis(250);
const RENDER_RATE: Duration = Duration::from_millis(33);
const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// The mounted page state.
enum Page {
    Issues(IssuesScreen),
    Detail(DetailScreen),
}

impl Page {
    fn component(&self) -> &dyn Component {
        match self {
            Self::Issues(screen) => screen,
            Self::Detail(screen) => screen,
        }
    }

    fn component_mut(&mut self) -> &mut dyn Component {
        match self {
            Self::Issues(screen) => screen,
            Self::Detail(screen) => screen,
        }
    }

    fn set_translations(&mut self, translations: Translations) {
        match self {
            Self::Issues(screen) => screen.set_translations(translations),
            Self::Detail(screen) => screen.set_translations(translations),
        }
    }

    /// Release the page's update subscription.
    fn teardown(&mut self) {
        match self {
            Self::Issues(screen) => screen.controller_mut().teardown(),
            Self::Detail(screen) => screen.controller_mut().teardown(),
        }
    }
}

/// Forwards server success alerts into the action loop.
struct ChannelAlerts {
    tx: mpsc::UnboundedSender<Action>,
}

impl AlertSink for ChannelAlerts {
    fn success(&self, key: &str, param: Option<&str>) {
        let _ = self.tx.send(Action::Alert {
            key: key.to_owned(),
            param: param.map(str::to_owned),
        });
    }
}

pub struct App {
    router: Router<RestIssueResource>,
    resource: RestIssueResource,
    search: RestIssueSearch,
    updates: IssueUpdates,
    server: String,
    page: Option<Page>,
    overlay: Option<Overlay>,
    /// Dismissed dialogs whose save is still in flight, by save ticket. Each
    /// is kept until its response arrives so a late success is published.
    retired_dialogs: HashMap<u64, DialogOverlay>,
    /// Target of the navigation currently resolving.
    navigating: Option<StateName>,
    notification: Option<(Notification, Instant)>,
    show_help: bool,
    running: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let sink: Arc<dyn AlertSink> = Arc::new(ChannelAlerts {
            tx: action_tx.clone(),
        });
        let client = config.api_client(Some(sink))?;
        let resource = RestIssueResource::new(client.clone());
        let router = Router::new(
            resource.clone(),
            Arc::new(BundledTranslations),
            config.authorities.clone(),
            &config.language,
        );

        Ok(Self {
            router,
            resource,
            search: RestIssueSearch::new(client),
            updates: IssueUpdates::new(),
            server: config.url.to_string(),
            page: None,
            overlay: None,
            retired_dialogs: HashMap::new(),
            navigating: None,
            notification: None,
            show_help: false,
            running: true,
            action_tx,
            action_rx,
        })
    }

    /// Main loop. Returns when the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let mut events = EventReader::new(TICK_RATE, RENDER_RATE);
        self.navigate(StateName::Issue, StateParams::default(), false);

        info!(server = %self.server, "issue browser started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            let action = match event {
                Event::Key(key) => self.handle_key(key)?,
                Event::Resize(w, h) => Some(Action::Resize(w, h)),
                Event::Tick => Some(Action::Tick),
                Event::Render => Some(Action::Render),
            };
            if let Some(action) = action {
                self.action_tx.send(action)?;
            }

            while let Ok(action) = self.action_rx.try_recv() {
                match action {
                    Action::Render | Action::Resize(..) => {
                        tui.draw(|frame| self.render(frame))?;
                    }
                    action => {
                        if let Some(next) = self.process_action(action) {
                            self.action_tx.send(next)?;
                        }
                    }
                }
            }
        }

        events.stop();
        tui.exit();
        Ok(())
    }

    // ── Input ────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }
        if self.show_help {
            return Ok(Some(Action::ToggleHelp));
        }
        if let Some(overlay) = &mut self.overlay {
            return overlay.component_mut().handle_key_event(key);
        }

        let typing = matches!(&self.page, Some(Page::Issues(screen)) if screen.is_searching());
        if !typing {
            match key.code {
                KeyCode::Char('q') => return Ok(Some(Action::Quit)),
                KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
                _ => {}
            }
        }

        match &mut self.page {
            Some(page) => {
                let component = page.component_mut();
                debug!(component = component.id(), ?key, "key");
                component.handle_key_event(key)
            }
            None => Ok(None),
        }
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Apply one action. May return a follow-up action.
    fn process_action(&mut self, action: Action) -> Option<Action> {
        match action {
            Action::Quit => self.running = false,
            Action::Tick => self.on_tick(),
            Action::Render | Action::Resize(..) => {}
            Action::ToggleHelp => self.show_help = !self.show_help,

            Action::Go { state, params } => self.navigate(state, params, false),
            Action::Follow(transition) => {
                let params = self.router.params().cloned().unwrap_or_default();
                self.navigate(transition.to, params, transition.reload);
            }
            Action::Resolved(Ok(activation)) => self.enter(&activation),
            Action::Resolved(Err(err)) => {
                self.navigating = None;
                warn!(error = %err, "navigation failed");
                self.notify(Notification::error(self.describe_route(&err)));
            }

            Action::ListLoaded(response) => {
                if let Some(Page::Issues(screen)) = &mut self.page {
                    if let Err(err) = screen.complete_load(response) {
                        let message = self.describe(&err);
                        self.notify(Notification::error(message));
                    }
                }
            }

            Action::SubmitDialog => self.submit_dialog(),
            Action::Saved(response) => return self.complete_save(response),
            Action::Attach(path) => self.attach(&path),
            Action::AttachmentEncoded(response) => {
                if let Some(Overlay::Dialog(dialog)) = &mut self.overlay {
                    let error = match dialog.controller_mut().complete_attachment(response) {
                        Ok(_) => None,
                        Err(err) => Some(err.to_string()),
                    };
                    dialog.set_error(error);
                }
            }
            Action::CancelModal => return self.dismiss_overlay(),

            Action::ConfirmDelete => {
                if let Some(Overlay::Delete(delete)) = &mut self.overlay {
                    if let Some(request) = delete.request() {
                        let tx = self.action_tx.clone();
                        tokio::spawn(async move {
                            let _ = tx.send(Action::Deleted(request.dispatch().await));
                        });
                    }
                }
            }
            Action::Deleted(response) => {
                if let Some(Overlay::Delete(delete)) = &mut self.overlay {
                    match delete.complete(response) {
                        Ok(true) => return self.modal_exit(ModalExit::Confirm),
                        Ok(false) => {}
                        Err(err) => {
                            let message = self.describe(&err);
                            self.overlay_error(message);
                        }
                    }
                }
            }

            Action::OpenAttachment => self.open_attachment(),
            Action::AttachmentOpened(Ok(path)) => {
                self.notify(Notification::success(format!("wrote {}", path.display())));
            }
            Action::AttachmentOpened(Err(err)) => {
                self.notify(Notification::error(err.to_string()));
            }

            Action::Alert { key, param } => {
                let message = self.router.translations().translate(&key, param.as_deref());
                self.notify(Notification::success(message));
            }
            Action::Notify(notification) => self.notify(notification),
        }
        None
    }

    fn on_tick(&mut self) {
        if self
            .notification
            .as_ref()
            .is_some_and(|(_, shown)| shown.elapsed() >= NOTIFICATION_TTL)
        {
            self.notification = None;
        }

        match &mut self.page {
            Some(Page::Issues(screen)) => {
                if screen.controller_mut().poll_updates() {
                    debug!("issue saved elsewhere, reloading list");
                    self.load_list();
                }
            }
            Some(Page::Detail(screen)) => {
                screen.controller_mut().poll_updates();
            }
            None => {}
        }
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some((notification, Instant::now()));
    }

    /// User-facing text for an error. Server failure keys are translated.
    fn describe(&self, err: &CoreError) -> String {
        match err {
            CoreError::Api {
                key: Some(key),
                params,
                ..
            } => self.router.translations().translate(key, params.as_deref()),
            other => other.to_string(),
        }
    }

    fn describe_route(&self, err: &RouteError) -> String {
        match err {
            RouteError::Resolve { source, .. } => self.describe(source),
            other => other.to_string(),
        }
    }

    fn overlay_error(&mut self, message: String) {
        if let Some(overlay) = &mut self.overlay {
            overlay.set_error(Some(message));
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    fn navigate(&mut self, state: StateName, params: StateParams, reload: bool) {
        match self.router.prepare(state, params, reload) {
            Ok(pending) => {
                self.navigating = Some(pending.state());
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(Action::Resolved(pending.resolve().await));
                });
            }
            Err(err) => {
                warn!(error = %err, %state, "navigation refused");
                self.notify(Notification::error(self.describe_route(&err)));
            }
        }
    }

    /// Commit a resolved navigation and mount what it entered.
    fn enter(&mut self, activation: &Activation) {
        if !self.router.commit(activation) {
            return;
        }
        self.navigating = None;
        let translations = self.router.translations().clone();

        for entered in &activation.entered {
            match entered.state {
                StateName::Issue => {
                    let paging = entered.resolved.paging.clone().unwrap_or_default();
                    if let Some(Page::Issues(screen)) = &mut self.page {
                        screen.controller_mut().set_paging(paging);
                    } else {
                        self.teardown_page();
                        let list = IssueListController::new(
                            self.resource.clone(),
                            self.search.clone(),
                            paging,
                            self.updates.subscribe(),
                        );
                        self.page = Some(Page::Issues(IssuesScreen::new(list, translations.clone())));
                    }
                    self.load_list();
                }
                StateName::IssueDetail => {
                    let Some(issue) = entered.resolved.entity.clone() else {
                        continue;
                    };
                    let previous = entered
                        .resolved
                        .previous_state
                        .clone()
                        .unwrap_or_else(PreviousState::list);
                    self.teardown_page();
                    let detail = IssueDetailController::new(issue, previous, self.updates.subscribe());
                    self.page = Some(Page::Detail(DetailScreen::new(detail, translations.clone())));
                }
                _ => {}
            }
        }
        if let Some(page) = &mut self.page {
            page.set_translations(translations.clone());
        }

        if let Some(overlay) = self.overlay.take() {
            self.retire(overlay);
        }
        if self.router.table().get(activation.state).view.is_modal() {
            if let Some(issue) = activation.entity().cloned() {
                self.overlay = Some(if activation.state == StateName::IssueDelete {
                    let delete = IssueDeleteController::new(self.resource.clone(), issue);
                    Overlay::Delete(DeleteOverlay::new(delete, translations))
                } else {
                    let dialog = IssueDialogController::new(
                        self.resource.clone(),
                        self.updates.clone(),
                        issue,
                    );
                    Overlay::Dialog(DialogOverlay::new(dialog, translations))
                });
            }
        }
    }

    fn teardown_page(&mut self) {
        if let Some(mut page) = self.page.take() {
            page.teardown();
        }
    }

    fn load_list(&mut self) {
        if let Some(Page::Issues(screen)) = &mut self.page {
            let request = screen.load_request();
            let tx = self.action_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(Action::ListLoaded(request.dispatch().await));
            });
        }
    }

    /// Navigation implied by the open modal ending with `exit`.
    fn modal_exit(&self, exit: ModalExit) -> Option<Action> {
        let state = self.router.current()?;
        self.router
            .exit_transition(state, exit)
            .map(Action::Follow)
    }

    fn dismiss_overlay(&mut self) -> Option<Action> {
        let overlay = self.overlay.take()?;
        let exit = self.retire(overlay)?;
        self.modal_exit(exit)
    }

    /// Dismiss `overlay`. A dialog with a save in flight is kept until the
    /// response arrives.
    fn retire(&mut self, mut overlay: Overlay) -> Option<ModalExit> {
        let pending = match &overlay {
            Overlay::Dialog(dialog) => dialog.controller().pending_save(),
            Overlay::Delete(_) => None,
        };
        let exit = overlay.dismiss();
        if let (Overlay::Dialog(dialog), Some(ticket)) = (overlay, pending) {
            self.retired_dialogs.insert(ticket, dialog);
        }
        exit
    }

    // ── Dialog ───────────────────────────────────────────────────────

    fn submit_dialog(&mut self) {
        let Some(Overlay::Dialog(dialog)) = &mut self.overlay else {
            return;
        };
        match dialog.submit() {
            Ok(request) => {
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(Action::Saved(request.dispatch().await));
                });
            }
            Err(err) => {
                let message = self.describe(&err);
                self.overlay_error(message);
            }
        }
    }

    /// Hand a save response to the dialog that issued it.
    fn complete_save(&mut self, response: SaveResponse) -> Option<Action> {
        let ticket = response.ticket();
        let outcome = match &mut self.overlay {
            Some(Overlay::Dialog(open)) if open.controller().pending_save() == Some(ticket) => {
                open.controller_mut().complete_save(response)
            }
            _ => {
                let Some(mut retired) = self.retired_dialogs.remove(&ticket) else {
                    debug!(ticket, "no dialog waiting on this save");
                    return None;
                };
                // Dismissed already; at most publishes the saved issue.
                retired.controller_mut().complete_save(response);
                return None;
            }
        };
        match outcome {
            SaveOutcome::Saved(issue) => {
                debug!(id = ?issue.id, "issue saved");
                self.modal_exit(ModalExit::Confirm)
            }
            SaveOutcome::Failed(err) => {
                let message = self.describe(&err);
                self.overlay_error(message);
                None
            }
            SaveOutcome::Stale => None,
        }
    }

    fn attach(&mut self, path: &Path) {
        if let Some(Overlay::Dialog(dialog)) = &mut self.overlay {
            let request = dialog.controller_mut().begin_attachment(path);
            let tx = self.action_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(Action::AttachmentEncoded(request.encode().await));
            });
        }
    }

    // ── Detail ───────────────────────────────────────────────────────

    fn open_attachment(&self) {
        let Some(Page::Detail(screen)) = &self.page else {
            return;
        };
        let issue = screen.controller().issue();
        let (Some(data), Some(content_type)) =
            (issue.attachment.clone(), issue.attachment_content_type.clone())
        else {
            return;
        };
        let dir = std::env::temp_dir();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = data_utils::open_file(&content_type, &data, &dir).await;
            let _ = tx.send(Action::AttachmentOpened(result));
        });
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_header(frame, header);

        match &self.page {
            Some(page) => page.component().render(frame, body),
            None => {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_default());
                frame.render_widget(
                    Paragraph::new("Loading…").style(theme::key_hint()).block(block),
                    body,
                );
            }
        }
        if let Some(overlay) = &self.overlay {
            overlay.component().render(frame, body);
        }

        self.render_status_bar(frame, status);

        if let Some((notification, _)) = &self.notification {
            render_notification(frame, area, notification);
        }
        if self.show_help {
            render_help(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let t = self.router.translations();
        let mut spans = vec![Span::styled(
            format!(" {} ", t.translate("global.title", None)),
            theme::title_style(),
        )];
        if let Some(title) = self.page_title() {
            spans.push(Span::styled(format!("· {title} "), theme::value()));
        }
        spans.push(Span::styled(format!("· {}", self.server), theme::key_hint()));
        if let Some(target) = self.navigating {
            spans.push(Span::styled(
                format!("  ◐ {target}"),
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Title of the innermost current state that declares one.
    fn page_title(&self) -> Option<String> {
        let current = self.router.current()?;
        let key = self
            .router
            .table()
            .chain(current)
            .iter()
            .rev()
            .find_map(|def| def.page_title)?;
        Some(self.router.translations().translate(key, None))
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let component = self
            .overlay
            .as_ref()
            .map(Overlay::component)
            .or_else(|| self.page.as_ref().map(Page::component));
        let mut hints: Vec<(&str, &str)> = component
            .map(|c| c.hints().to_vec())
            .unwrap_or_default();
        if self.overlay.is_none() {
            hints.extend([("?", "help"), ("q", "quit")]);
        }
        frame.render_widget(Paragraph::new(widgets::key_hints(&hints)), area);
    }
}

fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let width = u16::try_from(notification.message.chars().count() + 6)
        .unwrap_or(u16::MAX)
        .clamp(20, 60)
        .min(area.width);
    let height = 3u16;
    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 1);
    let toast = Rect::new(area.x + x, area.y + y, width, height);

    let (color, icon) = match notification.level {
        NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
        NotificationLevel::Error => (theme::ERROR_RED, "✗"),
        NotificationLevel::Info => (theme::NEON_CYAN, "·"),
    };

    frame.render_widget(ratatui::widgets::Clear, toast);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(toast);
    frame.render_widget(block, toast);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(color)),
        Span::styled(notification.message.clone(), Style::default().fg(theme::DIM_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

fn render_help(frame: &mut Frame, area: Rect) {
    const SECTIONS: &[(&str, &[(&str, &str)])] = &[
        (
            "List",
            &[
                ("j/k", "move selection"),
                ("enter", "view issue"),
                ("n", "new issue"),
                ("e / d", "edit / delete issue"),
                ("[ / ]", "previous / next page"),
                ("s / S", "next sort column / flip direction"),
                ("/ / c", "search / clear search"),
            ],
        ),
        (
            "Issue",
            &[
                ("e", "edit"),
                ("o", "write attachment to temp dir"),
                ("esc", "back"),
            ],
        ),
        (
            "Form",
            &[
                ("tab", "next field"),
                ("space", "calendar on created"),
                ("ctrl+s", "save"),
                ("esc", "cancel"),
            ],
        ),
    ];

    let popup = widgets::centered_rect(60, 24, area);
    let inner = widgets::popup(frame, popup, "Keyboard Shortcuts");

    let mut lines = Vec::new();
    for (title, keys) in SECTIONS {
        lines.push(Line::from(Span::styled(format!("  {title}"), theme::title_style())));
        for (key, action) in *keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled((*action).to_owned(), theme::label()),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled("  any key closes", theme::key_hint())));
    frame.render_widget(Paragraph::new(lines), inner);
}
