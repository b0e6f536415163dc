//! Small rendering helpers shared by screens and overlays.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use tui_input::Input;

use issuetrack_core::Translations;

use crate::theme;

/// A `width` x `height` rect centered in `area`, shrunk to fit.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

/// Clear `area` and draw a rounded popup block over it. Returns the inner area.
pub fn popup(frame: &mut Frame, area: Rect, title: &str) -> Rect {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {title} "))
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

/// `key action` pairs for the status bar.
pub fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, action) in hints {
        spans.push(Span::styled(format!(" {key}"), theme::key_hint_key()));
        spans.push(Span::styled(format!(" {action} "), theme::key_hint()));
    }
    Line::from(spans)
}

/// One labelled text input on a single row. Places the terminal cursor
/// when `focused`.
pub fn input_row(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    input: &Input,
    focused: bool,
    label_width: u16,
) {
    let value_width = area.width.saturating_sub(label_width + 1);
    let scroll = input.visual_scroll(usize::from(value_width.max(1)));
    let marker = if focused { "▸" } else { " " };
    let value_style = if focused {
        theme::table_selected()
    } else {
        theme::value()
    };
    let line = Line::from(vec![
        Span::styled(
            format!("{marker}{label:<width$}", width = usize::from(label_width)),
            theme::label(),
        ),
        Span::styled(
            input.value().chars().skip(scroll).collect::<String>(),
            value_style,
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    if focused {
        let offset = input.visual_cursor().saturating_sub(scroll);
        let x = area.x + 1 + label_width + u16::try_from(offset).unwrap_or(u16::MAX);
        frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
    }
}

/// Translated value of an enum field (`issueTrackerApp.State.OPEN`).
pub fn enum_label(translations: &Translations, kind: &str, value: Option<&str>) -> String {
    match value {
        Some(value) if !value.is_empty() => {
            translations.translate(&format!("issueTrackerApp.{kind}.{value}"), None)
        }
        _ => String::new(),
    }
}
