//! Trait shared by screens and overlays.

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::action::Action;

pub trait Component {
    /// Handle a key press. Returns an action for the app loop, if any.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>>;

    fn render(&self, frame: &mut Frame, area: Rect);

    /// Key hints shown in the status bar.
    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    fn id(&self) -> &str;
}
