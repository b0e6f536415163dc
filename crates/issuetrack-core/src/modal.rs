// ── Modal outcome ──
//
// A dialog is open until it is either closed with a result (confirm) or
// dismissed (cancel). Both are terminal.

/// How a modal ended, as seen by the router's exit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalExit {
    Confirm,
    Cancel,
}

/// Lifecycle of one modal instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModalState<T> {
    #[default]
    Open,
    Closed(T),
    Dismissed,
}

impl<T> ModalState<T> {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Close with a result. Ignored unless the modal is still open.
    pub fn close(&mut self, value: T) -> bool {
        if !self.is_open() {
            return false;
        }
        *self = Self::Closed(value);
        true
    }

    /// Dismiss without a result. Ignored unless the modal is still open.
    pub fn dismiss(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        *self = Self::Dismissed;
        true
    }

    pub fn exit(&self) -> Option<ModalExit> {
        match self {
            Self::Open => None,
            Self::Closed(_) => Some(ModalExit::Confirm),
            Self::Dismissed => Some(ModalExit::Cancel),
        }
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            Self::Closed(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_is_terminal() {
        let mut modal = ModalState::Open;
        assert!(modal.close(1));
        assert!(!modal.dismiss());
        assert_eq!(modal.result(), Some(&1));
        assert_eq!(modal.exit(), Some(ModalExit::Confirm));
    }

    #[test]
    fn dismiss_maps_to_cancel() {
        let mut modal: ModalState<bool> = ModalState::default();
        assert!(modal.is_open());
        assert!(modal.dismiss());
        assert_eq!(modal.exit(), Some(ModalExit::Cancel));
        assert!(!modal.close(true));
    }
}
