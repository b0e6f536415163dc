//! Modal states drawn over the current page.

pub mod delete;
pub mod dialog;

use issuetrack_core::ModalExit;

use crate::component::Component;

pub use delete::DeleteOverlay;
pub use dialog::DialogOverlay;

pub enum Overlay {
    Dialog(DialogOverlay),
    Delete(DeleteOverlay),
}

impl Overlay {
    pub fn component(&self) -> &dyn Component {
        match self {
            Self::Dialog(dialog) => dialog,
            Self::Delete(delete) => delete,
        }
    }

    pub fn component_mut(&mut self) -> &mut dyn Component {
        match self {
            Self::Dialog(dialog) => dialog,
            Self::Delete(delete) => delete,
        }
    }

    /// Dismiss without a result and report how the modal ended.
    pub fn dismiss(&mut self) -> Option<ModalExit> {
        match self {
            Self::Dialog(dialog) => {
                dialog.controller_mut().clear();
                dialog.controller().modal().exit()
            }
            Self::Delete(delete) => {
                delete.controller_mut().clear();
                delete.controller().modal().exit()
            }
        }
    }

    pub fn set_error(&mut self, error: Option<String>) {
        match self {
            Self::Dialog(dialog) => dialog.set_error(error),
            Self::Delete(delete) => delete.set_error(error),
        }
    }
}
