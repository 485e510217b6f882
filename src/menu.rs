//! Menu actions and keyboard shortcuts
//!
//! The closed set of action identifiers a host can trigger. Menus,
//! shortcuts and the command line all resolve to an [`Action`], which maps
//! to exactly one [`Message`].

use crate::message::{FileMessage, Message, SystemMessage, TabMessage, ViewMessage};
use std::fmt;
use std::str::FromStr;

/// Menu actions that can be triggered from the menu bar or keyboard shortcuts
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Action {
    // File actions
    Open,
    Save,
    ExportPdf,
    Quit,

    // Tab actions
    CloseTab,
    CloseAll,
    CloseOthers,
    NextTab,
    PreviousTab,

    // View actions
    FontIncrease,
    FontDecrease,
    FontReset,
    ImageIncrease,
    ImageDecrease,
    ImageReset,
    ToggleToc,
    TogglePagePreview,
}

impl Action {
    pub const ALL: [Action; 17] = [
        Action::Open,
        Action::CloseTab,
        Action::CloseAll,
        Action::CloseOthers,
        Action::NextTab,
        Action::PreviousTab,
        Action::Save,
        Action::ExportPdf,
        Action::FontIncrease,
        Action::FontDecrease,
        Action::FontReset,
        Action::ImageIncrease,
        Action::ImageDecrease,
        Action::ImageReset,
        Action::ToggleToc,
        Action::TogglePagePreview,
        Action::Quit,
    ];

    /// Stable identifier used by menus and the command line
    pub fn id(&self) -> &'static str {
        match self {
            Action::Open => "open",
            Action::CloseTab => "close-tab",
            Action::CloseAll => "close-all",
            Action::CloseOthers => "close-others",
            Action::NextTab => "next-tab",
            Action::PreviousTab => "previous-tab",
            Action::Save => "save",
            Action::ExportPdf => "export-pdf",
            Action::FontIncrease => "font-increase",
            Action::FontDecrease => "font-decrease",
            Action::FontReset => "font-reset",
            Action::ImageIncrease => "image-increase",
            Action::ImageDecrease => "image-decrease",
            Action::ImageReset => "image-reset",
            Action::ToggleToc => "toggle-toc",
            Action::TogglePagePreview => "toggle-page-preview",
            Action::Quit => "quit",
        }
    }

    /// Default keyboard shortcut
    pub fn shortcut(&self) -> &'static str {
        match self {
            Action::Open => "Ctrl+O",
            Action::CloseTab => "Ctrl+W",
            Action::CloseAll => "Ctrl+Shift+W",
            Action::CloseOthers => "",
            Action::NextTab => "Ctrl+Tab",
            Action::PreviousTab => "Ctrl+Shift+Tab",
            Action::Save => "Ctrl+S",
            Action::ExportPdf => "Ctrl+P",
            Action::FontIncrease => "Ctrl+=",
            Action::FontDecrease => "Ctrl+-",
            Action::FontReset => "Ctrl+0",
            Action::ImageIncrease => "Ctrl+Shift+=",
            Action::ImageDecrease => "Ctrl+Shift+-",
            Action::ImageReset => "Ctrl+Shift+0",
            Action::ToggleToc => "Ctrl+Shift+T",
            Action::TogglePagePreview => "Ctrl+Shift+P",
            Action::Quit => "Ctrl+Q",
        }
    }

    /// Convert action to application message
    pub fn to_message(self) -> Message {
        match self {
            // File
            Action::Open => Message::File(FileMessage::Open),
            Action::Save => Message::File(FileMessage::Save),
            Action::ExportPdf => Message::File(FileMessage::ExportPdf),
            Action::Quit => Message::System(SystemMessage::Quit),

            // Tabs
            Action::CloseTab => Message::Tab(TabMessage::CloseCurrent),
            Action::CloseAll => Message::Tab(TabMessage::CloseAll),
            Action::CloseOthers => Message::Tab(TabMessage::CloseOthers),
            Action::NextTab => Message::Tab(TabMessage::Next),
            Action::PreviousTab => Message::Tab(TabMessage::Previous),

            // View
            Action::FontIncrease => Message::View(ViewMessage::FontIncrease),
            Action::FontDecrease => Message::View(ViewMessage::FontDecrease),
            Action::FontReset => Message::View(ViewMessage::FontReset),
            Action::ImageIncrease => Message::View(ViewMessage::ImageIncrease),
            Action::ImageDecrease => Message::View(ViewMessage::ImageDecrease),
            Action::ImageReset => Message::View(ViewMessage::ImageReset),
            Action::ToggleToc => Message::View(ViewMessage::ToggleToc),
            Action::TogglePagePreview => Message::View(ViewMessage::TogglePagePreview),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Action::ALL
            .iter()
            .copied()
            .find(|action| action.id() == wanted)
            .ok_or_else(|| format!("unknown action '{}'", wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_parse_back() {
        for action in Action::ALL {
            assert_eq!(action.id().parse::<Action>(), Ok(action));
        }
        assert_eq!(" export-pdf\n".parse::<Action>(), Ok(Action::ExportPdf));
        assert!("print".parse::<Action>().is_err());
    }

    #[test]
    fn test_actions_map_to_messages() {
        assert!(matches!(
            Action::CloseTab.to_message(),
            Message::Tab(TabMessage::CloseCurrent)
        ));
        assert!(matches!(
            Action::ExportPdf.to_message(),
            Message::File(FileMessage::ExportPdf)
        ));
        assert!(matches!(
            Action::TogglePagePreview.to_message(),
            Message::View(ViewMessage::TogglePagePreview)
        ));
        assert!(matches!(
            Action::ImageDecrease.to_message(),
            Message::View(ViewMessage::ImageDecrease)
        ));
    }
}
