//! The formatting bubble shown over a non-empty selection.

use crate::core::command::Command;
use crate::core::mark::MarkType;
use crate::core::selection::Selection;

/// Visibility of the bubble menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BubbleMenu {
    #[default]
    Hidden,
    /// Anchored to the selection endpoints.
    Visible { from: usize, to: usize },
}

impl BubbleMenu {
    #[must_use]
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Visible { .. })
    }

    /// Shows the menu over a non-collapsed `selection` and hides it otherwise.
    /// Returns `true` if the menu went from hidden to visible.
    pub fn sync(&mut self, selection: &Selection) -> bool {
        let was_hidden = !self.is_visible();
        *self = if selection.is_collapsed() {
            Self::Hidden
        } else {
            Self::Visible { from: selection.from(), to: selection.to() }
        };
        was_hidden && self.is_visible()
    }

    pub fn hide(&mut self) {
        *self = Self::Hidden;
    }
}

/// A button of the bubble menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BubbleAction {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Highlight,
    /// Links the selection to the URL the user entered.
    Link(String),
}

impl BubbleAction {
    #[must_use]
    pub fn mark_type(&self) -> MarkType {
        match self {
            Self::Bold => MarkType::Bold,
            Self::Italic => MarkType::Italic,
            Self::Underline => MarkType::Underline,
            Self::Strike => MarkType::Strike,
            Self::Code => MarkType::Code,
            Self::Highlight => MarkType::Highlight,
            Self::Link(_) => MarkType::Link,
        }
    }

    /// The command this button runs; `None` for a link with an empty URL.
    #[must_use]
    pub fn command(&self) -> Option<Command> {
        match self {
            Self::Link(url) if url.trim().is_empty() => None,
            Self::Link(url) => Some(Command::SetLink { href: url.trim().to_string() }),
            other => Some(Command::ToggleMark { mark_type: other.mark_type(), href: None }),
        }
    }
}
