//! Menu state machines driven by the editor.
//!
//! The controller only tracks logical state. Placing menus on screen and
//! binding DOM or window events is left to the view, which reports pointer
//! presses through [`PointerTarget`].

pub mod bubble;
pub mod slash;

use crate::core::editor::Key;
use crate::core::state::EditorState;
use bubble::BubbleMenu;
use slash::{SlashItem, SlashMenu, SlashOutcome};

/// Where a pointer press landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    SlashMenu,
    BubbleMenu,
    /// The editable document view.
    Document,
    /// Anywhere else on the page.
    Elsewhere,
}

/// Which menu the user interacted with last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveMenu {
    Slash,
    Bubble,
}

/// Holds the slash and bubble menus side by side.
///
/// The two are independent: both may be open at once, and
/// [`active`](Self::active) names whichever opened most recently.
#[derive(Debug, Clone, Default)]
pub struct MenuController {
    slash: SlashMenu,
    bubble: BubbleMenu,
    events: u64,
    slash_opened_at: u64,
    bubble_opened_at: u64,
}

impl MenuController {
    #[must_use]
    pub fn slash(&self) -> &SlashMenu {
        &self.slash
    }

    #[must_use]
    pub fn bubble(&self) -> &BubbleMenu {
        &self.bubble
    }

    fn tick(&mut self) -> u64 {
        self.events += 1;
        self.events
    }

    pub fn open_slash(&mut self, anchor: usize) {
        self.slash.open(anchor);
        self.slash_opened_at = self.tick();
    }

    pub fn close_slash(&mut self) {
        self.slash.close();
    }

    pub fn hide_bubble(&mut self) {
        self.bubble.hide();
    }

    /// Re-derives menu state after the document or selection changed.
    ///
    /// An idle slash menu opens when the character right before a collapsed
    /// caret is `/`; the bubble follows the selection.
    pub fn after_change(&mut self, state: &EditorState) {
        let selection = state.selection;
        if !self.slash.is_open()
            && selection.is_collapsed()
            && state.doc.text_before(selection.head, 1) == "/"
        {
            self.open_slash(selection.head);
        }
        if self.bubble.sync(&selection) {
            self.bubble_opened_at = self.tick();
        }
    }

    /// Closes whatever menu the press landed outside of. Presses inside the
    /// document keep the bubble, which then follows the selection.
    pub fn pointer_down(&mut self, target: PointerTarget) {
        if target != PointerTarget::SlashMenu && self.slash.is_open() {
            log::debug!("slash menu closed by pointer press on {target:?}");
            self.slash.close();
        }
        if !matches!(target, PointerTarget::BubbleMenu | PointerTarget::Document) {
            self.bubble.hide();
        }
    }

    pub fn slash_key(&mut self, key: &Key) -> SlashOutcome {
        self.slash.handle_key(key)
    }

    pub fn hover_slash(&mut self, index: usize) {
        self.slash.hover(index);
    }

    /// Closes the slash menu, returning the visible item at `index` and the filter.
    pub fn take_slash_item(&mut self, index: usize) -> Option<(&'static SlashItem, String)> {
        self.slash.take(index)
    }

    /// The open menu opened by the most recent event.
    #[must_use]
    pub fn active(&self) -> Option<ActiveMenu> {
        match (self.slash.is_open(), self.bubble.is_visible()) {
            (true, true) if self.bubble_opened_at > self.slash_opened_at => Some(ActiveMenu::Bubble),
            (true, _) => Some(ActiveMenu::Slash),
            (false, true) => Some(ActiveMenu::Bubble),
            (false, false) => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
