//! The slash-command menu: catalogue and state machine.

use crate::core::command::{Command, Content};
use crate::core::document::{Attrs, Block};
use crate::core::editor::Key;
use crate::core::schema::{BlockType, CalloutVariant, NodeRegistry};
use crate::core::text::TextRun;

/// Text of the paragraph the "Database" item inserts.
pub const DATABASE_PLACEHOLDER: &str = "📊 Database placeholder - coming soon!";

/// One entry of the slash menu.
#[derive(Debug, Clone, PartialEq)]
pub struct SlashItem {
    pub title: &'static str,
    pub description: &'static str,
    pub command: Command,
}

fn item(title: &'static str, description: &'static str, command: Command) -> SlashItem {
    SlashItem { title, description, command }
}

/// The slash catalogue in display order.
pub fn default_slash_items() -> Vec<SlashItem> {
    // Built while the registry itself is initialising, so no `Block::new` here.
    let database = Block {
        block_type: BlockType::Paragraph,
        attrs: Attrs::new(),
        children: Vec::new(),
        text: vec![TextRun::plain(DATABASE_PLACEHOLDER)],
    };
    vec![
        item("Text", "Just start writing with plain text.", Command::SetParagraph),
        item("Heading 1", "Big section heading.", Command::ToggleHeading { level: 1 }),
        item("Heading 2", "Medium section heading.", Command::ToggleHeading { level: 2 }),
        item("Heading 3", "Small section heading.", Command::ToggleHeading { level: 3 }),
        item("Bullet List", "Create a simple bulleted list.", Command::ToggleBulletList),
        item("Numbered List", "Create a list with numbering.", Command::ToggleOrderedList),
        item("To-do List", "Track tasks with a to-do list.", Command::ToggleTaskList),
        item("Quote", "Capture a quote.", Command::ToggleBlockquote),
        item("Divider", "Visually divide blocks.", Command::SetHorizontalRule),
        item("Code Block", "Capture a code snippet.", Command::ToggleCodeBlock),
        item(
            "Callout",
            "Highlight important text.",
            Command::SetCallout { variant: CalloutVariant::Info },
        ),
        item("Toggle List", "Collapsible block.", Command::SetToggleBlock),
        item("Embed", "Embed external content.", Command::SetEmbed { src: None }),
        item(
            "Database",
            "Insert a table database.",
            Command::InsertContent(Content::Blocks(vec![database])),
        ),
    ]
}

/// Registry items whose title contains `filter`, ignoring case.
pub fn filter_items(filter: &str) -> Vec<&'static SlashItem> {
    let needle = filter.to_lowercase();
    NodeRegistry::global()
        .slash_items()
        .iter()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .collect()
}

/// State of the slash menu.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlashMenu {
    #[default]
    Idle,
    Open {
        /// Characters typed since the `/`.
        filter: String,
        selected_index: usize,
        /// Caret position when the menu opened.
        anchor: usize,
    },
}

/// What the menu did with a key.
#[derive(Debug, Clone, PartialEq)]
pub enum SlashOutcome {
    /// The menu is idle; the key is not its concern.
    Ignored,
    /// The menu used the key and the document must not see it.
    Consumed,
    /// The menu updated itself; the document handles the key as usual.
    PassThrough,
    /// Enter chose `item`; the menu is idle again.
    Run { item: &'static SlashItem, filter: String },
}

impl SlashMenu {
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn open(&mut self, anchor: usize) {
        *self = Self::Open { filter: String::new(), selected_index: 0, anchor };
    }

    pub fn close(&mut self) {
        *self = Self::Idle;
    }

    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        match self {
            Self::Open { filter, .. } => Some(filter),
            Self::Idle => None,
        }
    }

    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        match self {
            Self::Open { selected_index, .. } => Some(*selected_index),
            Self::Idle => None,
        }
    }

    #[must_use]
    pub fn anchor(&self) -> Option<usize> {
        match self {
            Self::Open { anchor, .. } => Some(*anchor),
            Self::Idle => None,
        }
    }

    /// Items currently listed; empty while idle.
    #[must_use]
    pub fn visible_items(&self) -> Vec<&'static SlashItem> {
        self.filter().map(filter_items).unwrap_or_default()
    }

    /// Selects the item at `index` of the visible list.
    pub fn hover(&mut self, index: usize) {
        let count = self.visible_items().len();
        if let Self::Open { selected_index, .. } = self {
            if index < count {
                *selected_index = index;
            }
        }
    }

    /// Closes the menu and returns the visible item at `index` with the
    /// filter that was typed, or `None` if there is no such item.
    pub fn take(&mut self, index: usize) -> Option<(&'static SlashItem, String)> {
        let item = *self.visible_items().get(index)?;
        let Self::Open { filter, .. } = std::mem::take(self) else {
            return None;
        };
        Some((item, filter))
    }

    /// Feeds a key to the menu.
    pub fn handle_key(&mut self, key: &Key) -> SlashOutcome {
        let count = self.visible_items().len();
        let Self::Open { filter, selected_index, .. } = &mut *self else {
            return SlashOutcome::Ignored;
        };
        match key {
            Key::ArrowDown => {
                if count > 0 {
                    *selected_index = (*selected_index + 1) % count;
                }
                SlashOutcome::Consumed
            }
            Key::ArrowUp => {
                if count > 0 {
                    *selected_index = (*selected_index + count - 1) % count;
                }
                SlashOutcome::Consumed
            }
            Key::Enter => {
                let index = *selected_index;
                match self.take(index) {
                    Some((item, filter)) => SlashOutcome::Run { item, filter },
                    None => SlashOutcome::Consumed,
                }
            }
            Key::Escape => {
                self.close();
                SlashOutcome::Consumed
            }
            Key::Backspace => {
                if filter.pop().is_none() {
                    self.close();
                } else {
                    *selected_index = 0;
                }
                SlashOutcome::PassThrough
            }
            Key::Char(c) => {
                filter.push(*c);
                *selected_index = 0;
                SlashOutcome::PassThrough
            }
            Key::ArrowLeft | Key::ArrowRight => SlashOutcome::PassThrough,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_with(filter: &str) -> SlashMenu {
        let mut menu = SlashMenu::default();
        menu.open(1);
        for c in filter.chars() {
            menu.handle_key(&Key::Char(c));
        }
        menu
    }

    fn titles(items: &[&SlashItem]) -> Vec<&'static str> {
        items.iter().map(|i| i.title).collect()
    }

    #[test]
    fn test_catalogue_order() {
        let items = default_slash_items();
        assert_eq!(items.len(), 14);
        assert_eq!(items[0].title, "Text");
        assert_eq!(items[13].title, "Database");
        assert_eq!(items[8].command, Command::SetHorizontalRule);
    }

    #[test]
    fn test_filter_head_lists_headings() {
        let menu = open_with("head");
        assert_eq!(titles(&menu.visible_items()), vec!["Heading 1", "Heading 2", "Heading 3"]);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        assert_eq!(titles(&filter_items("LIST")), vec!["Bullet List", "Numbered List", "To-do List", "Toggle List"]);
    }

    #[test]
    fn test_arrow_navigation_wraps() {
        let mut menu = open_with("head");
        for _ in 0..3 {
            assert_eq!(menu.handle_key(&Key::ArrowDown), SlashOutcome::Consumed);
        }
        assert_eq!(menu.selected_index(), Some(0));
        menu.handle_key(&Key::ArrowUp);
        assert_eq!(menu.selected_index(), Some(2));
    }

    #[test]
    fn test_arrows_with_empty_list_do_nothing() {
        let mut menu = open_with("zzz");
        menu.handle_key(&Key::ArrowDown);
        assert_eq!(menu.selected_index(), Some(0));
    }

    #[test]
    fn test_enter_runs_selected_item_and_closes() {
        let mut menu = open_with("head");
        menu.handle_key(&Key::ArrowDown);
        match menu.handle_key(&Key::Enter) {
            SlashOutcome::Run { item, filter } => {
                assert_eq!(item.command, Command::ToggleHeading { level: 2 });
                assert_eq!(filter, "head");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(menu, SlashMenu::Idle);
        assert_eq!(menu.handle_key(&Key::Enter), SlashOutcome::Ignored);
    }

    #[test]
    fn test_enter_with_empty_list_stays_open() {
        let mut menu = open_with("zzz");
        assert_eq!(menu.handle_key(&Key::Enter), SlashOutcome::Consumed);
        assert!(menu.is_open());
    }

    #[test]
    fn test_backspace_pops_filter_then_closes() {
        let mut menu = open_with("h");
        assert_eq!(menu.handle_key(&Key::Backspace), SlashOutcome::PassThrough);
        assert_eq!(menu.filter(), Some(""));
        menu.handle_key(&Key::Backspace);
        assert!(!menu.is_open());
    }

    #[test]
    fn test_escape_closes() {
        let mut menu = open_with("co");
        assert_eq!(menu.handle_key(&Key::Escape), SlashOutcome::Consumed);
        assert_eq!(menu, SlashMenu::Idle);
    }

    #[test]
    fn test_hover_selects_visible_item_only() {
        let mut menu = open_with("head");
        menu.hover(2);
        assert_eq!(menu.selected_index(), Some(2));
        menu.hover(7);
        assert_eq!(menu.selected_index(), Some(2));
    }
}
