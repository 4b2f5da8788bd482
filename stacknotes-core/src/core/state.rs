//! The immutable value every command reads and returns.

use crate::core::document::{Block, Document, TextblockRange};
use crate::core::mark::MarkSet;
use crate::core::selection::Selection;

/// A document together with the selection inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub doc: Document,
    pub selection: Selection,
    /// Marks the next inserted text will carry, set by toggling a mark on a
    /// collapsed caret. `None` means "inherit from the text at the caret".
    pub stored_marks: Option<MarkSet>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(Document::default())
    }
}

impl EditorState {
    /// Wraps `doc` with the caret at the start of its first textblock.
    pub fn new(doc: Document) -> Self {
        let selection = Selection::caret(0).snapped(&doc);
        Self { doc, selection, stored_marks: None }
    }

    /// The textblock containing the start of the selection.
    #[must_use]
    pub fn current_textblock(&self) -> Option<TextblockRange> {
        self.doc.textblock_at(self.selection.from())
    }

    /// The block node of [`current_textblock`](Self::current_textblock).
    #[must_use]
    pub fn current_block(&self) -> Option<&Block> {
        self.current_textblock().and_then(|range| self.doc.block_at(&range.path))
    }

    /// Textblocks overlapping the selection, in document order.
    #[must_use]
    pub fn selected_textblocks(&self) -> Vec<TextblockRange> {
        let (from, to) = (self.selection.from(), self.selection.to());
        self.doc
            .textblocks()
            .into_iter()
            .filter(|range| range.end() >= from && range.start <= to)
            .collect()
    }
}
