//! Text selections and their mapping across structural edits.

use crate::core::document::Document;
use serde::{Deserialize, Serialize};

/// A selection between two document positions.
///
/// `anchor` is where the selection started, `head` where it currently ends;
/// `head` may lie before `anchor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    /// A collapsed selection at `pos`.
    #[must_use]
    pub fn caret(pos: usize) -> Self {
        Self { anchor: pos, head: pos }
    }

    #[must_use]
    pub fn range(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    #[must_use]
    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    #[must_use]
    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Snaps both endpoints into textblocks of `doc`.
    ///
    /// When `doc` has no textblock at all, endpoints are clamped to the
    /// document's bounds instead.
    #[must_use]
    pub fn snapped(self, doc: &Document) -> Self {
        let snap = |pos: usize| {
            doc.nearest_text_pos(pos).unwrap_or_else(|| pos.min(doc.content_size()))
        };
        Self { anchor: snap(self.anchor), head: snap(self.head) }
    }

    /// Records where the selection sits relative to textblocks so it can be
    /// restored after the tree around it changes shape.
    #[must_use]
    pub fn bookmark(&self, doc: &Document) -> SelectionBookmark {
        SelectionBookmark {
            anchor: TextCursor::at(doc, self.anchor),
            head: TextCursor::at(doc, self.head),
            fallback: *self,
        }
    }
}

/// A position expressed as "character `offset` of the `ordinal`-th textblock".
///
/// Wrapping, lifting and retyping blocks never reorders textblocks, so a
/// cursor taken before such an edit still names the same text afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCursor {
    pub ordinal: usize,
    pub offset: usize,
}

impl TextCursor {
    /// Cursor for `pos`, or `None` if `pos` is not inside a textblock.
    #[must_use]
    pub fn at(doc: &Document, pos: usize) -> Option<Self> {
        doc.textblocks()
            .iter()
            .enumerate()
            .find(|(_, range)| range.contains(pos))
            .map(|(ordinal, range)| Self { ordinal, offset: pos - range.start })
    }

    /// The position this cursor names in `doc`, clamped to the textblock's length.
    #[must_use]
    pub fn pos(&self, doc: &Document) -> Option<usize> {
        doc.textblocks()
            .get(self.ordinal)
            .map(|range| range.start + self.offset.min(range.len))
    }
}

/// A selection captured as text cursors, see [`Selection::bookmark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionBookmark {
    anchor: Option<TextCursor>,
    head: Option<TextCursor>,
    fallback: Selection,
}

impl SelectionBookmark {
    /// Restores the selection in `doc`, snapping anything that no longer resolves.
    #[must_use]
    pub fn restore(&self, doc: &Document) -> Selection {
        let anchor = self.anchor.and_then(|c| c.pos(doc)).unwrap_or(self.fallback.anchor);
        let head = self.head.and_then(|c| c.pos(doc)).unwrap_or(self.fallback.head);
        Selection { anchor, head }.snapped(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Block;
    use crate::core::schema::BlockType;

    #[test]
    fn test_from_to_with_backward_selection() {
        let sel = Selection::range(9, 3);
        assert_eq!(sel.from(), 3);
        assert_eq!(sel.to(), 9);
        assert!(!sel.is_collapsed());
        assert!(Selection::caret(4).is_collapsed());
    }

    #[test]
    fn test_snapped_moves_into_text() {
        let doc = Document::new(vec![Block::paragraph("ab"), Block::new(BlockType::HorizontalRule)]);
        assert_eq!(Selection::caret(0).snapped(&doc), Selection::caret(1));
        assert_eq!(Selection::caret(99).snapped(&doc), Selection::caret(3));
    }

    #[test]
    fn test_bookmark_survives_wrapping() {
        let before = Document::new(vec![Block::paragraph("hello")]);
        let bookmark = Selection::range(2, 4).bookmark(&before);
        let after = Document::new(vec![Block::container(
            BlockType::Blockquote,
            vec![Block::paragraph("hello")],
        )]);
        assert_eq!(bookmark.restore(&after), Selection::range(3, 5));
    }
}
