//! Implementations behind [`Command`](crate::Command), grouped by the kind of
//! edit they make.

pub mod block;
pub mod delete;
pub mod insert;
pub mod marks;
pub mod wrap;

use crate::core::document::{Block, Document};
use crate::core::schema::{ContentRule, NodeRegistry};
use crate::core::selection::{Selection, SelectionBookmark};
use crate::core::state::EditorState;

/// Repairs `doc`, maps the selection through `bookmark` and returns the new
/// state, or `None` if neither the document nor the selection changed.
pub(crate) fn commit(
    state: &EditorState,
    mut doc: Document,
    bookmark: SelectionBookmark,
) -> Option<EditorState> {
    NodeRegistry::global().repair(&mut doc);
    let selection = bookmark.restore(&doc);
    finish(state, doc, selection)
}

/// Returns the new state unless it is identical to `state`.
pub(crate) fn finish(state: &EditorState, doc: Document, selection: Selection) -> Option<EditorState> {
    if doc == state.doc && selection == state.selection {
        return None;
    }
    let stored_marks = if doc == state.doc { state.stored_marks.clone() } else { None };
    Some(EditorState { doc, selection, stored_marks })
}

/// A run of sibling blocks `start..=end` under the node at `parent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockRange {
    pub parent: Vec<usize>,
    pub start: usize,
    pub end: usize,
}

impl BlockRange {
    pub fn path(&self, index: usize) -> Vec<usize> {
        let mut path = self.parent.clone();
        path.push(index);
        path
    }
}

/// Returns `true` if any block may be placed at `index` under `parent`.
pub(crate) fn is_free_slot(doc: &Document, parent: &[usize], index: usize) -> bool {
    if parent.is_empty() {
        return true;
    }
    match doc.block_at(parent).map(|b| b.spec().content) {
        Some(ContentRule::Blocks { .. }) => true,
        Some(ContentRule::LeadingParagraph) => index > 0,
        _ => false,
    }
}

/// The smallest run of sibling blocks covering `from..to` whose slots accept
/// any block. A caret in a list item's first paragraph resolves to the whole
/// list, since the paragraph and the item cannot be moved on their own.
pub(crate) fn block_range(doc: &Document, from: usize, to: usize) -> Option<BlockRange> {
    let a = doc.textblock_at(from)?.path;
    let b = doc.textblock_at(to).map_or_else(|| a.clone(), |r| r.path);
    let common = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let mut depth = common.min(a.len() - 1).min(b.len() - 1);
    loop {
        let parent = &a[..depth];
        if is_free_slot(doc, parent, a[depth]) {
            return Some(BlockRange { parent: parent.to_vec(), start: a[depth], end: b[depth] });
        }
        depth = depth.checked_sub(1)?;
    }
}

/// Path of the nearest ancestor of `path` (excluding `path` itself) matching `pred`.
pub(crate) fn nearest_ancestor(
    doc: &Document,
    path: &[usize],
    pred: impl Fn(&Block) -> bool,
) -> Option<Vec<usize>> {
    (1..path.len())
        .rev()
        .map(|len| &path[..len])
        .find(|p| doc.block_at(p).is_some_and(&pred))
        .map(<[usize]>::to_vec)
}

/// Position where the content of the textblock at `path` starts.
pub(crate) fn text_start(doc: &Document, path: &[usize]) -> Option<usize> {
    doc.node_start(path).map(|p| p + 1)
}
