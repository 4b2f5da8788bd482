//! Range deletion.

use super::finish;
use crate::core::document::{Block, Document};
use crate::core::schema::NodeRegistry;
use crate::core::selection::Selection;
use crate::core::state::EditorState;
use crate::core::text::{delete_chars, normalize_runs, slice_runs};

/// Deletes everything between `from` and `to`.
///
/// Within one textblock only characters go. Across textblocks the covered
/// nodes are removed and what remains of the end textblock is joined onto
/// the start textblock. The caret ends up at `from`.
pub fn delete_range(state: &EditorState, from: usize, to: usize) -> Option<EditorState> {
    if from >= to || to > state.doc.content_size() {
        return None;
    }
    let mut doc = state.doc.clone();
    let start = doc.textblock_at(from);
    let end = doc.textblock_at(to);

    match (start, end) {
        (Some(a), Some(b)) if a.path == b.path => {
            let block = doc.block_at_mut(&a.path)?;
            delete_chars(&mut block.text, from - a.start, to - a.start);
        }
        (Some(a), Some(b)) => {
            let end_block = doc.block_at(&b.path)?;
            let tail = slice_runs(&end_block.text, to - b.start, b.len);
            let end_node = doc.node_start(&b.path)? + end_block.node_size();
            remove_span(&mut doc.blocks, 0, from, end_node);
            let joined = doc.block_at_mut(&a.path)?;
            joined.text.extend(tail);
            normalize_runs(&mut joined.text);
        }
        _ => remove_span(&mut doc.blocks, 0, from, to),
    }

    NodeRegistry::global().repair(&mut doc);
    let selection = Selection::caret(from).snapped(&doc);
    finish(state, doc, selection)
}

/// Removes every node lying wholly inside `from..to` and trims the text of
/// textblocks the range cuts through. Containers emptied this way go too.
/// `start` is the position where `children` begins.
fn remove_span(children: &mut Vec<Block>, start: usize, from: usize, to: usize) {
    let mut pos = start;
    children.retain_mut(|child| {
        let node_start = pos;
        let node_end = pos + child.node_size();
        pos = node_end;
        if node_start >= from && node_end <= to {
            return false;
        }
        if node_start < to && node_end > from {
            if child.is_textblock() {
                let content = node_start + 1;
                let cut_from = from.max(content) - content;
                let cut_to = to.min(content + child.text_len()) - content;
                delete_chars(&mut child.text, cut_from, cut_to);
            } else if !child.is_atom() && !child.children.is_empty() {
                remove_span(&mut child.children, node_start + 1, from, to);
                if child.children.is_empty() {
                    return false;
                }
            }
        }
        true
    });
}

/// Position of the end of the textblock before the one containing `pos`.
pub(crate) fn previous_text_end(doc: &Document, pos: usize) -> Option<usize> {
    doc.textblocks().into_iter().take_while(|r| r.end() < pos).last().map(|r| r.end())
}
