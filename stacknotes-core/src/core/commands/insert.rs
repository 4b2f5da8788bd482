//! Inserting blocks and text, and splitting textblocks.

use super::delete::delete_range;
use super::wrap::lift_items;
use super::{block_range, finish, text_start};
use crate::core::document::{Block, Document, TextblockRange};
use crate::core::mark::MarkSet;
use crate::core::schema::{BlockType, CalloutVariant, NodeRegistry};
use crate::core::selection::Selection;
use crate::core::state::EditorState;
use crate::core::text::{insert_text as insert_runs, marks_at, split_runs};
use serde_json::Value;

/// Deletes a non-collapsed selection, leaving a caret at its start.
fn collapse(state: &EditorState) -> EditorState {
    if state.selection.is_collapsed() {
        return state.clone();
    }
    delete_range(state, state.selection.from(), state.selection.to()).unwrap_or_else(|| state.clone())
}

/// Splits the textblock at `path` at character `offset` and returns the path
/// of the new block holding the tail. A heading split at its end continues
/// as a paragraph.
pub(crate) fn split_textblock(doc: &mut Document, path: &[usize], offset: usize) -> Option<Vec<usize>> {
    let (&index, parent) = path.split_last()?;
    let siblings = doc.children_mut(parent)?;
    let block = siblings.get_mut(index)?;
    let (head, tail) = split_runs(&block.text, offset);
    block.text = head;
    let next = if block.block_type == BlockType::Heading && tail.is_empty() {
        Block::empty_paragraph()
    } else {
        Block { text: tail, ..block.clone() }
    };
    siblings.insert(index + 1, next);
    let mut new_path = parent.to_vec();
    new_path.push(index + 1);
    Some(new_path)
}

/// Frees a slot for new blocks at the caret inside `range`. Returns the
/// parent path and the index to insert at.
fn make_room(doc: &mut Document, range: &TextblockRange, caret: usize) -> Option<(Vec<usize>, usize)> {
    let slot = block_range(doc, caret, caret)?;
    if slot.path(slot.start) != range.path {
        return Some((slot.parent, slot.start + 1));
    }
    let offset = caret - range.start;
    let siblings = doc.children_mut(&slot.parent)?;
    let replace_empty = siblings
        .get(slot.start)
        .is_some_and(|b| b.block_type == BlockType::Paragraph && b.text.is_empty());
    if replace_empty {
        siblings.remove(slot.start);
        Some((slot.parent, slot.start))
    } else if offset >= range.len {
        Some((slot.parent, slot.start + 1))
    } else if offset == 0 {
        Some((slot.parent, slot.start))
    } else {
        split_textblock(doc, &range.path, offset)?;
        Some((slot.parent, slot.start + 1))
    }
}

/// Caret after inserting `count` blocks at `at` under `parent`: the end of the
/// last inserted textblock, else the start of the next textblock.
fn caret_after_insert(doc: &Document, parent: &[usize], at: usize, count: usize) -> Option<Selection> {
    let mut first = parent.to_vec();
    first.push(at);
    let mut last = parent.to_vec();
    last.push(at + count - 1);
    let start = doc.node_start(&first)?;
    let end = doc.node_start(&last)? + doc.block_at(&last)?.node_size();

    let ranges = doc.textblocks();
    ranges
        .iter()
        .rev()
        .find(|r| r.start > start && r.end() < end)
        .map(|r| r.end())
        .or_else(|| ranges.iter().find(|r| r.start > end).map(|r| r.start))
        .map(Selection::caret)
}

/// Inserts whole blocks at the caret.
///
/// An empty current paragraph is replaced. Otherwise the blocks go after the
/// current block, or before it when the caret is at its very start, and a
/// caret in the middle of text splits the block first. A trailing empty
/// paragraph follows an atom that would otherwise end its parent.
pub fn insert_blocks(state: &EditorState, blocks: Vec<Block>) -> Option<EditorState> {
    if blocks.is_empty() {
        return None;
    }
    let registry = NodeRegistry::global();
    let mut incoming = Document::new(blocks);
    registry.repair(&mut incoming);
    let blocks = incoming.blocks;
    let count = blocks.len();
    let ends_with_atom = blocks.last().is_some_and(Block::is_atom);

    let draft = collapse(state);
    let mut doc = draft.doc.clone();
    let caret = draft.selection.head;
    let (parent, at) = match doc.textblock_at(caret) {
        Some(range) => make_room(&mut doc, &range, caret)?,
        None => (Vec::new(), doc.blocks.len()),
    };

    let siblings = doc.children_mut(&parent)?;
    let at = at.min(siblings.len());
    siblings.splice(at..at, blocks);
    if ends_with_atom && at + count == siblings.len() {
        siblings.push(Block::empty_paragraph());
    }
    registry.repair(&mut doc);

    let selection = caret_after_insert(&doc, &parent, at, count)
        .unwrap_or_else(|| Selection::caret(caret).snapped(&doc));
    finish(state, doc, selection)
}

pub fn set_horizontal_rule(state: &EditorState) -> Option<EditorState> {
    insert_blocks(state, vec![Block::new(BlockType::HorizontalRule)])
}

pub fn set_callout(state: &EditorState, variant: CalloutVariant) -> Option<EditorState> {
    let callout = Block::container(BlockType::Callout, vec![Block::empty_paragraph()])
        .with_attr("type", Value::from(variant.name()));
    insert_blocks(state, vec![callout])
}

/// Inserts a collapsed toggle block whose summary is an empty paragraph.
pub fn set_toggle_block(state: &EditorState) -> Option<EditorState> {
    let toggle = Block::container(BlockType::ToggleBlock, vec![Block::empty_paragraph()]);
    insert_blocks(state, vec![toggle])
}

pub fn set_embed(state: &EditorState, src: Option<&str>) -> Option<EditorState> {
    let embed = Block::new(BlockType::EmbedBlock).with_attr("src", src.map_or(Value::Null, Value::from));
    insert_blocks(state, vec![embed])
}

/// Inserts `text` at the caret, replacing a non-collapsed selection.
///
/// Text takes the stored marks, or the marks at the caret. Each `\n` splits
/// the textblock, except in code blocks where it is kept literally.
pub fn insert_text(state: &EditorState, text: &str) -> Option<EditorState> {
    if text.is_empty() {
        return None;
    }
    let draft = collapse(state);
    let mut doc = draft.doc.clone();
    let caret = draft.selection.head;
    let range = match doc.textblock_at(caret) {
        Some(range) => range,
        None => {
            doc.blocks.push(Block::empty_paragraph());
            let path = vec![doc.blocks.len() - 1];
            let start = text_start(&doc, &path)?;
            TextblockRange { path, start, len: 0 }
        }
    };

    let block = doc.block_at(&range.path)?;
    let mut offset = caret.saturating_sub(range.start);
    let literal = block.block_type == BlockType::CodeBlock;
    let marks = if block.spec().marks_allowed {
        state.stored_marks.clone().unwrap_or_else(|| marks_at(&block.text, offset))
    } else {
        MarkSet::new()
    };

    let mut path = range.path;
    let lines: Vec<&str> = if literal { vec![text] } else { text.split('\n').collect() };
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            path = split_textblock(&mut doc, &path, offset)?;
            offset = 0;
        }
        insert_runs(&mut doc.block_at_mut(&path)?.text, offset, line, &marks);
        offset += line.chars().count();
    }

    let caret = text_start(&doc, &path)? + offset;
    finish(state, doc, Selection::caret(caret))
}

/// Splits the current block at the caret, the way Enter does while typing.
///
/// In the first paragraph of a list item the item itself is split; an empty
/// item with nothing else in it is lifted out of the list instead. Code
/// blocks get a literal newline.
pub fn split_block(state: &EditorState) -> Option<EditorState> {
    let draft = collapse(state);
    let caret = draft.selection.head;
    let range = draft.doc.textblock_at(caret)?;
    let block = draft.doc.block_at(&range.path)?;
    if block.block_type == BlockType::CodeBlock {
        return insert_text(&draft, "\n");
    }

    let offset = caret - range.start;
    let (&index, parent) = range.path.split_last()?;
    let item = (index == 0 && !parent.is_empty())
        .then(|| draft.doc.block_at(parent))
        .flatten()
        .filter(|b| b.block_type.is_list_item());
    let mut doc = draft.doc.clone();

    if let Some(item) = item {
        let (&item_index, list_path) = parent.split_last()?;
        if block.text.is_empty() && item.children.len() == 1 {
            let bookmark = draft.selection.bookmark(&draft.doc);
            lift_items(&mut doc, list_path, item_index, item_index)?;
            NodeRegistry::global().repair(&mut doc);
            let selection = bookmark.restore(&doc);
            return finish(state, doc, selection);
        }

        let item = doc.block_at_mut(parent)?;
        let rest = item.children.split_off(1);
        let paragraph = item.children.first_mut()?;
        let (head, tail) = split_runs(&paragraph.text, offset);
        paragraph.text = head;
        let mut new_item = Block::new(item.block_type);
        new_item.children.push(Block::textblock(BlockType::Paragraph, tail));
        new_item.children.extend(rest);
        doc.children_mut(list_path)?.insert(item_index + 1, new_item);

        let mut new_path = list_path.to_vec();
        new_path.extend([item_index + 1, 0]);
        let caret = text_start(&doc, &new_path)?;
        return finish(state, doc, Selection::caret(caret));
    }

    let new_path = split_textblock(&mut doc, &range.path, offset)?;
    let caret = text_start(&doc, &new_path)?;
    finish(state, doc, Selection::caret(caret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mark::Mark;
    use crate::core::text::{runs_text, TextRun};
    use serde_json::json;

    fn state_at(blocks: Vec<Block>, caret: usize) -> EditorState {
        let mut state = EditorState::new(Document::new(blocks));
        state.selection = Selection::caret(caret);
        state
    }

    fn item(block_type: BlockType, text: &str) -> Block {
        Block::container(block_type, vec![Block::paragraph(text)])
    }

    #[test]
    fn test_horizontal_rule_replaces_empty_paragraph() {
        let next = set_horizontal_rule(&EditorState::default()).unwrap();
        assert_eq!(
            next.doc.blocks,
            vec![Block::new(BlockType::HorizontalRule), Block::empty_paragraph()]
        );
        assert_eq!(next.selection, Selection::caret(2));
    }

    #[test]
    fn test_horizontal_rule_splits_text() {
        let next = set_horizontal_rule(&state_at(vec![Block::paragraph("abcd")], 3)).unwrap();
        assert_eq!(
            next.doc.blocks,
            vec![
                Block::paragraph("ab"),
                Block::new(BlockType::HorizontalRule),
                Block::paragraph("cd"),
            ]
        );
        assert_eq!(next.selection, Selection::caret(6));
    }

    #[test]
    fn test_toggle_block_starts_with_empty_paragraph() {
        let next = set_toggle_block(&EditorState::default()).unwrap();
        let toggle = &next.doc.blocks[0];
        assert_eq!(toggle.block_type, BlockType::ToggleBlock);
        assert_eq!(toggle.attrs["open"], false);
        assert_eq!(toggle.children, vec![Block::empty_paragraph()]);
        assert_eq!(next.selection, Selection::caret(2));
    }

    #[test]
    fn test_callout_goes_after_text() {
        let next = set_callout(&state_at(vec![Block::paragraph("x")], 2), CalloutVariant::Tip).unwrap();
        assert_eq!(next.doc.blocks[1].callout_variant(), Some(CalloutVariant::Tip));
        assert_eq!(next.selection, Selection::caret(5));
    }

    #[test]
    fn test_insert_from_list_item_goes_after_list() {
        let list = Block::container(BlockType::BulletList, vec![item(BlockType::ListItem, "a")]);
        let next = set_embed(&state_at(vec![list], 3), Some("https://example.com/v")).unwrap();
        let types: Vec<BlockType> = next.doc.blocks.iter().map(|b| b.block_type).collect();
        assert_eq!(types, vec![BlockType::BulletList, BlockType::EmbedBlock, BlockType::Paragraph]);
        assert_eq!(next.doc.blocks[1].attrs["src"], json!("https://example.com/v"));
    }

    #[test]
    fn test_insert_text_into_default_document() {
        let next = insert_text(&EditorState::default(), "hello").unwrap();
        assert_eq!(next.doc.blocks, vec![Block::paragraph("hello")]);
        assert_eq!(next.selection, Selection::caret(6));
    }

    #[test]
    fn test_insert_text_uses_stored_marks_once() {
        let mut state = state_at(vec![Block::paragraph("ab")], 3);
        state.stored_marks = Some([Mark::Italic].into_iter().collect());
        let next = insert_text(&state, "c").unwrap();
        assert_eq!(next.doc.blocks[0].text[1], TextRun::marked("c", [Mark::Italic]));
        assert!(next.stored_marks.is_none());
    }

    #[test]
    fn test_insert_text_inherits_marks_at_caret() {
        let block = Block::textblock(BlockType::Paragraph, vec![TextRun::marked("ab", [Mark::Bold])]);
        let next = insert_text(&state_at(vec![block], 3), "c").unwrap();
        assert_eq!(next.doc.blocks[0].text, vec![TextRun::marked("abc", [Mark::Bold])]);
    }

    #[test]
    fn test_insert_text_newline_splits() {
        let next = insert_text(&EditorState::default(), "a\nb").unwrap();
        assert_eq!(next.doc.blocks, vec![Block::paragraph("a"), Block::paragraph("b")]);
        assert_eq!(next.selection, Selection::caret(5));
    }

    #[test]
    fn test_insert_text_newline_is_literal_in_code() {
        let code = Block::new(BlockType::CodeBlock);
        let next = insert_text(&state_at(vec![code], 1), "a\nb").unwrap();
        assert_eq!(runs_text(&next.doc.blocks[0].text), "a\nb");
        assert_eq!(next.doc.blocks.len(), 1);
    }

    #[test]
    fn test_insert_text_replaces_selection() {
        let mut state = state_at(vec![Block::paragraph("hello")], 1);
        state.selection = Selection::range(2, 5);
        let next = insert_text(&state, "EL").unwrap();
        assert_eq!(next.doc.blocks[0], Block::paragraph("hELo"));
        assert_eq!(next.selection, Selection::caret(4));
    }

    #[test]
    fn test_empty_text_is_noop() {
        assert!(insert_text(&EditorState::default(), "").is_none());
    }

    #[test]
    fn test_split_list_item() {
        let list = Block::container(BlockType::BulletList, vec![item(BlockType::ListItem, "ab")]);
        let next = split_block(&state_at(vec![list], 4)).unwrap();
        assert_eq!(
            next.doc.blocks[0].children,
            vec![item(BlockType::ListItem, "a"), item(BlockType::ListItem, "b")]
        );
        assert_eq!(next.selection, Selection::caret(8));
    }

    #[test]
    fn test_split_task_item_starts_unchecked() {
        let done = item(BlockType::TaskItem, "ab").with_attr("checked", json!(true));
        let list = Block::container(BlockType::TaskList, vec![done]);
        let next = split_block(&state_at(vec![list], 5)).unwrap();
        let items = &next.doc.blocks[0].children;
        assert_eq!(items[0].attrs["checked"], true);
        assert_eq!(items[1].attrs["checked"], false);
        assert!(items[1].children[0].text.is_empty());
    }

    #[test]
    fn test_split_empty_item_lifts_it() {
        let list = Block::container(
            BlockType::BulletList,
            vec![item(BlockType::ListItem, "a"), Block::container(BlockType::ListItem, vec![Block::empty_paragraph()])],
        );
        let next = split_block(&state_at(vec![list], 8)).unwrap();
        assert_eq!(
            next.doc.blocks,
            vec![
                Block::container(BlockType::BulletList, vec![item(BlockType::ListItem, "a")]),
                Block::empty_paragraph(),
            ]
        );
        assert_eq!(next.selection, Selection::caret(8));
    }

    #[test]
    fn test_split_heading_at_end_continues_as_paragraph() {
        let next = split_block(&state_at(vec![Block::heading(1, "Title")], 6)).unwrap();
        assert_eq!(next.doc.blocks, vec![Block::heading(1, "Title"), Block::empty_paragraph()]);
        assert_eq!(next.selection, Selection::caret(8));
    }

    #[test]
    fn test_split_toggle_summary_opens_body() {
        let toggle = Block::container(BlockType::ToggleBlock, vec![Block::paragraph("sum")]);
        let next = split_block(&state_at(vec![toggle], 5)).unwrap();
        let children = &next.doc.blocks[0].children;
        assert_eq!(children, &vec![Block::paragraph("sum"), Block::empty_paragraph()]);
    }
}
