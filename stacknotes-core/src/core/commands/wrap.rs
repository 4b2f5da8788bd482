//! Wrapping blocks in containers, lifting them back out, and list conversion.

use super::{block_range, commit, nearest_ancestor, BlockRange};
use crate::core::document::{Attrs, Block, Document};
use crate::core::schema::{BlockType, CalloutVariant, NodeRegistry};
use crate::core::state::EditorState;
use serde_json::Value;

/// Replaces the node at `path` with its own children.
fn unwrap_at(doc: &mut Document, path: &[usize]) -> Option<()> {
    let (&index, parent) = path.split_last()?;
    let siblings = doc.children_mut(parent)?;
    let node = siblings.remove(index);
    siblings.splice(index..index, node.children);
    Some(())
}

/// Moves the blocks of `range` into a new `wrapper` node.
fn wrap_range(doc: &mut Document, range: &BlockRange, wrapper: Block) -> Option<()> {
    let siblings = doc.children_mut(&range.parent)?;
    if range.end >= siblings.len() || range.start > range.end {
        return None;
    }
    let wrapped: Vec<Block> = siblings.drain(range.start..=range.end).collect();
    siblings.insert(range.start, Block { children: wrapped, ..wrapper });
    Some(())
}

fn toggle_container(
    state: &EditorState,
    matches: impl Fn(&Block) -> bool,
    wrapper: Block,
) -> Option<EditorState> {
    let current = state.current_textblock()?;
    let bookmark = state.selection.bookmark(&state.doc);
    let mut doc = state.doc.clone();
    match nearest_ancestor(&state.doc, &current.path, matches) {
        Some(path) => unwrap_at(&mut doc, &path)?,
        None => {
            let range = block_range(&state.doc, state.selection.from(), state.selection.to())?;
            wrap_range(&mut doc, &range, wrapper)?;
        }
    }
    commit(state, doc, bookmark)
}

/// Wraps the selected blocks in a blockquote, or unwraps the enclosing one.
pub fn toggle_blockquote(state: &EditorState) -> Option<EditorState> {
    toggle_container(
        state,
        |b| b.block_type == BlockType::Blockquote,
        Block::new(BlockType::Blockquote),
    )
}

/// Wraps the selected blocks in a callout of `variant`. Inside a callout of
/// the same variant this unwraps it; inside one of another variant it only
/// changes the variant.
pub fn toggle_callout(state: &EditorState, variant: CalloutVariant) -> Option<EditorState> {
    let current = state.current_textblock()?;
    if let Some(path) = nearest_ancestor(&state.doc, &current.path, |b| b.block_type == BlockType::Callout) {
        let existing = state.doc.block_at(&path)?.callout_variant();
        if existing != Some(variant) {
            let bookmark = state.selection.bookmark(&state.doc);
            let mut doc = state.doc.clone();
            doc.block_at_mut(&path)?
                .attrs
                .insert("type".to_string(), Value::from(variant.name()));
            return commit(state, doc, bookmark);
        }
    }
    toggle_container(
        state,
        |b| b.block_type == BlockType::Callout,
        Block::new(BlockType::Callout).with_attr("type", Value::from(variant.name())),
    )
}

/// Toggles a list of `list_type` around the selection.
///
/// Inside a list of the same type the selected items are lifted out; inside a
/// list of another type that list is converted. Otherwise the selected
/// blocks become items of a new list, headings and code blocks turning into
/// paragraphs first. Any other block in the range makes this a no-op.
pub fn toggle_list(state: &EditorState, list_type: BlockType) -> Option<EditorState> {
    let item_type = list_type.item_type()?;
    let current = state.current_textblock()?;
    let bookmark = state.selection.bookmark(&state.doc);
    let mut doc = state.doc.clone();

    if let Some(list_path) = nearest_ancestor(&state.doc, &current.path, |b| b.block_type.is_list()) {
        let list = state.doc.block_at(&list_path)?;
        if list.block_type == list_type {
            let first = current.path[list_path.len()];
            let last = state
                .doc
                .textblock_at(state.selection.to())
                .filter(|r| r.path.starts_with(&list_path))
                .map_or(first, |r| r.path[list_path.len()]);
            lift_items(&mut doc, &list_path, first, last)?;
        } else {
            convert_list(doc.block_at_mut(&list_path)?, list_type);
        }
        return commit(state, doc, bookmark);
    }

    let range = block_range(&state.doc, state.selection.from(), state.selection.to())?;
    let registry = NodeRegistry::global();
    let siblings = doc.children_mut(&range.parent)?;
    for index in range.start..=range.end {
        let block = siblings.get_mut(index)?;
        match block.block_type {
            BlockType::Paragraph => {}
            BlockType::Heading | BlockType::CodeBlock => {
                let previous = std::mem::take(&mut block.attrs);
                block.attrs = registry.retype_attrs(block.block_type, BlockType::Paragraph, previous, &Attrs::new());
                block.block_type = BlockType::Paragraph;
            }
            _ => return None,
        }
        let paragraph = std::mem::replace(block, Block::new(item_type));
        block.children.push(paragraph);
    }
    wrap_range(&mut doc, &range, Block::new(list_type))?;
    commit(state, doc, bookmark)
}

/// Moves items `first..=last` of the list at `list_path` out of the list,
/// splitting the list around them.
pub(crate) fn lift_items(doc: &mut Document, list_path: &[usize], first: usize, last: usize) -> Option<()> {
    let (&list_index, parent) = list_path.split_last()?;
    let siblings = doc.children_mut(parent)?;
    let mut list = siblings.remove(list_index);
    if last >= list.children.len() || first > last {
        siblings.insert(list_index, list);
        return None;
    }

    let after: Vec<Block> = list.children.split_off(last + 1);
    let lifted: Vec<Block> = list.children.split_off(first);
    let before = std::mem::take(&mut list.children);
    let mut replacement = Vec::new();
    if !before.is_empty() {
        replacement.push(Block { children: before, ..list.clone() });
    }
    replacement.extend(lifted.into_iter().flat_map(|item| item.children));
    if !after.is_empty() {
        replacement.push(Block { children: after, ..list });
    }
    siblings.splice(list_index..list_index, replacement);
    Some(())
}

fn convert_list(list: &mut Block, list_type: BlockType) {
    let registry = NodeRegistry::global();
    let Some(item_type) = list_type.item_type() else {
        return;
    };
    let previous = std::mem::take(&mut list.attrs);
    list.attrs = registry.retype_attrs(list.block_type, list_type, previous, &Attrs::new());
    list.block_type = list_type;
    for item in &mut list.children {
        if item.block_type != item_type {
            let previous = std::mem::take(&mut item.attrs);
            item.attrs = registry.retype_attrs(item.block_type, item_type, previous, &Attrs::new());
            item.block_type = item_type;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::Selection;

    fn state_with(blocks: Vec<Block>, selection: Selection) -> EditorState {
        let mut state = EditorState::new(Document::new(blocks));
        state.selection = selection;
        state
    }

    fn item(text: &str) -> Block {
        Block::container(BlockType::ListItem, vec![Block::paragraph(text)])
    }

    #[test]
    fn test_toggle_bullet_list_wraps_and_lifts() {
        let state = state_with(vec![Block::paragraph("one")], Selection::caret(2));
        let listed = toggle_list(&state, BlockType::BulletList).unwrap();
        assert_eq!(
            listed.doc.blocks,
            vec![Block::container(BlockType::BulletList, vec![item("one")])]
        );
        assert_eq!(listed.selection, Selection::caret(4));

        let lifted = toggle_list(&listed, BlockType::BulletList).unwrap();
        assert_eq!(lifted.doc, state.doc);
        assert_eq!(lifted.selection, Selection::caret(2));
    }

    #[test]
    fn test_wrapping_heading_turns_it_into_paragraph() {
        let state = state_with(vec![Block::heading(1, "h")], Selection::caret(1));
        let listed = toggle_list(&state, BlockType::OrderedList).unwrap();
        let list = &listed.doc.blocks[0];
        assert_eq!(list.block_type, BlockType::OrderedList);
        assert_eq!(list.attrs["start"], 1);
        assert_eq!(list.children[0], item("h"));
    }

    #[test]
    fn test_wrapping_atom_in_list_is_noop() {
        let state = state_with(
            vec![Block::paragraph("a"), Block::new(BlockType::HorizontalRule), Block::paragraph("b")],
            Selection::range(1, 5),
        );
        assert!(toggle_list(&state, BlockType::BulletList).is_none());
    }

    #[test]
    fn test_bullet_to_task_list_converts_items() {
        let list = Block::container(BlockType::BulletList, vec![item("a"), item("b")]);
        let state = state_with(vec![list], Selection::caret(3));
        let tasks = toggle_list(&state, BlockType::TaskList).unwrap();
        let list = &tasks.doc.blocks[0];
        assert_eq!(list.block_type, BlockType::TaskList);
        assert!(list.children.iter().all(|i| i.block_type == BlockType::TaskItem && i.attrs["checked"] == false));
    }

    #[test]
    fn test_list_conversion_keeps_unknown_attrs() {
        let list = Block::container(BlockType::OrderedList, vec![item("a")])
            .with_attr("start", Value::from(3))
            .with_attr("id", Value::from("l1"));
        let state = state_with(vec![list], Selection::caret(3));
        let bullets = toggle_list(&state, BlockType::BulletList).unwrap();
        let attrs = &bullets.doc.blocks[0].attrs;
        assert_eq!(attrs.get("start"), None);
        assert_eq!(attrs["id"], "l1");
    }

    #[test]
    fn test_lifting_middle_item_splits_list() {
        let list = Block::container(BlockType::BulletList, vec![item("a"), item("b"), item("c")]);
        // a: 3..4, b: 8..9, c: 13..14
        let state = state_with(vec![list], Selection::caret(8));
        let lifted = toggle_list(&state, BlockType::BulletList).unwrap();
        let types: Vec<BlockType> = lifted.doc.blocks.iter().map(|b| b.block_type).collect();
        assert_eq!(types, vec![BlockType::BulletList, BlockType::Paragraph, BlockType::BulletList]);
        assert_eq!(lifted.doc.blocks[1], Block::paragraph("b"));
    }

    #[test]
    fn test_blockquote_toggle_roundtrip() {
        let state = state_with(
            vec![Block::paragraph("a"), Block::paragraph("b")],
            Selection::range(1, 5),
        );
        let quoted = toggle_blockquote(&state).unwrap();
        assert_eq!(quoted.doc.blocks.len(), 1);
        assert_eq!(quoted.doc.blocks[0].children.len(), 2);
        assert_eq!(quoted.selection, Selection::range(2, 6));

        let back = toggle_blockquote(&quoted).unwrap();
        assert_eq!(back.doc, state.doc);
    }

    #[test]
    fn test_toggle_callout_switches_variant_then_unwraps() {
        let state = state_with(vec![Block::paragraph("note")], Selection::caret(1));
        let info = toggle_callout(&state, CalloutVariant::Info).unwrap();
        assert_eq!(info.doc.blocks[0].callout_variant(), Some(CalloutVariant::Info));

        let warning = toggle_callout(&info, CalloutVariant::Warning).unwrap();
        assert_eq!(warning.doc.blocks[0].callout_variant(), Some(CalloutVariant::Warning));

        let plain = toggle_callout(&warning, CalloutVariant::Warning).unwrap();
        assert_eq!(plain.doc, state.doc);
    }
}
