//! Commands that change the type or attributes of existing blocks.

use super::commit;
use crate::core::document::Attrs;
use crate::core::schema::{BlockType, NodeRegistry, HEADING_LEVELS};
use crate::core::state::EditorState;
use serde_json::Value;

/// Retypes every selected textblock to `block_type` with `attrs`.
fn set_textblock_type(state: &EditorState, block_type: BlockType, attrs: &Attrs) -> Option<EditorState> {
    let registry = NodeRegistry::global();
    let bookmark = state.selection.bookmark(&state.doc);
    let mut doc = state.doc.clone();
    for range in state.selected_textblocks() {
        if let Some(block) = doc.block_at_mut(&range.path) {
            let previous = std::mem::take(&mut block.attrs);
            block.attrs = registry.retype_attrs(block.block_type, block_type, previous, attrs);
            block.block_type = block_type;
        }
    }
    commit(state, doc, bookmark)
}

pub fn set_paragraph(state: &EditorState) -> Option<EditorState> {
    set_textblock_type(state, BlockType::Paragraph, &Attrs::new())
}

/// Turns the selected textblocks into headings of `level`, or back into
/// paragraphs when the current block already is one.
pub fn toggle_heading(state: &EditorState, level: u8) -> Option<EditorState> {
    let level = i64::from(level);
    if !HEADING_LEVELS.contains(&level) {
        return None;
    }
    if state.current_block()?.heading_level() == Some(level) {
        return set_paragraph(state);
    }
    let mut attrs = Attrs::new();
    attrs.insert("level".to_string(), Value::from(level));
    set_textblock_type(state, BlockType::Heading, &attrs)
}

pub fn toggle_code_block(state: &EditorState) -> Option<EditorState> {
    if state.current_block()?.block_type == BlockType::CodeBlock {
        return set_paragraph(state);
    }
    set_textblock_type(state, BlockType::CodeBlock, &Attrs::new())
}

/// Merges `attrs` into the node starting at `pos`.
pub fn update_attributes(state: &EditorState, pos: usize, attrs: &Attrs) -> Option<EditorState> {
    let resolved = state.doc.resolve(pos)?;
    if resolved.in_text {
        return None;
    }
    let mut path = resolved.path;
    path.push(resolved.index);
    if state.doc.node_start(&path) != Some(pos) {
        return None;
    }

    let bookmark = state.selection.bookmark(&state.doc);
    let mut doc = state.doc.clone();
    let block = doc.block_at_mut(&path)?;
    let mut merged = std::mem::take(&mut block.attrs);
    merged.extend(attrs.clone());
    block.attrs = NodeRegistry::global().coerce_attrs(block.block_type, merged);
    commit(state, doc, bookmark)
}
