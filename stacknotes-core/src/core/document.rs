//! The typed block tree and integer document positions.
//!
//! Positions follow the usual rich-text convention: position 0 is the start
//! of the document's content, entering or leaving a non-atomic node costs one
//! position, every character costs one, and an atomic node costs one in total.

use crate::core::schema::{BlockType, CalloutVariant, NodeRegistry, NodeSpec};
use crate::core::text::{runs_len, runs_text, text_slice, TextRun};
use serde_json::Value;

/// Attribute map of a block. Unknown keys are preserved.
pub type Attrs = serde_json::Map<String, Value>;

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub block_type: BlockType,
    pub attrs: Attrs,
    /// Child blocks; always empty for textblocks and atoms.
    pub children: Vec<Block>,
    /// Text runs; only textblocks carry any.
    pub text: Vec<TextRun>,
}

impl Block {
    /// Creates an empty node of `block_type` with default attributes.
    pub fn new(block_type: BlockType) -> Self {
        Self {
            block_type,
            attrs: NodeRegistry::global().default_attrs(block_type),
            children: Vec::new(),
            text: Vec::new(),
        }
    }

    pub fn empty_paragraph() -> Self {
        Self::new(BlockType::Paragraph)
    }

    /// A paragraph holding unmarked `text`.
    pub fn paragraph(text: &str) -> Self {
        Self::textblock(BlockType::Paragraph, plain_runs(text))
    }

    /// A heading of `level` holding unmarked `text`.
    pub fn heading(level: u8, text: &str) -> Self {
        Self::textblock(BlockType::Heading, plain_runs(text)).with_attr("level", Value::from(level))
    }

    pub fn textblock(block_type: BlockType, text: Vec<TextRun>) -> Self {
        Self { text, ..Self::new(block_type) }
    }

    pub fn container(block_type: BlockType, children: Vec<Block>) -> Self {
        Self { children, ..Self::new(block_type) }
    }

    /// Returns this block with `key` set to `value`.
    #[must_use]
    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        self.attrs.insert(key.to_string(), value);
        self
    }

    #[must_use]
    pub fn spec(&self) -> &'static NodeSpec {
        NodeRegistry::global().spec(self.block_type)
    }

    #[must_use]
    pub fn is_textblock(&self) -> bool {
        self.spec().is_textblock()
    }

    #[must_use]
    pub fn is_atom(&self) -> bool {
        self.spec().is_atom()
    }

    /// Heading level, or `None` if this is not a heading.
    #[must_use]
    pub fn heading_level(&self) -> Option<i64> {
        if self.block_type != BlockType::Heading {
            return None;
        }
        self.attrs.get("level").and_then(Value::as_i64)
    }

    /// Callout variant, or `None` if this is not a callout.
    #[must_use]
    pub fn callout_variant(&self) -> Option<CalloutVariant> {
        if self.block_type != BlockType::Callout {
            return None;
        }
        self.attrs.get("type").and_then(Value::as_str).and_then(CalloutVariant::from_name)
    }

    /// Returns `true` if this is a textblock with no characters.
    #[must_use]
    pub fn is_empty_textblock(&self) -> bool {
        self.is_textblock() && self.text.is_empty()
    }

    /// Characters held directly by this textblock.
    #[must_use]
    pub fn text_len(&self) -> usize {
        runs_len(&self.text)
    }

    /// All literal text beneath this node; separate blocks are joined with a space.
    #[must_use]
    pub fn plain_text(&self) -> String {
        if self.is_textblock() {
            return runs_text(&self.text);
        }
        self.children
            .iter()
            .map(Block::plain_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Size of the node's content in positions.
    #[must_use]
    pub fn content_size(&self) -> usize {
        if self.is_textblock() {
            self.text_len()
        } else {
            self.children.iter().map(Block::node_size).sum()
        }
    }

    /// Size of the whole node in positions.
    #[must_use]
    pub fn node_size(&self) -> usize {
        if self.is_atom() {
            1
        } else {
            self.content_size() + 2
        }
    }
}

fn plain_runs(text: &str) -> Vec<TextRun> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![TextRun::plain(text)]
    }
}

/// A position resolved against the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPos {
    pub pos: usize,
    /// Path of child indices from the doc to the innermost node whose content
    /// contains `pos`. Empty when that node is the doc itself.
    pub path: Vec<usize>,
    /// Position where that node's content starts.
    pub content_start: usize,
    /// `pos - content_start`; a character offset when `in_text` is set.
    pub offset: usize,
    /// Index of the child that starts at or after `pos` (containers only).
    pub index: usize,
    /// Whether the innermost node is a textblock.
    pub in_text: bool,
}

/// Location of one textblock in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextblockRange {
    pub path: Vec<usize>,
    /// Position where the textblock's content starts.
    pub start: usize,
    /// Number of characters in the textblock.
    pub len: usize,
}

impl TextblockRange {
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos <= self.end()
    }
}

/// The root `doc` node: an ordered, non-empty sequence of blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Default for Document {
    /// The document a page starts with: a single empty paragraph.
    fn default() -> Self {
        Self { blocks: vec![Block::empty_paragraph()] }
    }
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Size of the doc's content in positions; valid positions are `0..=content_size()`.
    #[must_use]
    pub fn content_size(&self) -> usize {
        self.blocks.iter().map(Block::node_size).sum()
    }

    /// Returns the node at `path`.
    #[must_use]
    pub fn block_at(&self, path: &[usize]) -> Option<&Block> {
        let (first, rest) = path.split_first()?;
        let mut node = self.blocks.get(*first)?;
        for &i in rest {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    pub fn block_at_mut(&mut self, path: &[usize]) -> Option<&mut Block> {
        let (first, rest) = path.split_first()?;
        let mut node = self.blocks.get_mut(*first)?;
        for &i in rest {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    /// Children of the node at `parent_path` (the doc's blocks for an empty path).
    pub fn children_mut(&mut self, parent_path: &[usize]) -> Option<&mut Vec<Block>> {
        if parent_path.is_empty() {
            Some(&mut self.blocks)
        } else {
            self.block_at_mut(parent_path).map(|b| &mut b.children)
        }
    }

    /// Children of the node at `parent_path`.
    #[must_use]
    pub fn children(&self, parent_path: &[usize]) -> Option<&Vec<Block>> {
        if parent_path.is_empty() {
            Some(&self.blocks)
        } else {
            self.block_at(parent_path).map(|b| &b.children)
        }
    }

    /// Position directly before the node at `path`.
    #[must_use]
    pub fn node_start(&self, path: &[usize]) -> Option<usize> {
        let mut pos = 0;
        let mut children = &self.blocks;
        for (depth, &i) in path.iter().enumerate() {
            let node = children.get(i)?;
            pos += children[..i].iter().map(Block::node_size).sum::<usize>();
            if depth + 1 < path.len() {
                pos += 1;
                children = &node.children;
            }
        }
        Some(pos)
    }

    /// Resolves `pos` to its place in the tree. Returns `None` past the end.
    #[must_use]
    pub fn resolve(&self, pos: usize) -> Option<ResolvedPos> {
        if pos > self.content_size() {
            return None;
        }
        let mut path = Vec::new();
        let mut children = &self.blocks;
        let mut start = 0;
        'descend: loop {
            let mut p = start;
            for (i, child) in children.iter().enumerate() {
                if pos <= p {
                    return Some(ResolvedPos {
                        pos,
                        path,
                        content_start: start,
                        offset: pos - start,
                        index: i,
                        in_text: false,
                    });
                }
                let size = child.node_size();
                if !child.is_atom() && pos < p + size {
                    path.push(i);
                    if child.is_textblock() {
                        return Some(ResolvedPos {
                            pos,
                            path,
                            content_start: p + 1,
                            offset: pos - p - 1,
                            index: 0,
                            in_text: true,
                        });
                    }
                    children = &child.children;
                    start = p + 1;
                    continue 'descend;
                }
                p += size;
            }
            return Some(ResolvedPos {
                pos,
                path,
                content_start: start,
                offset: pos - start,
                index: children.len(),
                in_text: false,
            });
        }
    }

    /// Every textblock in document order.
    #[must_use]
    pub fn textblocks(&self) -> Vec<TextblockRange> {
        fn walk(children: &[Block], start: usize, path: &mut Vec<usize>, out: &mut Vec<TextblockRange>) {
            let mut p = start;
            for (i, child) in children.iter().enumerate() {
                path.push(i);
                if child.is_textblock() {
                    out.push(TextblockRange { path: path.clone(), start: p + 1, len: child.text_len() });
                } else if !child.is_atom() {
                    walk(&child.children, p + 1, path, out);
                }
                path.pop();
                p += child.node_size();
            }
        }
        let mut out = Vec::new();
        walk(&self.blocks, 0, &mut Vec::new(), &mut out);
        out
    }

    /// The textblock whose content contains `pos`.
    #[must_use]
    pub fn textblock_at(&self, pos: usize) -> Option<TextblockRange> {
        let resolved = self.resolve(pos)?;
        if !resolved.in_text {
            return None;
        }
        let len = self.block_at(&resolved.path)?.text_len();
        Some(TextblockRange { path: resolved.path, start: resolved.content_start, len })
    }

    /// Closest position to `pos` that lies inside a textblock, if any textblock exists.
    #[must_use]
    pub fn nearest_text_pos(&self, pos: usize) -> Option<usize> {
        self.textblocks()
            .into_iter()
            .map(|range| {
                let snapped = pos.clamp(range.start, range.end());
                (snapped.abs_diff(pos), snapped)
            })
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, snapped)| snapped)
    }

    /// Up to `max_chars` characters of the current textblock directly before `pos`.
    #[must_use]
    pub fn text_before(&self, pos: usize, max_chars: usize) -> String {
        let Some(range) = self.textblock_at(pos) else {
            return String::new();
        };
        let Some(block) = self.block_at(&range.path) else {
            return String::new();
        };
        let offset = pos - range.start;
        text_slice(&block.text, offset.saturating_sub(max_chars), offset)
    }

    /// All literal text, one line per textblock.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.textblocks()
            .iter()
            .filter_map(|range| self.block_at(&range.path))
            .map(|b| runs_text(&b.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
