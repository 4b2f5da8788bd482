//! The node registry: block and mark types, their content rules and attribute schemas.
//!
//! The registry is assembled once per process ([`NodeRegistry::global`]) and
//! never changes afterwards. It answers three kinds of questions:
//!
//! - **Shape**: which children and attributes a block type accepts
//!   ([`NodeSpec`], [`ContentRule`], [`AttrSpec`]).
//! - **Validation**: whether a whole [`Document`] satisfies every rule
//!   ([`NodeRegistry::check`]).
//! - **Repair**: how to restore the rules after a structural edit
//!   ([`NodeRegistry::repair`]), which every command runs before it returns.

use crate::core::document::{Attrs, Block, Document};
use crate::core::mark::MarkType;
use crate::core::menu::slash::{default_slash_items, SlashItem};
use crate::core::text::normalize_runs;
use crate::{EditorError, Result};
use serde_json::Value;
use std::sync::OnceLock;

static REGISTRY: OnceLock<NodeRegistry> = OnceLock::new();

/// Every block type the editor knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    TaskList,
    TaskItem,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    Callout,
    ToggleBlock,
    EmbedBlock,
}

impl BlockType {
    /// Every block type, in registry order.
    pub const ALL: [BlockType; 13] = [
        BlockType::Paragraph,
        BlockType::Heading,
        BlockType::BulletList,
        BlockType::OrderedList,
        BlockType::ListItem,
        BlockType::TaskList,
        BlockType::TaskItem,
        BlockType::Blockquote,
        BlockType::CodeBlock,
        BlockType::HorizontalRule,
        BlockType::Callout,
        BlockType::ToggleBlock,
        BlockType::EmbedBlock,
    ];

    /// Returns the JSON `type` name of this block type.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::BulletList => "bulletList",
            Self::OrderedList => "orderedList",
            Self::ListItem => "listItem",
            Self::TaskList => "taskList",
            Self::TaskItem => "taskItem",
            Self::Blockquote => "blockquote",
            Self::CodeBlock => "codeBlock",
            Self::HorizontalRule => "horizontalRule",
            Self::Callout => "callout",
            Self::ToggleBlock => "toggleBlock",
            Self::EmbedBlock => "embedBlock",
        }
    }

    /// Looks up a block type by its JSON `type` name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Returns `true` for the three list container types.
    #[must_use]
    pub fn is_list(self) -> bool {
        matches!(self, Self::BulletList | Self::OrderedList | Self::TaskList)
    }

    /// Returns `true` for `listItem` and `taskItem`.
    #[must_use]
    pub fn is_list_item(self) -> bool {
        matches!(self, Self::ListItem | Self::TaskItem)
    }

    /// Returns `true` for every type allowed where the content rule says "block".
    #[must_use]
    pub fn in_block_group(self) -> bool {
        !self.is_list_item()
    }

    /// The item type a list of this type holds, if this is a list.
    #[must_use]
    pub fn item_type(self) -> Option<BlockType> {
        match self {
            Self::BulletList | Self::OrderedList => Some(Self::ListItem),
            Self::TaskList => Some(Self::TaskItem),
            _ => None,
        }
    }
}

/// The semantic variant of a callout block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalloutVariant {
    #[default]
    Info,
    Tip,
    Warning,
    Danger,
    Success,
}

impl CalloutVariant {
    /// Valid values of the callout `type` attribute.
    pub const NAMES: [&'static str; 5] = ["info", "tip", "warning", "danger", "success"];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Tip => "tip",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Success => "success",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "info" => Some(Self::Info),
            "tip" => Some(Self::Tip),
            "warning" => Some(Self::Warning),
            "danger" => Some(Self::Danger),
            "success" => Some(Self::Success),
            _ => None,
        }
    }
}

/// Heading levels the editor exposes.
pub const HEADING_LEVELS: [i64; 3] = [1, 2, 3];

/// What a block type may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRule {
    /// Text runs only (`inline*` / `text*`).
    Inline,
    /// Nothing at all; the node is a leaf.
    Atom,
    /// Blocks from the block group, at least `min` of them.
    Blocks { min: usize },
    /// One or more items of the given type.
    Items(BlockType),
    /// A paragraph followed by zero or more blocks (`paragraph block*`).
    LeadingParagraph,
}

/// The value domain of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    IntegerIn(&'static [i64]),
    Integer,
    Bool,
    OneOf(&'static [&'static str]),
    Text,
    NullableText,
}

impl AttrKind {
    /// Returns `true` if `value` lies in this domain.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::IntegerIn(allowed) => value.as_i64().is_some_and(|v| allowed.contains(&v)),
            Self::Integer => value.as_i64().is_some(),
            Self::Bool => value.is_boolean(),
            Self::OneOf(names) => value.as_str().is_some_and(|s| names.contains(&s)),
            Self::Text => value.is_string(),
            Self::NullableText => value.is_null() || value.is_string(),
        }
    }
}

/// Describes a single typed attribute of a block type.
#[derive(Debug, Clone)]
pub struct AttrSpec {
    pub name: &'static str,
    pub kind: AttrKind,
    pub default: Value,
}

/// The registered definition of one block type.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub block_type: BlockType,
    pub content: ContentRule,
    pub attrs: Vec<AttrSpec>,
    /// Whether text runs inside this type may carry marks.
    pub marks_allowed: bool,
}

impl NodeSpec {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.block_type.name()
    }

    #[must_use]
    pub fn is_textblock(&self) -> bool {
        self.content == ContentRule::Inline
    }

    #[must_use]
    pub fn is_atom(&self) -> bool {
        self.content == ContentRule::Atom
    }

    /// Minimum number of children this type requires.
    #[must_use]
    pub fn min_children(&self) -> usize {
        match self.content {
            ContentRule::Inline | ContentRule::Atom => 0,
            ContentRule::Blocks { min } => min,
            ContentRule::Items(_) | ContentRule::LeadingParagraph => 1,
        }
    }

    /// Returns `true` if a child of type `child` may sit at `index`.
    #[must_use]
    pub fn accepts_child(&self, index: usize, child: BlockType) -> bool {
        match self.content {
            ContentRule::Inline | ContentRule::Atom => false,
            ContentRule::Blocks { .. } => child.in_block_group(),
            ContentRule::Items(item) => child == item,
            ContentRule::LeadingParagraph if index == 0 => child == BlockType::Paragraph,
            ContentRule::LeadingParagraph => child.in_block_group(),
        }
    }

    /// Returns a map of attribute names to their defaults.
    #[must_use]
    pub fn default_attrs(&self) -> Attrs {
        self.attrs
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default.clone()))
            .collect()
    }
}

/// The registered definition of one mark type.
#[derive(Debug, Clone)]
pub struct MarkSpec {
    pub mark_type: MarkType,
    /// Attribute names the mark carries (only `link` has one).
    pub attrs: Vec<&'static str>,
}

/// Process-wide catalogue of block types, mark types and slash-menu items.
#[derive(Debug)]
pub struct NodeRegistry {
    nodes: Vec<NodeSpec>,
    marks: Vec<MarkSpec>,
    slash_items: Vec<SlashItem>,
}

impl NodeRegistry {
    /// Returns the registry, building it on first use.
    pub fn global() -> &'static NodeRegistry {
        REGISTRY.get_or_init(Self::build)
    }

    fn build() -> Self {
        let nodes: Vec<NodeSpec> = BlockType::ALL.into_iter().map(node_spec).collect();
        let marks = MarkType::ALL
            .into_iter()
            .map(|mark_type| MarkSpec {
                mark_type,
                attrs: if mark_type == MarkType::Link { vec!["href"] } else { vec![] },
            })
            .collect();
        let slash_items = default_slash_items();
        log::debug!(
            "node registry built: {} block types, {} slash items",
            nodes.len(),
            slash_items.len()
        );
        Self { nodes, marks, slash_items }
    }

    /// Returns the spec of `block_type`.
    #[must_use]
    pub fn spec(&self, block_type: BlockType) -> &NodeSpec {
        // `nodes` is built from `BlockType::ALL`, whose order matches the discriminants.
        &self.nodes[block_type as usize]
    }

    /// Returns the spec registered under the JSON name `name`.
    #[must_use]
    pub fn spec_by_name(&self, name: &str) -> Option<&NodeSpec> {
        BlockType::from_name(name).map(|t| self.spec(t))
    }

    /// Returns the mark spec registered under the JSON name `name`.
    #[must_use]
    pub fn mark_spec_by_name(&self, name: &str) -> Option<&MarkSpec> {
        self.marks.iter().find(|spec| spec.mark_type.name() == name)
    }

    /// The slash-menu catalogue, in display order.
    #[must_use]
    pub fn slash_items(&self) -> &[SlashItem] {
        &self.slash_items
    }

    /// Returns the default attributes of `block_type`.
    #[must_use]
    pub fn default_attrs(&self, block_type: BlockType) -> Attrs {
        self.spec(block_type).default_attrs()
    }

    /// Fills missing known attributes with defaults and replaces out-of-domain
    /// values. Unknown keys are kept untouched.
    #[must_use]
    pub fn coerce_attrs(&self, block_type: BlockType, mut attrs: Attrs) -> Attrs {
        for spec in &self.spec(block_type).attrs {
            let valid = attrs.get(spec.name).is_some_and(|v| spec.kind.accepts(v));
            if !valid {
                if attrs.contains_key(spec.name) {
                    log::debug!(
                        "{}.{} out of range, reset to default",
                        block_type.name(),
                        spec.name
                    );
                }
                attrs.insert(spec.name.to_string(), spec.default.clone());
            }
        }
        attrs
    }

    /// Moves `attrs` from a `from` node to a `to` node: keys `from` defines are
    /// dropped, `overrides` are merged in and the result is coerced for `to`.
    /// Unknown keys survive, so retyping back restores the original map.
    #[must_use]
    pub fn retype_attrs(&self, from: BlockType, to: BlockType, mut attrs: Attrs, overrides: &Attrs) -> Attrs {
        for spec in &self.spec(from).attrs {
            attrs.remove(spec.name);
        }
        attrs.extend(overrides.clone());
        self.coerce_attrs(to, attrs)
    }

    /// Checks `doc` against every content rule and attribute schema.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::ContentViolation`] describing the first node
    /// that breaks its type's rules.
    pub fn check(&self, doc: &Document) -> Result<()> {
        if doc.blocks.is_empty() {
            return Err(violation("doc", "document must contain at least one block"));
        }
        for block in &doc.blocks {
            if !block.block_type.in_block_group() {
                return Err(violation("doc", format!("'{}' is not a block", block.block_type.name())));
            }
            self.check_block(block)?;
        }
        Ok(())
    }

    fn check_block(&self, block: &Block) -> Result<()> {
        let spec = self.spec(block.block_type);
        for attr in &spec.attrs {
            match block.attrs.get(attr.name) {
                Some(v) if attr.kind.accepts(v) => {}
                _ => return Err(violation(spec.name(), format!("attribute '{}' is invalid", attr.name))),
            }
        }
        match spec.content {
            ContentRule::Inline => {
                if !block.children.is_empty() {
                    return Err(violation(spec.name(), "textblocks cannot hold blocks"));
                }
                if block.text.iter().any(|r| r.text.is_empty()) {
                    return Err(violation(spec.name(), "empty text run"));
                }
                if block.text.windows(2).any(|pair| pair[0].marks == pair[1].marks) {
                    return Err(violation(spec.name(), "adjacent runs share a mark set"));
                }
                if !spec.marks_allowed && block.text.iter().any(|r| !r.marks.is_empty()) {
                    return Err(violation(spec.name(), "marks are not allowed here"));
                }
            }
            ContentRule::Atom => {
                if !block.children.is_empty() || !block.text.is_empty() {
                    return Err(violation(spec.name(), "atomic blocks have no content"));
                }
            }
            _ => {
                if !block.text.is_empty() {
                    return Err(violation(spec.name(), "containers cannot hold text"));
                }
                if block.children.len() < spec.min_children() {
                    return Err(violation(
                        spec.name(),
                        format!("needs at least {} child block(s)", spec.min_children()),
                    ));
                }
                for (index, child) in block.children.iter().enumerate() {
                    if !spec.accepts_child(index, child.block_type) {
                        return Err(violation(
                            spec.name(),
                            format!("'{}' is not allowed at index {index}", child.block_type.name()),
                        ));
                    }
                    self.check_block(child)?;
                }
            }
        }
        Ok(())
    }

    /// Restores every content rule in `doc` after a structural edit.
    ///
    /// Empty required containers get an empty paragraph, empty lists are
    /// dropped, stray list items are unwrapped, blocks inside lists are
    /// wrapped in items, and a leading paragraph is provided where the rule
    /// demands one. The result always passes [`check`](Self::check).
    pub fn repair(&self, doc: &mut Document) {
        self.repair_children(&mut doc.blocks, ContentRule::Blocks { min: 1 });
    }

    fn repair_children(&self, children: &mut Vec<Block>, rule: ContentRule) {
        let mut repaired: Vec<Block> = Vec::with_capacity(children.len());
        for mut child in children.drain(..) {
            if !self.repair_block(&mut child) {
                continue;
            }
            match rule {
                ContentRule::Items(item_type) => repaired.push(self.into_item(child, item_type)),
                _ if child.block_type.is_list_item() => {
                    // Items outside a list contribute their content.
                    repaired.extend(child.children);
                }
                _ => repaired.push(child),
            }
        }

        match rule {
            ContentRule::Blocks { min } => {
                while repaired.len() < min {
                    repaired.push(Block::empty_paragraph());
                }
            }
            ContentRule::LeadingParagraph => match repaired.first().map(|b| b.block_type) {
                Some(BlockType::Paragraph) => {}
                Some(BlockType::Heading | BlockType::CodeBlock) => {
                    let first = &mut repaired[0];
                    let attrs = std::mem::take(&mut first.attrs);
                    first.attrs = self.retype_attrs(first.block_type, BlockType::Paragraph, attrs, &Attrs::new());
                    first.block_type = BlockType::Paragraph;
                    self.repair_block(first);
                }
                _ => repaired.insert(0, Block::empty_paragraph()),
            },
            ContentRule::Items(_) | ContentRule::Inline | ContentRule::Atom => {}
        }
        *children = repaired;
    }

    /// Repairs one node in place. Returns `false` if the node should be removed.
    fn repair_block(&self, block: &mut Block) -> bool {
        let spec = self.spec(block.block_type);
        block.attrs = self.coerce_attrs(block.block_type, std::mem::take(&mut block.attrs));
        match spec.content {
            ContentRule::Inline => {
                block.children.clear();
                if !spec.marks_allowed {
                    for run in &mut block.text {
                        run.marks.clear();
                    }
                }
                normalize_runs(&mut block.text);
                true
            }
            ContentRule::Atom => {
                block.children.clear();
                block.text.clear();
                true
            }
            rule => {
                block.text.clear();
                self.repair_children(&mut block.children, rule);
                !block.children.is_empty()
            }
        }
    }

    fn into_item(&self, block: Block, item_type: BlockType) -> Block {
        if block.block_type == item_type {
            return block;
        }
        let children = if block.block_type.is_list_item() {
            block.children
        } else if block.block_type == BlockType::Paragraph {
            vec![block]
        } else {
            vec![Block::empty_paragraph(), block]
        };
        let mut item = Block::container(item_type, children);
        self.repair_block(&mut item);
        item
    }
}

fn violation(node_type: &str, detail: impl Into<String>) -> EditorError {
    EditorError::ContentViolation { node_type: node_type.to_string(), detail: detail.into() }
}

fn attr(name: &'static str, kind: AttrKind, default: Value) -> AttrSpec {
    AttrSpec { name, kind, default }
}

fn node_spec(block_type: BlockType) -> NodeSpec {
    let (content, attrs, marks_allowed) = match block_type {
        BlockType::Paragraph => (ContentRule::Inline, vec![], true),
        BlockType::Heading => (
            ContentRule::Inline,
            vec![attr("level", AttrKind::IntegerIn(&HEADING_LEVELS), Value::from(1))],
            true,
        ),
        BlockType::BulletList => (ContentRule::Items(BlockType::ListItem), vec![], false),
        BlockType::OrderedList => (
            ContentRule::Items(BlockType::ListItem),
            vec![attr("start", AttrKind::Integer, Value::from(1))],
            false,
        ),
        BlockType::ListItem => (ContentRule::LeadingParagraph, vec![], false),
        BlockType::TaskList => (ContentRule::Items(BlockType::TaskItem), vec![], false),
        BlockType::TaskItem => (
            ContentRule::LeadingParagraph,
            vec![attr("checked", AttrKind::Bool, Value::Bool(false))],
            false,
        ),
        BlockType::Blockquote => (ContentRule::Blocks { min: 1 }, vec![], false),
        BlockType::CodeBlock => (
            ContentRule::Inline,
            vec![attr("language", AttrKind::NullableText, Value::Null)],
            false,
        ),
        BlockType::HorizontalRule => (ContentRule::Atom, vec![], false),
        BlockType::Callout => (
            ContentRule::Blocks { min: 1 },
            vec![attr("type", AttrKind::OneOf(&CalloutVariant::NAMES), Value::from("info"))],
            false,
        ),
        BlockType::ToggleBlock => (
            ContentRule::LeadingParagraph,
            vec![attr("open", AttrKind::Bool, Value::Bool(false))],
            false,
        ),
        BlockType::EmbedBlock => (
            ContentRule::Atom,
            vec![
                attr("src", AttrKind::NullableText, Value::Null),
                attr("caption", AttrKind::Text, Value::from("")),
            ],
            false,
        ),
    };
    NodeSpec { block_type, content, attrs, marks_allowed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mark::Mark;
    use crate::core::text::TextRun;
    use serde_json::json;

    #[test]
    fn test_spec_lookup_matches_type() {
        let registry = NodeRegistry::global();
        for block_type in BlockType::ALL {
            assert_eq!(registry.spec(block_type).block_type, block_type);
        }
        assert_eq!(
            registry.spec_by_name("toggleBlock").map(|s| s.content),
            Some(ContentRule::LeadingParagraph)
        );
        assert!(registry.spec_by_name("table").is_none());
    }

    #[test]
    fn test_mark_spec_lookup() {
        let registry = NodeRegistry::global();
        let link = registry.mark_spec_by_name("link").unwrap();
        assert_eq!(link.mark_type, MarkType::Link);
        assert_eq!(link.attrs, vec!["href"]);
        assert!(registry.mark_spec_by_name("strike").is_some_and(|s| s.attrs.is_empty()));
        assert!(registry.mark_spec_by_name("subscript").is_none());
    }

    #[test]
    fn test_default_attrs() {
        let registry = NodeRegistry::global();
        assert_eq!(registry.default_attrs(BlockType::Callout)["type"], "info");
        assert_eq!(registry.default_attrs(BlockType::ToggleBlock)["open"], false);
        let embed = registry.default_attrs(BlockType::EmbedBlock);
        assert!(embed["src"].is_null());
        assert_eq!(embed["caption"], "");
        assert!(registry.default_attrs(BlockType::Paragraph).is_empty());
    }

    #[test]
    fn test_coerce_attrs_keeps_unknown_and_fixes_invalid() {
        let registry = NodeRegistry::global();
        let mut attrs = Attrs::new();
        attrs.insert("level".into(), json!(7));
        attrs.insert("id".into(), json!("abc"));
        let attrs = registry.coerce_attrs(BlockType::Heading, attrs);
        assert_eq!(attrs["level"], 1);
        assert_eq!(attrs["id"], "abc");
    }

    #[test]
    fn test_toggle_rule_accepts_only_leading_paragraph() {
        let spec = NodeRegistry::global().spec(BlockType::ToggleBlock);
        assert!(spec.accepts_child(0, BlockType::Paragraph));
        assert!(!spec.accepts_child(0, BlockType::Heading));
        assert!(spec.accepts_child(1, BlockType::Heading));
        assert!(!spec.accepts_child(1, BlockType::ListItem));
    }

    #[test]
    fn test_check_rejects_toggle_without_leading_paragraph() {
        let doc = Document::new(vec![Block::container(
            BlockType::ToggleBlock,
            vec![Block::heading(2, "title")],
        )]);
        let err = NodeRegistry::global().check(&doc).unwrap_err();
        assert!(matches!(err, EditorError::ContentViolation { ref node_type, .. } if node_type == "toggleBlock"));
    }

    #[test]
    fn test_check_rejects_unmerged_runs() {
        let mut doc = Document::new(vec![Block::textblock(
            BlockType::Paragraph,
            vec![TextRun::plain("a"), TextRun::plain("b")],
        )]);
        let registry = NodeRegistry::global();
        assert!(registry.check(&doc).is_err());
        registry.repair(&mut doc);
        assert_eq!(doc.blocks[0], Block::paragraph("ab"));
        assert!(registry.check(&doc).is_ok());
    }

    #[test]
    fn test_check_rejects_empty_document() {
        assert!(NodeRegistry::global().check(&Document::new(vec![])).is_err());
    }

    #[test]
    fn test_repair_fills_empty_callout() {
        let mut doc = Document::new(vec![Block::container(BlockType::Callout, vec![])]);
        let registry = NodeRegistry::global();
        registry.repair(&mut doc);
        assert_eq!(doc.blocks[0].children, vec![Block::empty_paragraph()]);
        assert!(registry.check(&doc).is_ok());
    }

    #[test]
    fn test_repair_drops_empty_list_and_keeps_doc_non_empty() {
        let mut doc = Document::new(vec![Block::container(BlockType::BulletList, vec![])]);
        NodeRegistry::global().repair(&mut doc);
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_repair_wraps_blocks_inside_lists() {
        let mut doc = Document::new(vec![Block::container(
            BlockType::TaskList,
            vec![Block::paragraph("a"), Block::container(BlockType::ListItem, vec![Block::paragraph("b")])],
        )]);
        let registry = NodeRegistry::global();
        registry.repair(&mut doc);
        let items = &doc.blocks[0].children;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.block_type == BlockType::TaskItem));
        assert_eq!(items[1].attrs["checked"], false);
        assert!(registry.check(&doc).is_ok());
    }

    #[test]
    fn test_repair_strips_marks_in_code_blocks() {
        let mut doc = Document::new(vec![Block::textblock(
            BlockType::CodeBlock,
            vec![TextRun::marked("let x", [Mark::Bold])],
        )]);
        NodeRegistry::global().repair(&mut doc);
        assert!(doc.blocks[0].text[0].marks.is_empty());
    }

    #[test]
    fn test_repair_converts_leading_heading_of_toggle() {
        let mut doc = Document::new(vec![Block::container(
            BlockType::ToggleBlock,
            vec![Block::heading(1, "summary"), Block::paragraph("body")],
        )]);
        NodeRegistry::global().repair(&mut doc);
        let toggle = &doc.blocks[0];
        assert_eq!(toggle.children[0], Block::paragraph("summary"));
        assert_eq!(toggle.children.len(), 2);
    }
}
