//! Conversion between the block tree and its JSON form.
//!
//! [`serialize`] produces the canonical JSON handed to the host on every
//! committed transaction. [`deserialize`] and [`parse_document`] never fail:
//! malformed input yields the default document, and individual nodes that
//! cannot be trusted are coerced to paragraphs holding whatever literal text
//! could be recovered from them.

use crate::core::document::{Attrs, Block, Document};
use crate::core::mark::{put_mark, Mark, MarkSet};
use crate::core::schema::{BlockType, ContentRule, NodeRegistry};
use crate::core::text::{normalize_runs, TextRun};
use serde::Serialize;
use serde_json::Value;

/// JSON of the document a fresh or unreadable page starts with.
pub const DEFAULT_DOCUMENT_JSON: &str = r#"{"type":"doc","content":[{"type":"paragraph"}]}"#;

#[derive(Serialize)]
struct DocJson {
    #[serde(rename = "type")]
    node_type: &'static str,
    content: Vec<BlockJson>,
}

#[derive(Serialize)]
struct BlockJson {
    #[serde(rename = "type")]
    node_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attrs: Option<Attrs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Vec<BlockJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<Vec<RunJson>>,
}

#[derive(Serialize)]
struct RunJson {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    marks: Option<Vec<Value>>,
}

fn block_json(block: &Block) -> BlockJson {
    let attrs = (!block.attrs.is_empty()).then(|| block.attrs.clone());
    let (content, text) = if block.is_textblock() {
        let runs = block
            .text
            .iter()
            .map(|run| RunJson {
                text: run.text.clone(),
                marks: (!run.marks.is_empty()).then(|| run.marks.iter().map(Mark::to_json).collect()),
            })
            .collect::<Vec<_>>();
        (None, (!runs.is_empty()).then_some(runs))
    } else if block.is_atom() {
        (None, None)
    } else {
        (Some(block.children.iter().map(block_json).collect()), None)
    };
    BlockJson { node_type: block.block_type.name(), attrs, content, text }
}

/// Renders `doc` as canonical JSON.
///
/// Keys appear in a fixed order (`type`, `attrs`, `content`, `text`), attribute
/// maps are key-sorted, and empty `attrs`/`text` are omitted.
#[must_use]
pub fn serialize(doc: &Document) -> String {
    let json = DocJson { node_type: "doc", content: doc.blocks.iter().map(block_json).collect() };
    match serde_json::to_string(&json) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to serialize document, emitting default: {e}");
            DEFAULT_DOCUMENT_JSON.to_string()
        }
    }
}

/// Parses stored page content. Empty or malformed input yields [`Document::default`].
#[must_use]
pub fn deserialize(input: &str) -> Document {
    if input.trim().is_empty() {
        return Document::default();
    }
    match serde_json::from_str::<Value>(input) {
        Ok(value) => parse_document(&value),
        Err(e) => {
            log::warn!("page content is not valid JSON, using default document: {e}");
            Document::default()
        }
    }
}

/// Builds a document from a JSON value, coercing anything the registry rejects.
#[must_use]
pub fn parse_document(value: &Value) -> Document {
    let is_doc = value.get("type").and_then(Value::as_str) == Some("doc");
    let Some(content) = value.get("content").and_then(Value::as_array).filter(|_| is_doc) else {
        log::warn!("page content has no doc root, using default document");
        return Document::default();
    };

    let blocks: Vec<Block> = content
        .iter()
        .filter_map(parse_block)
        .map(|block| {
            if block.block_type.in_block_group() {
                block
            } else {
                log::warn!("'{}' is not allowed at the top level, coerced to paragraph", block.block_type.name());
                Block::paragraph(&block.plain_text())
            }
        })
        .collect();

    if blocks.is_empty() {
        return Document::default();
    }
    Document::new(blocks)
}

/// Parses a list of loose nodes, as handed to `insertContent`.
#[must_use]
pub fn parse_blocks(values: &[Value]) -> Vec<Block> {
    values.iter().filter_map(parse_block).collect()
}

/// Parses one node. Returns `None` only for values that are not JSON objects.
fn parse_block(value: &Value) -> Option<Block> {
    if !value.is_object() {
        log::debug!("dropping non-object node: {value}");
        return None;
    }
    let registry = NodeRegistry::global();
    let name = value.get("type").and_then(Value::as_str).unwrap_or_default();
    let Some(block_type) = BlockType::from_name(name) else {
        log::warn!("unknown block type '{name}', coerced to paragraph");
        return Some(coerced(value));
    };

    let attrs = value.get("attrs").and_then(Value::as_object).cloned().unwrap_or_default();
    let mut block = Block {
        block_type,
        attrs: registry.coerce_attrs(block_type, attrs),
        children: Vec::new(),
        text: Vec::new(),
    };
    let spec = registry.spec(block_type);

    match spec.content {
        ContentRule::Atom => {}
        ContentRule::Inline => {
            let Some(runs) = parse_inline(value) else {
                log::warn!("'{name}' holds blocks where text was expected, coerced to paragraph");
                return Some(coerced(value));
            };
            block.text = runs;
            if !spec.marks_allowed {
                for run in &mut block.text {
                    run.marks.clear();
                }
            }
            normalize_runs(&mut block.text);
        }
        _ => {
            block.children = value
                .get("content")
                .and_then(Value::as_array)
                .map(|content| content.iter().filter_map(parse_block).collect())
                .unwrap_or_default();
            let valid = block.children.len() >= spec.min_children()
                && block
                    .children
                    .iter()
                    .enumerate()
                    .all(|(i, child)| spec.accepts_child(i, child.block_type));
            if !valid {
                log::warn!("'{name}' violates its content rule, coerced to paragraph");
                return Some(Block::paragraph(&block.plain_text()));
            }
        }
    }
    Some(block)
}

/// Reads a textblock's runs from either `text: [{text, marks}]` or the inline
/// node form `content: [{type: "text", text, marks}]`. Returns `None` when
/// `content` holds anything other than inline nodes.
fn parse_inline(value: &Value) -> Option<Vec<TextRun>> {
    let mut runs = Vec::new();
    if let Some(items) = value.get("text").and_then(Value::as_array) {
        runs.extend(items.iter().filter_map(parse_run));
    }
    if let Some(items) = value.get("content").and_then(Value::as_array) {
        for item in items {
            match item.get("type").and_then(Value::as_str) {
                Some("text") => runs.extend(parse_run(item)),
                Some("hardBreak") => runs.push(TextRun::plain("\n")),
                _ => return None,
            }
        }
    }
    Some(runs)
}

fn parse_run(value: &Value) -> Option<TextRun> {
    let text = value.get("text")?.as_str()?;
    if text.is_empty() {
        return None;
    }
    let mut marks = MarkSet::new();
    for mark in value.get("marks").and_then(Value::as_array).into_iter().flatten() {
        match Mark::from_json(mark) {
            Some(m) => put_mark(&mut marks, m),
            None => log::debug!("dropping unsupported mark {mark}"),
        }
    }
    Some(TextRun { text: text.to_string(), marks })
}

fn coerced(value: &Value) -> Block {
    Block::paragraph(&recoverable_text(value))
}

/// All literal text found beneath a JSON node; text of separate blocks is
/// joined with a single space.
fn recoverable_text(value: &Value) -> String {
    fn collect(value: &Value, out: &mut Vec<String>) {
        let mut own = String::new();
        match value.get("text") {
            Some(Value::String(s)) => own.push_str(s),
            Some(Value::Array(runs)) => {
                for run in runs {
                    if let Some(s) = run.get("text").and_then(Value::as_str) {
                        own.push_str(s);
                    }
                }
            }
            _ => {}
        }
        for child in value.get("content").and_then(Value::as_array).into_iter().flatten() {
            if child.get("type").and_then(Value::as_str) == Some("text") {
                if let Some(s) = child.get("text").and_then(Value::as_str) {
                    own.push_str(s);
                }
            } else {
                if !own.is_empty() {
                    out.push(std::mem::take(&mut own));
                }
                collect(child, out);
            }
        }
        if !own.is_empty() {
            out.push(own);
        }
    }
    let mut pieces = Vec::new();
    collect(value, &mut pieces);
    pieces.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::CalloutVariant;
    use serde_json::json;

    fn rich_document() -> Document {
        Document::new(vec![
            Block::heading(2, "Title"),
            Block::textblock(
                BlockType::Paragraph,
                vec![
                    TextRun::plain("plain "),
                    TextRun::marked("bold link", [Mark::Bold, Mark::Link { href: "https://a.b".into() }]),
                ],
            ),
            Block::container(
                BlockType::TaskList,
                vec![Block::container(BlockType::TaskItem, vec![Block::paragraph("todo")])
                    .with_attr("checked", json!(true))],
            ),
            Block::container(
                BlockType::OrderedList,
                vec![Block::container(BlockType::ListItem, vec![Block::paragraph("one")])],
            ),
            Block::container(BlockType::Blockquote, vec![Block::paragraph("quoted")]),
            Block::textblock(BlockType::CodeBlock, vec![TextRun::plain("fn main() {}")])
                .with_attr("language", json!("rust")),
            Block::new(BlockType::HorizontalRule),
            Block::container(BlockType::Callout, vec![Block::paragraph("careful")])
                .with_attr("type", json!(CalloutVariant::Warning.name())),
            Block::container(
                BlockType::ToggleBlock,
                vec![Block::paragraph("summary"), Block::paragraph("hidden")],
            )
            .with_attr("open", json!(true)),
            Block::new(BlockType::EmbedBlock)
                .with_attr("src", json!("https://youtube.com/watch?v=x"))
                .with_attr("caption", json!("clip")),
            Block::paragraph("").with_attr("textAlign", json!("center")),
        ])
    }

    #[test]
    fn test_roundtrip_all_block_types() {
        let doc = rich_document();
        assert!(NodeRegistry::global().check(&doc).is_ok());
        assert_eq!(deserialize(&serialize(&doc)), doc);
    }

    #[test]
    fn test_roundtrip_holds_for_every_checked_document() {
        let split = Document::new(vec![Block::textblock(
            BlockType::Paragraph,
            vec![TextRun::plain("a"), TextRun::plain("b")],
        )]);
        let registry = NodeRegistry::global();
        assert!(registry.check(&split).is_err());

        let marked = Document::new(vec![Block::textblock(
            BlockType::Paragraph,
            vec![TextRun::plain("a"), TextRun::marked("b", [Mark::Italic]), TextRun::plain("c")],
        )]);
        assert!(registry.check(&marked).is_ok());
        assert_eq!(deserialize(&serialize(&marked)), marked);
    }

    #[test]
    fn test_default_document_literal() {
        assert_eq!(serialize(&Document::default()), DEFAULT_DOCUMENT_JSON);
    }

    #[test]
    fn test_empty_and_invalid_input_fall_back() {
        assert_eq!(deserialize(""), Document::default());
        assert_eq!(deserialize("not json"), Document::default());
        assert_eq!(deserialize("{\"type\":\"page\"}"), Document::default());
        assert_eq!(deserialize("{\"type\":\"doc\",\"content\":[]}"), Document::default());
    }

    #[test]
    fn test_heading_serializes_level_attr() {
        let json = serialize(&Document::new(vec![Block::heading(1, "")]));
        assert_eq!(json, r#"{"type":"doc","content":[{"type":"heading","attrs":{"level":1}}]}"#);
    }

    #[test]
    fn test_unknown_block_becomes_paragraph_with_text() {
        let doc = parse_document(&json!({
            "type": "doc",
            "content": [{
                "type": "table",
                "content": [{ "type": "tableRow", "content": [
                    { "type": "tableCell", "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "a" }] }] },
                    { "type": "tableCell", "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "b" }] }] }
                ]}]
            }]
        }));
        assert_eq!(doc.blocks, vec![Block::paragraph("a b")]);
    }

    #[test]
    fn test_tiptap_inline_content_is_accepted() {
        let doc = parse_document(&json!({
            "type": "doc",
            "content": [{ "type": "paragraph", "content": [
                { "type": "text", "text": "hi " },
                { "type": "text", "text": "there", "marks": [{ "type": "italic" }, { "type": "sparkle" }] }
            ]}]
        }));
        assert_eq!(
            doc.blocks[0].text,
            vec![TextRun::plain("hi "), TextRun::marked("there", [Mark::Italic])]
        );
    }

    #[test]
    fn test_toggle_with_leading_heading_is_coerced() {
        let doc = parse_document(&json!({
            "type": "doc",
            "content": [{ "type": "toggleBlock", "content": [
                { "type": "heading", "attrs": { "level": 2 }, "text": [{ "text": "Summary" }] },
                { "type": "paragraph", "text": [{ "text": "body" }] }
            ]}]
        }));
        assert_eq!(doc.blocks, vec![Block::paragraph("Summary body")]);
    }

    #[test]
    fn test_list_item_at_top_level_is_coerced() {
        let doc = parse_document(&json!({
            "type": "doc",
            "content": [{ "type": "listItem", "content": [{ "type": "paragraph", "text": [{ "text": "x" }] }] }]
        }));
        assert_eq!(doc.blocks, vec![Block::paragraph("x")]);
    }

    #[test]
    fn test_unknown_attributes_are_preserved() {
        let input = r#"{"type":"doc","content":[{"type":"callout","attrs":{"emoji":"🔥","type":"tip"},"content":[{"type":"paragraph"}]}]}"#;
        let doc = deserialize(input);
        assert_eq!(doc.blocks[0].attrs["emoji"], "🔥");
        assert_eq!(serialize(&doc), input);
    }

    #[test]
    fn test_invalid_known_attribute_resets_to_default() {
        let doc = deserialize(r#"{"type":"doc","content":[{"type":"callout","attrs":{"type":"purple"},"content":[{"type":"paragraph"}]}]}"#);
        assert_eq!(doc.blocks[0].callout_variant(), Some(CalloutVariant::Info));
    }

    #[test]
    fn test_code_block_marks_are_stripped() {
        let doc = deserialize(r#"{"type":"doc","content":[{"type":"codeBlock","text":[{"text":"x","marks":[{"type":"bold"}]}]}]}"#);
        assert!(doc.blocks[0].text[0].marks.is_empty());
        assert!(NodeRegistry::global().check(&doc).is_ok());
    }
}
