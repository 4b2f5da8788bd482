//! The closed set of editor commands and their name registry.
//!
//! Every command is a pure function of an [`EditorState`]: applying it either
//! yields a new state or `None` when the command has nothing to do in the
//! current context (a no-op, reported nowhere).
//!
//! Hosts that dispatch by name use [`Command::from_name`], which resolves the
//! camelCase names below together with a JSON argument object:
//!
//! ```rust
//! use stacknotes_core::Command;
//! use serde_json::json;
//!
//! let cmd = Command::from_name("toggleHeading", &json!({ "level": 2 })).unwrap();
//! assert_eq!(cmd, Command::ToggleHeading { level: 2 });
//! assert_eq!(cmd.name(), "toggleHeading");
//! ```

use crate::core::commands;
use crate::core::document::{Attrs, Block, Document};
use crate::core::mark::MarkType;
use crate::core::schema::CalloutVariant;
use crate::core::serialization::parse_blocks;
use crate::core::state::EditorState;
use crate::{EditorError, Result};
use serde_json::Value;

/// Content accepted by [`Command::InsertContent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Plain text; newlines split the textblock except inside code blocks.
    Text(String),
    /// Whole blocks, inserted after (or in place of) the current block.
    Blocks(Vec<Block>),
}

impl Content {
    /// Reads content from JSON: a string is text, an object or array holds blocks.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Object(_) => Some(Self::Blocks(parse_blocks(std::slice::from_ref(value)))),
            Value::Array(items) => Some(Self::Blocks(parse_blocks(items))),
            _ => None,
        }
    }
}

/// Every state transition the editor supports.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetParagraph,
    ToggleHeading { level: u8 },
    ToggleBulletList,
    ToggleOrderedList,
    ToggleTaskList,
    ToggleBlockquote,
    SetHorizontalRule,
    ToggleCodeBlock,
    SetCallout { variant: CalloutVariant },
    ToggleCallout { variant: CalloutVariant },
    SetToggleBlock,
    SetEmbed { src: Option<String> },
    /// Toggles a mark over the selection; `href` is used by links.
    ToggleMark { mark_type: MarkType, href: Option<String> },
    SetLink { href: String },
    UnsetLink,
    DeleteRange { from: usize, to: usize },
    InsertContent(Content),
    /// Merges `attrs` into the node that starts at position `pos`.
    UpdateAttributes { pos: usize, attrs: Attrs },
    SplitBlock,
}

/// Command names accepted by [`Command::from_name`], in registry order.
pub const COMMAND_NAMES: [&str; 19] = [
    "setParagraph",
    "toggleHeading",
    "toggleBulletList",
    "toggleOrderedList",
    "toggleTaskList",
    "toggleBlockquote",
    "setHorizontalRule",
    "toggleCodeBlock",
    "setCallout",
    "toggleCallout",
    "setToggleBlock",
    "setEmbed",
    "toggleMark",
    "setLink",
    "unsetLink",
    "deleteRange",
    "insertContent",
    "updateAttributes",
    "splitBlock",
];

impl Command {
    /// The camelCase registry name of this command.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetParagraph => "setParagraph",
            Self::ToggleHeading { .. } => "toggleHeading",
            Self::ToggleBulletList => "toggleBulletList",
            Self::ToggleOrderedList => "toggleOrderedList",
            Self::ToggleTaskList => "toggleTaskList",
            Self::ToggleBlockquote => "toggleBlockquote",
            Self::SetHorizontalRule => "setHorizontalRule",
            Self::ToggleCodeBlock => "toggleCodeBlock",
            Self::SetCallout { .. } => "setCallout",
            Self::ToggleCallout { .. } => "toggleCallout",
            Self::SetToggleBlock => "setToggleBlock",
            Self::SetEmbed { .. } => "setEmbed",
            Self::ToggleMark { .. } => "toggleMark",
            Self::SetLink { .. } => "setLink",
            Self::UnsetLink => "unsetLink",
            Self::DeleteRange { .. } => "deleteRange",
            Self::InsertContent(_) => "insertContent",
            Self::UpdateAttributes { .. } => "updateAttributes",
            Self::SplitBlock => "splitBlock",
        }
    }

    /// Resolves a command by registry name with its JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownCommand`] for names outside
    /// [`COMMAND_NAMES`] and [`EditorError::InvalidArgument`] when a required
    /// argument is missing or out of range.
    pub fn from_name(name: &str, args: &Value) -> Result<Self> {
        let invalid = |detail: &str| EditorError::InvalidArgument {
            command: name.to_string(),
            detail: detail.to_string(),
        };
        let variant = |args: &Value| -> Result<CalloutVariant> {
            match args.get("type").and_then(Value::as_str) {
                None => Ok(CalloutVariant::default()),
                Some(s) => CalloutVariant::from_name(s).ok_or_else(|| invalid("unknown callout type")),
            }
        };
        let position = |key: &str| -> Result<usize> {
            args.get(key)
                .and_then(Value::as_u64)
                .and_then(|v| usize::try_from(v).ok())
                .ok_or_else(|| invalid(&format!("'{key}' must be a position")))
        };

        let cmd = match name {
            "setParagraph" => Self::SetParagraph,
            "toggleHeading" => {
                let level = args
                    .get("level")
                    .and_then(Value::as_u64)
                    .and_then(|l| u8::try_from(l).ok())
                    .filter(|l| (1..=3).contains(l))
                    .ok_or_else(|| invalid("'level' must be 1, 2 or 3"))?;
                Self::ToggleHeading { level }
            }
            "toggleBulletList" => Self::ToggleBulletList,
            "toggleOrderedList" => Self::ToggleOrderedList,
            "toggleTaskList" => Self::ToggleTaskList,
            "toggleBlockquote" => Self::ToggleBlockquote,
            "setHorizontalRule" => Self::SetHorizontalRule,
            "toggleCodeBlock" => Self::ToggleCodeBlock,
            "setCallout" => Self::SetCallout { variant: variant(args)? },
            "toggleCallout" => Self::ToggleCallout { variant: variant(args)? },
            "setToggleBlock" => Self::SetToggleBlock,
            "setEmbed" => Self::SetEmbed {
                src: args.get("src").and_then(Value::as_str).map(str::to_string),
            },
            "toggleMark" => {
                let mark_type = args
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(MarkType::from_name)
                    .ok_or_else(|| invalid("'type' must name a mark"))?;
                let href = args
                    .get("attrs")
                    .and_then(|a| a.get("href"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Self::ToggleMark { mark_type, href }
            }
            "setLink" => Self::SetLink {
                href: args
                    .get("href")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| invalid("'href' is required"))?,
            },
            "unsetLink" => Self::UnsetLink,
            "deleteRange" => Self::DeleteRange { from: position("from")?, to: position("to")? },
            "insertContent" => Self::InsertContent(
                args.get("content")
                    .and_then(Content::from_json)
                    .ok_or_else(|| invalid("'content' must be text, a node or a list of nodes"))?,
            ),
            "updateAttributes" => Self::UpdateAttributes {
                pos: position("pos")?,
                attrs: args
                    .get("attrs")
                    .and_then(Value::as_object)
                    .cloned()
                    .ok_or_else(|| invalid("'attrs' must be an object"))?,
            },
            "splitBlock" => Self::SplitBlock,
            other => return Err(EditorError::UnknownCommand(other.to_string())),
        };
        Ok(cmd)
    }

    /// Checks that every position this command names lies inside `doc`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidPosition`] with the first position past
    /// the end of the document.
    pub fn check_positions(&self, doc: &Document) -> Result<()> {
        let positions = match self {
            Self::DeleteRange { from, to } => vec![*from, *to],
            Self::UpdateAttributes { pos, .. } => vec![*pos],
            _ => Vec::new(),
        };
        let size = doc.content_size();
        match positions.into_iter().find(|&pos| pos > size) {
            Some(pos) => Err(EditorError::InvalidPosition(pos)),
            None => Ok(()),
        }
    }

    /// Applies this command to `state`. Returns `None` when it is a no-op.
    #[must_use]
    pub fn apply(&self, state: &EditorState) -> Option<EditorState> {
        match self {
            Self::SetParagraph => commands::block::set_paragraph(state),
            Self::ToggleHeading { level } => commands::block::toggle_heading(state, *level),
            Self::ToggleCodeBlock => commands::block::toggle_code_block(state),
            Self::ToggleBulletList => commands::wrap::toggle_list(state, crate::BlockType::BulletList),
            Self::ToggleOrderedList => commands::wrap::toggle_list(state, crate::BlockType::OrderedList),
            Self::ToggleTaskList => commands::wrap::toggle_list(state, crate::BlockType::TaskList),
            Self::ToggleBlockquote => commands::wrap::toggle_blockquote(state),
            Self::ToggleCallout { variant } => commands::wrap::toggle_callout(state, *variant),
            Self::SetHorizontalRule => commands::insert::set_horizontal_rule(state),
            Self::SetCallout { variant } => commands::insert::set_callout(state, *variant),
            Self::SetToggleBlock => commands::insert::set_toggle_block(state),
            Self::SetEmbed { src } => commands::insert::set_embed(state, src.as_deref()),
            Self::InsertContent(Content::Text(text)) => commands::insert::insert_text(state, text),
            Self::InsertContent(Content::Blocks(blocks)) => {
                commands::insert::insert_blocks(state, blocks.clone())
            }
            Self::SplitBlock => commands::insert::split_block(state),
            Self::ToggleMark { mark_type, href } => {
                commands::marks::toggle_mark(state, *mark_type, href.as_deref())
            }
            Self::SetLink { href } => commands::marks::set_link(state, href),
            Self::UnsetLink => commands::marks::unset_link(state),
            Self::DeleteRange { from, to } => commands::delete::delete_range(state, *from, *to),
            Self::UpdateAttributes { pos, attrs } => {
                commands::block::update_attributes(state, *pos, attrs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_registered_name_resolves() {
        for name in COMMAND_NAMES {
            let kind = if name.ends_with("Callout") { "tip" } else { "bold" };
            let args = json!({
                "level": 1, "type": kind, "href": "https://x", "from": 1, "to": 2,
                "content": "hi", "pos": 0, "attrs": {}
            });
            let cmd = Command::from_name(name, &args).unwrap();
            assert_eq!(cmd.name(), name);
        }
    }

    #[test]
    fn test_unknown_command() {
        let err = Command::from_name("insertTable", &json!({})).unwrap_err();
        assert!(matches!(err, EditorError::UnknownCommand(name) if name == "insertTable"));
    }

    #[test]
    fn test_heading_level_is_validated() {
        assert!(Command::from_name("toggleHeading", &json!({ "level": 4 })).is_err());
        assert!(Command::from_name("toggleHeading", &json!({})).is_err());
    }

    #[test]
    fn test_callout_type_defaults_to_info() {
        assert_eq!(
            Command::from_name("setCallout", &json!({})).unwrap(),
            Command::SetCallout { variant: CalloutVariant::Info }
        );
        assert!(Command::from_name("setCallout", &json!({ "type": "purple" })).is_err());
    }

    #[test]
    fn test_positions_outside_document_are_rejected() {
        let doc = Document::new(vec![Block::paragraph("ab")]);
        assert!(Command::DeleteRange { from: 1, to: 4 }.check_positions(&doc).is_ok());
        let err = Command::DeleteRange { from: 1, to: 9 }.check_positions(&doc).unwrap_err();
        assert!(matches!(err, EditorError::InvalidPosition(9)));
        let update = Command::UpdateAttributes { pos: 5, attrs: Attrs::new() };
        assert!(matches!(update.check_positions(&doc), Err(EditorError::InvalidPosition(5))));
        assert!(Command::SplitBlock.check_positions(&doc).is_ok());
    }

    #[test]
    fn test_insert_content_accepts_nodes() {
        let cmd = Command::from_name(
            "insertContent",
            &json!({ "content": { "type": "horizontalRule" } }),
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::InsertContent(Content::Blocks(vec![Block::new(crate::BlockType::HorizontalRule)]))
        );
    }
}
