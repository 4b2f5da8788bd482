//! Core library for Stacknotes, the block-tree rich-text engine behind the page editor.
//!
//! The primary entry point is [`Editor`], which holds one open page. Every
//! document mutation runs as a [`Command`] through the editor, which commits
//! it as a single transaction and hands the serialized document to the host.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    command::{Command, Content, COMMAND_NAMES},
    config::EditorConfig,
    document::{Attrs, Block, Document},
    editor::{Editor, Key, UpdateSink},
    error::{EditorError, Result},
    history::History,
    mark::{Mark, MarkSet, MarkType},
    menu::{
        bubble::{BubbleAction, BubbleMenu},
        slash::{SlashItem, SlashMenu, SlashOutcome},
        ActiveMenu, MenuController, PointerTarget,
    },
    schema::{BlockType, CalloutVariant, ContentRule, NodeRegistry, NodeSpec},
    selection::Selection,
    serialization::{deserialize, parse_document, serialize, DEFAULT_DOCUMENT_JSON},
    state::EditorState,
    text::TextRun,
    transaction::{Applied, Chain, Transaction},
};
