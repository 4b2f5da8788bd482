//! Internal domain modules for the Stacknotes core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod command;
pub mod commands;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod history;
pub mod mark;
pub mod menu;
pub mod schema;
pub mod selection;
pub mod serialization;
pub mod state;
pub mod text;
pub mod transaction;

#[doc(inline)]
pub use command::{Command, Content, COMMAND_NAMES};
#[doc(inline)]
pub use config::EditorConfig;
#[doc(inline)]
pub use document::{Attrs, Block, Document};
#[doc(inline)]
pub use editor::{Editor, Key, UpdateSink};
#[doc(inline)]
pub use error::{EditorError, Result};
#[doc(inline)]
pub use history::History;
#[doc(inline)]
pub use mark::{Mark, MarkSet, MarkType};
#[doc(inline)]
pub use menu::{ActiveMenu, MenuController, PointerTarget};
#[doc(inline)]
pub use schema::{BlockType, CalloutVariant, NodeRegistry};
#[doc(inline)]
pub use selection::Selection;
#[doc(inline)]
pub use serialization::{deserialize, serialize};
#[doc(inline)]
pub use state::EditorState;
#[doc(inline)]
pub use transaction::{Applied, Chain, Transaction};
