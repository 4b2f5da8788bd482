//! The editor of one open page.

use crate::core::commands::delete::previous_text_end;
use crate::core::commands::marks::mark_active;
use crate::core::history::{History, Snapshot};
use crate::core::menu::slash::{SlashItem, SlashOutcome};
use crate::{
    deserialize, serialize, Applied, BlockType, BubbleAction, Chain, Command, Content, Document,
    EditorConfig, EditorState, MarkType, MenuController, PointerTarget, Result, Selection,
};
use serde_json::Value;

/// Receives the serialized document after every committed transaction.
pub trait UpdateSink {
    fn on_update(&mut self, json: &str);
}

impl<F: FnMut(&str)> UpdateSink for F {
    fn on_update(&mut self, json: &str) {
        self(json);
    }
}

/// A key press the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    Enter,
    Backspace,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

/// An open page: document state, menus, history and the host callback.
///
/// `Editor` is the only place where state changes are committed. Every change
/// runs as a [`Chain`]; a chain that alters the document fires exactly one
/// [`UpdateSink::on_update`] with the new canonical JSON.
///
/// ```rust
/// use stacknotes_core::{Editor, EditorConfig};
///
/// let mut updates = Vec::new();
/// let mut editor = Editor::new("", EditorConfig::default(), |json: &str| updates.push(json.to_string()));
/// editor.insert_text("hello").unwrap();
/// drop(editor);
/// assert_eq!(updates.len(), 1);
/// ```
pub struct Editor<S: UpdateSink> {
    state: EditorState,
    config: EditorConfig,
    menus: MenuController,
    history: History,
    sink: S,
}

impl<S: UpdateSink> Editor<S> {
    /// Opens a page from its stored JSON. Unreadable content yields the default document.
    pub fn new(content: &str, config: EditorConfig, sink: S) -> Self {
        let history = History::new(config.history_depth);
        Self {
            state: EditorState::new(deserialize(content)),
            config,
            menus: MenuController::default(),
            history,
            sink,
        }
    }

    /// Replaces the document with another page's content.
    ///
    /// Menus and history are reset and the host is not notified.
    pub fn load_document(&mut self, content: &str) {
        self.state = EditorState::new(deserialize(content));
        self.menus.reset();
        self.history.clear();
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        &self.state.doc
    }

    pub fn selection(&self) -> Selection {
        self.state.selection
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn menus(&self) -> &MenuController {
        &self.menus
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Canonical JSON of the current document.
    pub fn json(&self) -> String {
        serialize(&self.state.doc)
    }

    /// Runs a single command. Returns `false` when it was a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EditorError::ContentViolation`] if the result would
    /// break a content rule; the document is left untouched.
    pub fn run(&mut self, command: Command) -> Result<bool> {
        self.chain(vec![command])
    }

    /// Runs a command looked up by name, for hosts dispatching from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EditorError::UnknownCommand`] or
    /// [`crate::EditorError::InvalidArgument`] if the command cannot be resolved,
    /// and [`crate::EditorError::InvalidPosition`] for a position past the end
    /// of the document.
    pub fn run_named(&mut self, name: &str, args: &Value) -> Result<bool> {
        let command = Command::from_name(name, args)?;
        command.check_positions(&self.state.doc)?;
        self.run(command)
    }

    /// Runs `commands` as one transaction. Returns `false` when every step was a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EditorError::ContentViolation`] if the final draft
    /// breaks a content rule; nothing is committed.
    pub fn chain(&mut self, commands: Vec<Command>) -> Result<bool> {
        let chain = commands.into_iter().fold(Chain::new(&self.state), Chain::then);
        match chain.run() {
            Ok(Some(applied)) => {
                self.commit(applied);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                log::error!("transaction aborted: {e}");
                Err(e)
            }
        }
    }

    fn commit(&mut self, applied: Applied) {
        let previous = std::mem::replace(&mut self.state, applied.state);
        if let Some(transaction) = applied.transaction {
            log::debug!(
                "committed transaction {} [{}]",
                transaction.transaction_id,
                transaction.steps.join(", ")
            );
            let before = Snapshot { doc: previous.doc, selection: previous.selection };
            let after = Snapshot { doc: self.state.doc.clone(), selection: self.state.selection };
            self.history.record(transaction, before, after);
            self.notify();
        }
        self.menus.after_change(&self.state);
    }

    fn notify(&mut self) {
        let json = serialize(&self.state.doc);
        self.sink.on_update(&json);
    }

    /// Inserts `text` at the caret as one transaction, replacing any selection.
    ///
    /// An open slash menu is closed first; its filter is discarded and the
    /// text goes in literally.
    ///
    /// # Errors
    ///
    /// See [`chain`](Self::chain).
    pub fn insert_text(&mut self, text: &str) -> Result<bool> {
        if self.menus.slash().is_open() {
            log::debug!("closing slash menu for external text insertion");
            self.menus.close_slash();
        }
        self.run(Command::InsertContent(Content::Text(text.to_string())))
    }

    /// Moves the selection, snapping it into text.
    pub fn set_selection(&mut self, selection: Selection) {
        let selection = selection.snapped(&self.state.doc);
        if selection != self.state.selection {
            self.state.selection = selection;
            self.state.stored_marks = None;
        }
        self.menus.after_change(&self.state);
    }

    /// Routes a key to the slash menu only. Returns `true` if the menu used it.
    ///
    /// Hosts that bind the menu's keyboard handling separately from ordinary
    /// typing call this; a repeated Enter after the menu closed does nothing.
    ///
    /// # Errors
    ///
    /// See [`chain`](Self::chain).
    pub fn menu_key(&mut self, key: Key) -> Result<bool> {
        match self.menus.slash_key(&key) {
            SlashOutcome::Run { item, filter } => self.run_slash_item(item, &filter).map(|_| true),
            SlashOutcome::Consumed => Ok(true),
            SlashOutcome::Ignored | SlashOutcome::PassThrough => Ok(false),
        }
    }

    /// Handles a key press: the slash menu sees it first, then the document.
    /// Returns `true` if the key was used, either consumed by the open slash
    /// menu or applied as a document or selection change.
    ///
    /// # Errors
    ///
    /// See [`chain`](Self::chain).
    pub fn key_down(&mut self, key: Key) -> Result<bool> {
        match self.menus.slash_key(&key) {
            SlashOutcome::Run { item, filter } => return self.run_slash_item(item, &filter),
            SlashOutcome::Consumed => return Ok(true),
            SlashOutcome::Ignored | SlashOutcome::PassThrough => {}
        }
        match key {
            Key::Char(c) => self.run(Command::InsertContent(Content::Text(c.to_string()))),
            Key::Enter => self.run(Command::SplitBlock),
            Key::Backspace => self.backspace(),
            Key::ArrowLeft => Ok(self.move_caret(false)),
            Key::ArrowRight => Ok(self.move_caret(true)),
            Key::Escape | Key::ArrowUp | Key::ArrowDown => Ok(false),
        }
    }

    fn backspace(&mut self) -> Result<bool> {
        let selection = self.state.selection;
        if !selection.is_collapsed() {
            return self.run(Command::DeleteRange { from: selection.from(), to: selection.to() });
        }
        let Some(range) = self.state.current_textblock() else {
            return Ok(false);
        };
        let head = selection.head;
        if head > range.start {
            return self.run(Command::DeleteRange { from: head - 1, to: head });
        }

        let doc = &self.state.doc;
        let block_type = doc.block_at(&range.path).map(|b| b.block_type);
        if matches!(block_type, Some(BlockType::Heading | BlockType::CodeBlock)) {
            return self.run(Command::SetParagraph);
        }
        let (&index, parent) = match range.path.split_last() {
            Some(split) => split,
            None => return Ok(false),
        };
        let in_item = index == 0 && doc.block_at(parent).is_some_and(|b| b.block_type.is_list_item());
        if in_item {
            let list_type = parent
                .split_last()
                .and_then(|(_, list_path)| doc.block_at(list_path))
                .map(|list| list.block_type);
            let command = match list_type {
                Some(BlockType::BulletList) => Command::ToggleBulletList,
                Some(BlockType::OrderedList) => Command::ToggleOrderedList,
                Some(BlockType::TaskList) => Command::ToggleTaskList,
                _ => return Ok(false),
            };
            return self.run(command);
        }
        match previous_text_end(doc, head) {
            Some(from) => self.run(Command::DeleteRange { from, to: head }),
            None => Ok(false),
        }
    }

    /// Moves a caret one character, crossing into the neighbouring textblock
    /// at either end. A range collapses to its start or end instead.
    fn move_caret(&mut self, forward: bool) -> bool {
        let selection = self.state.selection;
        let target = if !selection.is_collapsed() {
            Some(if forward { selection.to() } else { selection.from() })
        } else {
            let head = selection.head;
            let ranges = self.state.doc.textblocks();
            let current = ranges.iter().position(|r| r.contains(head));
            match (current, forward) {
                (Some(i), true) if head < ranges[i].end() => Some(head + 1),
                (Some(i), true) => ranges.get(i + 1).map(|r| r.start),
                (Some(i), false) if head > ranges[i].start => Some(head - 1),
                (Some(i), false) => i.checked_sub(1).and_then(|j| ranges.get(j)).map(|r| r.end()),
                (None, _) => None,
            }
        };
        match target {
            Some(pos) => {
                let before = self.state.selection;
                self.set_selection(Selection::caret(pos));
                self.state.selection != before
            }
            None => false,
        }
    }

    /// Reports a pointer press so menus can close when it lands outside them.
    pub fn pointer_down(&mut self, target: PointerTarget) {
        self.menus.pointer_down(target);
    }

    pub fn hover_slash_item(&mut self, index: usize) {
        self.menus.hover_slash(index);
    }

    /// Runs the visible slash item at `index`, exactly like Enter on it.
    ///
    /// # Errors
    ///
    /// See [`chain`](Self::chain).
    pub fn click_slash_item(&mut self, index: usize) -> Result<bool> {
        match self.menus.take_slash_item(index) {
            Some((item, filter)) => self.run_slash_item(item, &filter),
            None => Ok(false),
        }
    }

    /// Deletes the typed `/filter` and runs `item` in the same transaction.
    fn run_slash_item(&mut self, item: &SlashItem, filter: &str) -> Result<bool> {
        log::debug!("running slash item '{}'", item.title);
        let head = self.state.selection.head;
        let mut steps = Vec::with_capacity(2);
        if let Some(from) = self.slash_start(head, filter) {
            steps.push(Command::DeleteRange { from, to: head });
        }
        steps.push(item.command.clone());
        self.chain(steps)
    }

    /// Position of the `/` that opened the menu: right before `filter` when the
    /// text still matches, else the last `/` within the lookback window.
    fn slash_start(&self, head: usize, filter: &str) -> Option<usize> {
        let typed = format!("/{filter}");
        let typed_len = typed.chars().count();
        if self.state.doc.text_before(head, typed_len) == typed {
            return Some(head - typed_len);
        }
        let window: Vec<char> = self.state.doc.text_before(head, self.config.slash_lookback).chars().collect();
        let slash = window.iter().rposition(|&c| c == '/')?;
        Some(head - (window.len() - slash))
    }

    /// Applies a bubble menu button. A link with an empty URL does nothing.
    ///
    /// # Errors
    ///
    /// See [`chain`](Self::chain).
    pub fn apply_bubble_action(&mut self, action: &BubbleAction) -> Result<bool> {
        match action.command() {
            Some(command) => self.run(command),
            None => Ok(false),
        }
    }

    /// Whether the selection carries `mark_type`.
    pub fn is_mark_active(&self, mark_type: MarkType) -> bool {
        mark_active(&self.state, mark_type)
    }

    /// Reverts the last transaction. Returns `false` if there is none.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Re-applies the last undone transaction. Returns `false` if there is none.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.state = EditorState { doc: snapshot.doc, selection: snapshot.selection, stored_marks: None };
        self.menus.close_slash();
        self.notify();
        self.menus.after_change(&self.state);
    }
}
