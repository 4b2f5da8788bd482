//! Transactions: chains of commands committed as one unit.

use crate::core::command::Command;
use crate::core::schema::NodeRegistry;
use crate::core::selection::Selection;
use crate::core::state::EditorState;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Record of one committed change to the document.
///
/// Each transaction carries a stable id and a wall-clock timestamp so the
/// host can correlate the `onUpdate` calls it receives with history entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Stable UUID for this transaction.
    pub transaction_id: String,
    /// Unix timestamp (milliseconds) when the transaction was committed.
    pub timestamp: i64,
    /// Names of the commands that changed the state, in order.
    pub steps: Vec<String>,
    pub selection_before: Selection,
    pub selection_after: Selection,
}

impl Transaction {
    pub fn new(steps: Vec<String>, selection_before: Selection, selection_after: Selection) -> Self {
        Self {
            transaction_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            steps,
            selection_before,
            selection_after,
        }
    }
}

/// The result of running a [`Chain`] that changed something.
#[derive(Debug, Clone)]
pub struct Applied {
    pub state: EditorState,
    /// Present when the document itself changed; selection-only and
    /// stored-mark changes are applied without a transaction.
    pub transaction: Option<Transaction>,
}

/// An ordered list of commands run against one evolving draft.
///
/// Steps that are no-ops are skipped and the rest continue from the last
/// successful draft. The chain commits once, at the end, if anything changed.
///
/// ```rust
/// use stacknotes_core::{Chain, Command, EditorState};
///
/// let state = EditorState::default();
/// let applied = Chain::new(&state)
///     .then(Command::SetParagraph)
///     .then(Command::ToggleHeading { level: 1 })
///     .run()
///     .unwrap()
///     .unwrap();
/// assert_eq!(applied.transaction.unwrap().steps, vec!["toggleHeading"]);
/// ```
#[derive(Debug)]
pub struct Chain<'a> {
    base: &'a EditorState,
    steps: Vec<Command>,
}

impl<'a> Chain<'a> {
    pub fn new(base: &'a EditorState) -> Self {
        Self { base, steps: Vec::new() }
    }

    /// Appends `command` to the chain.
    #[must_use]
    pub fn then(mut self, command: Command) -> Self {
        self.steps.push(command);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step. Returns `Ok(None)` when every step was a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EditorError::ContentViolation`] if the final draft
    /// breaks a content rule; nothing is committed in that case.
    pub fn run(self) -> Result<Option<Applied>> {
        let mut draft = self.base.clone();
        let mut applied_steps = Vec::new();
        for step in &self.steps {
            match step.apply(&draft) {
                Some(next) => {
                    draft = next;
                    applied_steps.push(step.name().to_string());
                }
                None => log::debug!("skipping no-op step {}", step.name()),
            }
        }
        if applied_steps.is_empty() {
            return Ok(None);
        }

        NodeRegistry::global().check(&draft.doc)?;
        let transaction = (draft.doc != self.base.doc).then(|| {
            Transaction::new(applied_steps, self.base.selection, draft.selection)
        });
        Ok(Some(Applied { state: draft, transaction }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Block;
    use crate::core::mark::MarkType;

    #[test]
    fn test_all_noop_chain_commits_nothing() {
        let state = EditorState::default();
        let result = Chain::new(&state)
            .then(Command::SetParagraph)
            .then(Command::DeleteRange { from: 1, to: 1 })
            .run()
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_noop_steps_are_skipped() {
        let state = EditorState::default();
        let applied = Chain::new(&state)
            .then(Command::ToggleHeading { level: 9 })
            .then(Command::SetToggleBlock)
            .then(Command::SetParagraph)
            .run()
            .unwrap()
            .unwrap();
        let tx = applied.transaction.unwrap();
        assert_eq!(tx.steps, vec!["setToggleBlock"]);
        assert_eq!(applied.state.doc.blocks[0].block_type, crate::BlockType::ToggleBlock);
        assert_eq!(tx.selection_before, state.selection);
        assert!(uuid::Uuid::parse_str(&tx.transaction_id).is_ok());
    }

    #[test]
    fn test_stored_mark_change_has_no_transaction() {
        let state = EditorState::default();
        let applied = Chain::new(&state)
            .then(Command::ToggleMark { mark_type: MarkType::Bold, href: None })
            .run()
            .unwrap()
            .unwrap();
        assert!(applied.transaction.is_none());
        assert!(applied.state.stored_marks.is_some());
    }

    #[test]
    fn test_steps_see_previous_drafts() {
        let state = EditorState::default();
        let applied = Chain::new(&state)
            .then(Command::InsertContent(crate::Content::Text("/".into())))
            .then(Command::DeleteRange { from: 1, to: 2 })
            .then(Command::ToggleHeading { level: 1 })
            .run()
            .unwrap()
            .unwrap();
        assert_eq!(applied.state.doc.blocks, vec![Block::heading(1, "")]);
        assert_eq!(applied.transaction.unwrap().steps.len(), 3);
    }

    #[test]
    fn test_transaction_serializes_camel_case() {
        let tx = Transaction::new(vec!["splitBlock".into()], Selection::caret(1), Selection::caret(3));
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["steps"][0], "splitBlock");
        assert_eq!(json["selectionAfter"]["head"], 3);
        assert!(json["transactionId"].is_string());
    }
}
