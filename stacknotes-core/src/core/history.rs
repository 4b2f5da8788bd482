//! Bounded undo/redo history of committed transactions.

use crate::core::document::Document;
use crate::core::selection::Selection;
use crate::core::transaction::Transaction;
use std::collections::VecDeque;

/// Document and selection on one side of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub doc: Document,
    pub selection: Selection,
}

#[derive(Debug, Clone)]
struct Entry {
    transaction: Transaction,
    before: Snapshot,
    after: Snapshot,
}

/// Keeps the most recent `depth` transactions for undo and redo.
///
/// Recording a new transaction clears the redo stack. A depth of zero
/// disables history entirely.
#[derive(Debug, Clone)]
pub struct History {
    depth: usize,
    undo: VecDeque<Entry>,
    redo: Vec<Entry>,
}

impl History {
    pub fn new(depth: usize) -> Self {
        Self { depth, undo: VecDeque::new(), redo: Vec::new() }
    }

    /// Records a committed transaction together with the states around it.
    pub fn record(&mut self, transaction: Transaction, before: Snapshot, after: Snapshot) {
        self.redo.clear();
        if self.depth == 0 {
            return;
        }
        self.undo.push_back(Entry { transaction, before, after });
        while self.undo.len() > self.depth {
            self.undo.pop_front();
        }
    }

    /// Steps back one transaction, returning the state to restore.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let entry = self.undo.pop_back()?;
        let snapshot = entry.before.clone();
        self.redo.push(entry);
        Some(snapshot)
    }

    /// Re-applies the most recently undone transaction.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let entry = self.redo.pop()?;
        let snapshot = entry.after.clone();
        self.undo.push_back(entry);
        Some(snapshot)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Transactions available to undo, oldest first.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.undo.iter().map(|e| &e.transaction)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Block;

    fn snapshot(text: &str) -> Snapshot {
        Snapshot { doc: Document::new(vec![Block::paragraph(text)]), selection: Selection::caret(1) }
    }

    fn tx(name: &str) -> Transaction {
        Transaction::new(vec![name.to_string()], Selection::caret(1), Selection::caret(1))
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new(10);
        history.record(tx("insertContent"), snapshot(""), snapshot("a"));
        history.record(tx("insertContent"), snapshot("a"), snapshot("ab"));

        assert_eq!(history.undo(), Some(snapshot("a")));
        assert_eq!(history.undo(), Some(snapshot("")));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(snapshot("a")));
        assert!(history.can_undo());
        assert!(history.can_redo());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new(10);
        history.record(tx("a"), snapshot(""), snapshot("a"));
        history.undo();
        history.record(tx("b"), snapshot(""), snapshot("b"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_depth_keeps_last_entries() {
        let mut history = History::new(2);
        for name in ["one", "two", "three"] {
            history.record(tx(name), snapshot(""), snapshot(name));
        }
        let kept: Vec<&str> = history.transactions().map(|t| t.steps[0].as_str()).collect();
        assert_eq!(kept, vec!["two", "three"]);
    }

    #[test]
    fn test_zero_depth_disables_history() {
        let mut history = History::new(0);
        history.record(tx("a"), snapshot(""), snapshot("a"));
        assert!(!history.can_undo());
    }
}
