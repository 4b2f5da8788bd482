//! Text runs and the character-offset edits applied to them.
//!
//! All offsets in this module are counted in Unicode scalar values (`char`s),
//! matching how document positions count characters.

use crate::core::mark::{has_mark_type, Mark, MarkSet, MarkType};

/// A contiguous run of characters sharing the same mark set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: MarkSet,
}

impl TextRun {
    /// Creates a run with no marks.
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), marks: MarkSet::new() }
    }

    /// Creates a run carrying `marks`.
    pub fn marked(text: impl Into<String>, marks: impl IntoIterator<Item = Mark>) -> Self {
        Self { text: text.into(), marks: marks.into_iter().collect() }
    }

    /// Length of the run in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

fn byte_index(s: &str, char_offset: usize) -> usize {
    s.char_indices().nth(char_offset).map_or(s.len(), |(i, _)| i)
}

/// Total length of `runs` in characters.
#[must_use]
pub fn runs_len(runs: &[TextRun]) -> usize {
    runs.iter().map(TextRun::char_len).sum()
}

/// Concatenated text of `runs`.
#[must_use]
pub fn runs_text(runs: &[TextRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

/// Merges adjacent runs with identical marks and drops empty runs.
pub fn normalize_runs(runs: &mut Vec<TextRun>) {
    let mut out: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs.drain(..) {
        if run.text.is_empty() {
            continue;
        }
        if let Some(prev) = out.last_mut() {
            if prev.marks == run.marks {
                prev.text.push_str(&run.text);
                continue;
            }
        }
        out.push(run);
    }
    *runs = out;
}

/// Splits `runs` at character `offset` into the part before and the part after.
#[must_use]
pub fn split_runs(runs: &[TextRun], offset: usize) -> (Vec<TextRun>, Vec<TextRun>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut pos = 0;
    for run in runs {
        let len = run.char_len();
        if pos + len <= offset {
            before.push(run.clone());
        } else if pos >= offset {
            after.push(run.clone());
        } else {
            let cut = byte_index(&run.text, offset - pos);
            before.push(TextRun { text: run.text[..cut].to_string(), marks: run.marks.clone() });
            after.push(TextRun { text: run.text[cut..].to_string(), marks: run.marks.clone() });
        }
        pos += len;
    }
    (before, after)
}

/// Returns the runs covering characters `start..end`.
#[must_use]
pub fn slice_runs(runs: &[TextRun], start: usize, end: usize) -> Vec<TextRun> {
    let (_, tail) = split_runs(runs, start);
    let (middle, _) = split_runs(&tail, end.saturating_sub(start));
    middle
}

/// Plain text of characters `start..end`.
#[must_use]
pub fn text_slice(runs: &[TextRun], start: usize, end: usize) -> String {
    runs_text(&slice_runs(runs, start, end))
}

/// Deletes characters `start..end`.
pub fn delete_chars(runs: &mut Vec<TextRun>, start: usize, end: usize) {
    if start >= end {
        return;
    }
    let (mut head, rest) = split_runs(runs, start);
    let (_, tail) = split_runs(&rest, end - start);
    head.extend(tail);
    normalize_runs(&mut head);
    *runs = head;
}

/// Inserts `text` carrying `marks` at character `offset`.
pub fn insert_text(runs: &mut Vec<TextRun>, offset: usize, text: &str, marks: &MarkSet) {
    if text.is_empty() {
        return;
    }
    let (mut head, tail) = split_runs(runs, offset);
    head.push(TextRun { text: text.to_string(), marks: marks.clone() });
    head.extend(tail);
    normalize_runs(&mut head);
    *runs = head;
}

/// Marks that text typed at `offset` inherits: those of the character before
/// the offset, or of the first character at offset 0. Links do not extend.
#[must_use]
pub fn marks_at(runs: &[TextRun], offset: usize) -> MarkSet {
    let mut pos = 0;
    let mut found: Option<&MarkSet> = runs.first().map(|r| &r.marks);
    for run in runs {
        let len = run.char_len();
        if offset > pos && offset <= pos + len {
            found = Some(&run.marks);
            break;
        }
        pos += len;
    }
    found
        .map(|marks| marks.iter().filter(|m| m.mark_type() != MarkType::Link).cloned().collect())
        .unwrap_or_default()
}

/// Returns `true` when every character in `start..end` carries `mark_type`.
/// An empty range never carries a mark.
#[must_use]
pub fn range_has_mark(runs: &[TextRun], start: usize, end: usize, mark_type: MarkType) -> bool {
    let covered = slice_runs(runs, start, end);
    !covered.is_empty() && covered.iter().all(|r| has_mark_type(&r.marks, mark_type))
}

/// Returns `true` when any character in `start..end` carries `mark_type`.
#[must_use]
pub fn range_touches_mark(runs: &[TextRun], start: usize, end: usize, mark_type: MarkType) -> bool {
    slice_runs(runs, start, end).iter().any(|r| has_mark_type(&r.marks, mark_type))
}

/// Rewrites the mark set of every character in `start..end` with `edit`.
pub fn edit_marks(runs: &mut Vec<TextRun>, start: usize, end: usize, edit: impl Fn(&mut MarkSet)) {
    if start >= end {
        return;
    }
    let (mut head, rest) = split_runs(runs, start);
    let (mut middle, tail) = split_runs(&rest, end - start);
    for run in &mut middle {
        edit(&mut run.marks);
    }
    head.extend(middle);
    head.extend(tail);
    normalize_runs(&mut head);
    *runs = head;
}
