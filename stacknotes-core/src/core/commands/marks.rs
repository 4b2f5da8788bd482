//! Inline mark commands.

use super::finish;
use crate::core::document::TextblockRange;
use crate::core::mark::{drop_mark_type, has_mark_type, put_mark, Mark, MarkSet, MarkType};
use crate::core::state::EditorState;
use crate::core::text::{edit_marks, marks_at, range_has_mark, range_touches_mark};
use serde_json::json;

/// A character range `start..end` of one selected textblock.
struct Segment {
    range: TextblockRange,
    start: usize,
    end: usize,
}

/// Non-empty selected spans of textblocks that accept marks.
fn segments(state: &EditorState) -> Vec<Segment> {
    let (from, to) = (state.selection.from(), state.selection.to());
    state
        .selected_textblocks()
        .into_iter()
        .filter(|range| state.doc.block_at(&range.path).is_some_and(|b| b.spec().marks_allowed))
        .map(|range| Segment {
            start: from.max(range.start) - range.start,
            end: to.min(range.end()) - range.start,
            range,
        })
        .filter(|seg| seg.start < seg.end)
        .collect()
}

/// Marks the next insertion at a collapsed caret would carry.
fn caret_marks(state: &EditorState) -> Option<MarkSet> {
    if let Some(stored) = &state.stored_marks {
        return Some(stored.clone());
    }
    let range = state.current_textblock()?;
    let block = state.doc.block_at(&range.path)?;
    Some(marks_at(&block.text, state.selection.head - range.start))
}

fn caret_accepts_marks(state: &EditorState) -> bool {
    state.current_block().is_some_and(|b| b.spec().marks_allowed)
}

/// Applies `edit` to the marks of every selected segment.
fn edit_segments(state: &EditorState, segs: &[Segment], edit: impl Fn(&mut MarkSet)) -> Option<EditorState> {
    let mut doc = state.doc.clone();
    for seg in segs {
        let block = doc.block_at_mut(&seg.range.path)?;
        edit_marks(&mut block.text, seg.start, seg.end, &edit);
    }
    finish(state, doc, state.selection)
}

fn with_stored_marks(state: &EditorState, marks: MarkSet) -> Option<EditorState> {
    if state.stored_marks.as_ref() == Some(&marks) {
        return None;
    }
    Some(EditorState { stored_marks: Some(marks), ..state.clone() })
}

/// Toggles `mark_type` over the selection.
///
/// The mark is removed when every selected character carries it and added
/// otherwise. On a collapsed caret the stored marks are toggled instead.
/// Adding a link needs `href`.
pub fn toggle_mark(state: &EditorState, mark_type: MarkType, href: Option<&str>) -> Option<EditorState> {
    let mark = Mark::with_attrs(mark_type, href.map(|h| json!({ "href": h })).as_ref());

    if state.selection.is_collapsed() {
        if !caret_accepts_marks(state) {
            return None;
        }
        let mut marks = caret_marks(state)?;
        if has_mark_type(&marks, mark_type) {
            drop_mark_type(&mut marks, mark_type);
        } else {
            put_mark(&mut marks, mark?);
        }
        return with_stored_marks(state, marks);
    }

    let segs = segments(state);
    if segs.is_empty() {
        return None;
    }
    let all_marked = segs
        .iter()
        .filter_map(|seg| state.doc.block_at(&seg.range.path).map(|b| (b, seg)))
        .all(|(b, seg)| range_has_mark(&b.text, seg.start, seg.end, mark_type));
    if all_marked {
        edit_segments(state, &segs, |marks| drop_mark_type(marks, mark_type))
    } else {
        let mark = mark?;
        edit_segments(state, &segs, |marks| put_mark(marks, mark.clone()))
    }
}

/// Links the selection to `href`. An empty `href` does nothing.
pub fn set_link(state: &EditorState, href: &str) -> Option<EditorState> {
    if href.is_empty() {
        return None;
    }
    let link = Mark::Link { href: href.to_string() };
    if state.selection.is_collapsed() {
        if !caret_accepts_marks(state) {
            return None;
        }
        let mut marks = caret_marks(state)?;
        put_mark(&mut marks, link);
        return with_stored_marks(state, marks);
    }
    let segs = segments(state);
    if segs.is_empty() {
        return None;
    }
    edit_segments(state, &segs, |marks| put_mark(marks, link.clone()))
}

/// Removes links from the selection, or from the whole link under a collapsed caret.
pub fn unset_link(state: &EditorState) -> Option<EditorState> {
    if !state.selection.is_collapsed() {
        let segs: Vec<Segment> = segments(state)
            .into_iter()
            .filter(|seg| {
                state
                    .doc
                    .block_at(&seg.range.path)
                    .is_some_and(|b| range_touches_mark(&b.text, seg.start, seg.end, MarkType::Link))
            })
            .collect();
        if segs.is_empty() {
            return None;
        }
        return edit_segments(state, &segs, |marks| drop_mark_type(marks, MarkType::Link));
    }

    let range = state.current_textblock()?;
    let block = state.doc.block_at(&range.path)?;
    let offset = state.selection.head - range.start;

    let mut spans = Vec::with_capacity(block.text.len());
    let mut pos = 0;
    for run in &block.text {
        let len = run.char_len();
        let link = run.marks.iter().find(|m| m.mark_type() == MarkType::Link).cloned();
        spans.push((pos, pos + len, link));
        pos += len;
    }
    let hit = spans
        .iter()
        .position(|(s, e, link)| link.is_some() && *s <= offset && offset <= *e)?;
    let target = spans[hit].2.clone();
    let mut first = hit;
    while first > 0 && spans[first - 1].2 == target {
        first -= 1;
    }
    let mut last = hit;
    while last + 1 < spans.len() && spans[last + 1].2 == target {
        last += 1;
    }

    let seg = Segment { start: spans[first].0, end: spans[last].1, range };
    edit_segments(state, &[seg], |marks| drop_mark_type(marks, MarkType::Link))
}

/// Whether the selection carries `mark_type`, for highlighting menu buttons.
#[must_use]
pub fn mark_active(state: &EditorState, mark_type: MarkType) -> bool {
    if state.selection.is_collapsed() {
        return caret_marks(state).is_some_and(|marks| has_mark_type(&marks, mark_type));
    }
    let segs = segments(state);
    !segs.is_empty()
        && segs.iter().all(|seg| {
            state
                .doc
                .block_at(&seg.range.path)
                .is_some_and(|b| range_has_mark(&b.text, seg.start, seg.end, mark_type))
        })
}
