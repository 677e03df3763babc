//! Per-file change transcript: conflict detection, ordering, and the
//! deferred-apply phase that re-anchors selections against shifting
//! positions.
//!
//! Handlers never mutate text directly; they enqueue [`Change`] records here.
//! Only after every command in a top-level invocation has run does
//! [`Transcript::apply`] walk the ordered changes once, maintaining a
//! running byte offset, and hand each one to the caller's [`MutableText`]
//! and [`SelectionSink`] implementations.

#![warn(missing_docs)]

use samed_error::{ErrorKind, ErrorLog};
use tracing::debug;

/// What kind of edit a [`Change`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Insert `data`, `count` times, at `range.start` (`range` is empty).
    Insert,
    /// Delete `range`.
    Delete,
    /// Delete `range`, then insert `data` at its start.
    Change,
}

/// One enqueued edit against a file's pre-apply text.
#[derive(Debug, Clone)]
pub struct Change {
    /// What this change does.
    pub kind: ChangeKind,
    /// Index of the window that enqueued this change.
    pub window: usize,
    /// Index of the selection the change was enqueued for, if any (a
    /// window-scoped action like `r file` has none).
    pub selection: Option<usize>,
    /// Byte range in the pre-apply text this change touches. Empty for a
    /// pure `Insert`.
    pub range: [usize; 2],
    /// Inserted text, for `Insert`/`Change`.
    pub data: Option<String>,
    /// Length in bytes of one copy of `data`.
    pub len: usize,
    /// Number of copies of `data` to insert.
    pub count: i64,
}

impl Change {
    /// A `Delete(range)` change.
    pub fn delete(window: usize, selection: Option<usize>, range: [usize; 2]) -> Self {
        Change {
            kind: ChangeKind::Delete,
            window,
            selection,
            range,
            data: None,
            len: 0,
            count: 1,
        }
    }

    /// An `Insert` of `count` copies of `data` at the empty range `[at, at)`.
    pub fn insert(window: usize, selection: Option<usize>, at: usize, data: String, count: i64) -> Self {
        let len = data.len();
        Change {
            kind: ChangeKind::Insert,
            window,
            selection,
            range: [at, at],
            data: Some(data),
            len,
            count,
        }
    }

    /// A `Change(range)`: delete `range`, insert `data` once at its start.
    pub fn change(window: usize, selection: Option<usize>, range: [usize; 2], data: String) -> Self {
        let len = data.len();
        Change {
            kind: ChangeKind::Change,
            window,
            selection,
            range,
            data: Some(data),
            len,
            count: 1,
        }
    }

    fn delta(&self) -> i64 {
        let inserted = match self.kind {
            ChangeKind::Insert | ChangeKind::Change => self.len as i64 * self.count,
            ChangeKind::Delete => 0,
        };
        let deleted = match self.kind {
            ChangeKind::Delete | ChangeKind::Change => (self.range[1] - self.range[0]) as i64,
            ChangeKind::Insert => 0,
        };
        inserted - deleted
    }
}

/// Per-file, per-invocation change list: sorted by `range.start`,
/// non-overlapping, with a one-entry "most recently inserted" cache.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    changes: Vec<Change>,
    /// Index into `changes` of the most recently inserted entry. Valid only
    /// while that entry's `range.end` does not exceed the next insertion's
    /// `range.start` — [`Self::enqueue`] re-derives the insertion point by
    /// full search whenever the fast path does not apply.
    latest: Option<usize>,
    /// Set once an overlapping change is enqueued; the file is skipped
    /// entirely at apply time.
    pub error: bool,
}

impl Transcript {
    /// An empty transcript.
    pub fn new() -> Self {
        Transcript::default()
    }

    /// True if nothing has been enqueued (and no conflict occurred).
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Enqueued changes in ascending `range.start` order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Enqueue a change, keeping [`Self::changes`] sorted by `range.start`.
    /// Overlapping changes set [`Self::error`] and are still recorded (so
    /// the conflict is visible to diagnostics) but [`Self::apply`] refuses
    /// to run once `error` is set.
    pub fn enqueue(&mut self, change: Change, errors: &mut ErrorLog) {
        if let Some(latest) = self.latest {
            let prev = &self.changes[latest];
            if prev.range[1] <= change.range[0] && latest == self.changes.len() - 1 {
                self.latest = Some(self.changes.len());
                self.changes.push(change);
                return;
            }
        }
        let pos = self
            .changes
            .partition_point(|c| c.range[0] < change.range[0]);
        let overlaps_prev = pos > 0 && self.changes[pos - 1].range[1] > change.range[0];
        let overlaps_next = pos < self.changes.len() && self.changes[pos].range[0] < change.range[1];
        if overlaps_prev || overlaps_next {
            self.error = true;
            errors.push(ErrorKind::Conflict, change.range[0]);
            debug!(start = change.range[0], end = change.range[1], "conflicting change rejected");
        }
        self.changes.insert(pos, change);
        self.latest = Some(pos);
    }
}

/// What the applier needs from a file's mutable text buffer. `samed-engine`'s
/// richer text collaborator implements this for free.
pub trait MutableText {
    /// Remove `range` (already offset-adjusted) from the text.
    fn apply_delete(&mut self, range: [usize; 2]);
    /// Insert `count` back-to-back copies of `data` at `at` (already
    /// offset-adjusted).
    fn apply_insert(&mut self, at: usize, data: &str, count: i64);
}

/// What the applier needs to re-anchor a window's selections after a change.
pub trait SelectionSink {
    /// True while the window is in an editing mode that keeps a selection
    /// anchored (visual) rather than collapsing it to a cursor (normal).
    fn is_visual_mode(&self, window: usize) -> bool;
    /// Drop the selection entirely (normal-mode response to a pure delete
    /// that consumed it).
    fn dispose(&mut self, window: usize, selection: usize);
    /// Collapse the selection to a single cursor position.
    fn move_cursor(&mut self, window: usize, selection: usize, at: usize);
    /// Set the selection to `range` and mark it anchored (visual mode).
    fn anchor_range(&mut self, window: usize, selection: usize, range: [usize; 2]);
}

impl Transcript {
    /// Apply every enqueued change in order, offsetting later ranges by the
    /// running delta left by earlier ones, then re-anchor the selections
    /// each change names. No-op (and returns `false`) if `error` is set —
    /// the caller is expected to have already checked that and skipped the
    /// file, this is a defensive double-check against the one way in which
    /// re-entrant use of the same `Transcript` could apply a conflicted set.
    pub fn apply(&self, text: &mut impl MutableText, selections: &mut impl SelectionSink) -> bool {
        if self.error {
            return false;
        }
        let mut delta: i64 = 0;
        for change in &self.changes {
            let start = (change.range[0] as i64 + delta).max(0) as usize;
            let end = (change.range[1] as i64 + delta).max(0) as usize;
            match change.kind {
                ChangeKind::Delete => {
                    text.apply_delete([start, end]);
                }
                ChangeKind::Insert => {
                    let data = change.data.as_deref().unwrap_or("");
                    text.apply_insert(start, data, change.count);
                }
                ChangeKind::Change => {
                    text.apply_delete([start, end]);
                    let data = change.data.as_deref().unwrap_or("");
                    text.apply_insert(start, data, change.count);
                }
            }
            reanchor(change, start, selections);
            delta += change.delta();
        }
        true
    }
}

fn reanchor(change: &Change, start: usize, selections: &mut impl SelectionSink) {
    let Some(selection) = change.selection else { return };
    let visual = selections.is_visual_mode(change.window);
    match change.kind {
        ChangeKind::Delete => {
            if visual {
                selections.dispose(change.window, selection);
            } else {
                selections.move_cursor(change.window, selection, start);
            }
        }
        ChangeKind::Insert | ChangeKind::Change => {
            let data = change.data.as_deref().unwrap_or("");
            let inserted_len = change.len * change.count.max(0) as usize;
            let range = [start, start + inserted_len];
            if visual {
                selections.anchor_range(change.window, selection, range);
            } else if data.contains('\n') {
                selections.move_cursor(change.window, selection, range[0]);
            } else {
                selections.move_cursor(change.window, selection, range[1]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeText {
        buf: String,
        deletes: Vec<[usize; 2]>,
        inserts: Vec<(usize, String)>,
    }

    impl MutableText for FakeText {
        fn apply_delete(&mut self, range: [usize; 2]) {
            self.deletes.push(range);
            self.buf.replace_range(range[0]..range[1], "");
        }
        fn apply_insert(&mut self, at: usize, data: &str, count: i64) {
            let chunk = data.repeat(count.max(0) as usize);
            self.inserts.push((at, chunk.clone()));
            self.buf.insert_str(at, &chunk);
        }
    }

    #[derive(Default)]
    struct FakeSelections {
        visual: bool,
        cursor: Option<usize>,
        anchored: Option<[usize; 2]>,
        disposed: bool,
    }

    impl SelectionSink for FakeSelections {
        fn is_visual_mode(&self, _window: usize) -> bool {
            self.visual
        }
        fn dispose(&mut self, _window: usize, _selection: usize) {
            self.disposed = true;
        }
        fn move_cursor(&mut self, _window: usize, _selection: usize, at: usize) {
            self.cursor = Some(at);
        }
        fn anchor_range(&mut self, _window: usize, _selection: usize, range: [usize; 2]) {
            self.anchored = Some(range);
        }
    }

    #[test]
    fn overlapping_changes_set_error_and_are_rejected_at_apply() {
        let mut log = ErrorLog::new();
        let mut t = Transcript::new();
        t.enqueue(Change::delete(0, None, [0, 5]), &mut log);
        t.enqueue(Change::delete(0, None, [3, 8]), &mut log);
        assert!(t.error);
        assert_eq!(log.first().unwrap().kind, ErrorKind::Conflict);
        let mut text = FakeText::default();
        let mut sel = FakeSelections::default();
        assert!(!t.apply(&mut text, &mut sel));
    }

    #[test]
    fn disjoint_changes_apply_with_running_offset() {
        let mut log = ErrorLog::new();
        let mut t = Transcript::new();
        t.enqueue(Change::insert(0, None, 10, "XY".to_string(), 1), &mut log);
        t.enqueue(Change::delete(0, None, [0, 4]), &mut log);
        assert!(!t.error);
        let mut text = FakeText {
            buf: "0123456789abcdefgh".to_string(),
            ..Default::default()
        };
        let mut sel = FakeSelections::default();
        assert!(t.apply(&mut text, &mut sel));
        assert_eq!(text.deletes, vec![[0, 4]]);
        assert_eq!(text.inserts, vec![(6, "XY".to_string())]);
    }

    #[test]
    fn reanchor_moves_cursor_to_deletion_start_outside_visual_mode() {
        let mut log = ErrorLog::new();
        let mut t = Transcript::new();
        t.enqueue(Change::delete(0, Some(2), [3, 7]), &mut log);
        let mut text = FakeText {
            buf: "0123456789".to_string(),
            ..Default::default()
        };
        let mut sel = FakeSelections::default();
        t.apply(&mut text, &mut sel);
        assert_eq!(sel.cursor, Some(3));
        assert!(!sel.disposed);
    }

    #[test]
    fn reanchor_disposes_selection_on_delete_in_visual_mode() {
        let mut log = ErrorLog::new();
        let mut t = Transcript::new();
        t.enqueue(Change::delete(0, Some(0), [0, 2]), &mut log);
        let mut text = FakeText {
            buf: "abcdef".to_string(),
            ..Default::default()
        };
        let mut sel = FakeSelections {
            visual: true,
            ..Default::default()
        };
        t.apply(&mut text, &mut sel);
        assert!(sel.disposed);
    }

    #[test]
    fn reanchor_places_cursor_at_insert_start_when_data_has_newline() {
        let mut log = ErrorLog::new();
        let mut t = Transcript::new();
        t.enqueue(Change::insert(0, Some(0), 0, "a\nb".to_string(), 1), &mut log);
        let mut text = FakeText::default();
        let mut sel = FakeSelections::default();
        t.apply(&mut text, &mut sel);
        assert_eq!(sel.cursor, Some(0));
    }

    #[test]
    fn reanchor_places_cursor_at_insert_end_without_newline() {
        let mut log = ErrorLog::new();
        let mut t = Transcript::new();
        t.enqueue(Change::insert(0, Some(0), 0, "ab".to_string(), 1), &mut log);
        let mut text = FakeText::default();
        let mut sel = FakeSelections::default();
        t.apply(&mut text, &mut sel);
        assert_eq!(sel.cursor, Some(2));
    }
}
