//! Property: two disjoint changes produce the same final buffer and the
//! same selection effects no matter which order they are enqueued in.
//! [`Transcript::enqueue`] keeps changes sorted by `range.start`
//! regardless of arrival order, so [`Transcript::apply`] only ever sees
//! one canonical ordering.

use proptest::prelude::*;
use samed_error::ErrorLog;
use samed_transcript::{Change, MutableText, SelectionSink, Transcript};

#[derive(Default)]
struct RecordingText {
    buf: String,
}

impl MutableText for RecordingText {
    fn apply_delete(&mut self, range: [usize; 2]) {
        self.buf.replace_range(range[0]..range[1], "");
    }
    fn apply_insert(&mut self, at: usize, data: &str, count: i64) {
        self.buf.insert_str(at, &data.repeat(count.max(0) as usize));
    }
}

#[derive(Default)]
struct RecordingSelections;

impl SelectionSink for RecordingSelections {
    fn is_visual_mode(&self, _window: usize) -> bool {
        false
    }
    fn dispose(&mut self, _window: usize, _selection: usize) {}
    fn move_cursor(&mut self, _window: usize, _selection: usize, _at: usize) {}
    fn anchor_range(&mut self, _window: usize, _selection: usize, _range: [usize; 2]) {}
}

/// A buffer and two ranges within it, `[a, b]` and `[c, d]`, separated by
/// at least one untouched byte (`b < c`) so the two changes never share an
/// endpoint — a shared endpoint makes application order genuinely
/// significant (e.g. two inserts at the same point), which is not the
/// "disjoint edits" case this property covers.
fn buffer_and_ranges() -> impl Strategy<Value = (String, [usize; 2], [usize; 2])> {
    "[a-z]{2,40}".prop_flat_map(|buf| {
        let len = buf.len();
        (0..len).prop_flat_map(move |mid1| {
            let buf = buf.clone();
            ((mid1 + 1)..=len).prop_flat_map(move |mid2| {
                let buf = buf.clone();
                (0..=mid1, 0..=mid1, mid2..=len, mid2..=len).prop_map(move |(a, b, c, d)| {
                    let (a, b) = if a <= b { (a, b) } else { (b, a) };
                    let (c, d) = if c <= d { (c, d) } else { (d, c) };
                    (buf.clone(), [a, b], [c, d])
                })
            })
        })
    })
}

fn change_for(range: [usize; 2], insert: bool, data: &str) -> Change {
    if insert {
        Change::insert(0, None, range[0], data.to_string(), 1)
    } else {
        Change::delete(0, None, range)
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

    #[test]
    fn disjoint_changes_apply_identically_regardless_of_enqueue_order(
        (buf, first_range, second_range) in buffer_and_ranges(),
        first_is_insert in any::<bool>(),
        second_is_insert in any::<bool>(),
        insert_data in "[A-Z]{0,5}",
    ) {
        let first = change_for(first_range, first_is_insert, &insert_data);
        let second = change_for(second_range, second_is_insert, &insert_data);

        let mut forward = Transcript::new();
        let mut log = ErrorLog::new();
        forward.enqueue(first.clone(), &mut log);
        forward.enqueue(second.clone(), &mut log);

        let mut backward = Transcript::new();
        let mut log2 = ErrorLog::new();
        backward.enqueue(second, &mut log2);
        backward.enqueue(first, &mut log2);

        prop_assert_eq!(forward.error, backward.error);
        if forward.error {
            return Ok(());
        }

        let mut forward_text = RecordingText { buf: buf.clone() };
        let mut forward_sel = RecordingSelections::default();
        prop_assert!(forward.apply(&mut forward_text, &mut forward_sel));

        let mut backward_text = RecordingText { buf };
        let mut backward_sel = RecordingSelections::default();
        prop_assert!(backward.apply(&mut backward_text, &mut backward_sel));

        prop_assert_eq!(forward_text.buf, backward_text.buf);
    }
}
