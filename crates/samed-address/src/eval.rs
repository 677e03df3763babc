//! Evaluation of a parsed [`crate::Address`] against a buffer and a
//! per-selection context.

use regex::Regex;

/// Inclusive-exclusive byte range `[start, end)`. `start == end` denotes an
/// empty (cursor) selection.
pub type Range = [usize; 2];

/// Minimal read-only view of the text buffer an address is evaluated
/// against. Production collaborators (a piece-table buffer, a rope) provide
/// this alongside far more; this is only what the address algebra needs.
pub trait TextSource {
    /// Length of the buffer in bytes.
    fn len(&self) -> usize;

    /// Byte offset of the start of 1-based line `line`. Implementations
    /// must accept `line == 0` (returning `0`) and `line` one past the last
    /// line (returning `len()`), so callers can compute a line's range as
    /// `line_to_byte(n)..line_to_byte(n + 1)` without special-casing EOF.
    fn line_to_byte(&self, line: usize) -> usize;

    /// 1-based line number containing byte offset `byte`.
    fn byte_to_line(&self, byte: usize) -> usize;

    /// First match of `re` starting at or after `from`.
    fn search_forward(&self, re: &Regex, from: usize) -> Option<Range>;

    /// Last match of `re` ending at or before `from`.
    fn search_backward(&self, re: &Regex, from: usize) -> Option<Range>;
}

/// Per-file mark storage, indexed by mark name and the evaluating
/// selection's ordinal (spec: "looked up by this selection's ordinal").
pub trait MarkSource {
    /// Position of `mark` for selection `ordinal`, if set.
    fn mark(&self, mark: u8, ordinal: usize) -> Option<usize>;
}

use crate::side::AddressSide;
use crate::Address;

/// Evaluate a single side against `text`/`marks` for selection `ordinal`,
/// given the selection's `current` range.
pub fn evaluate_side(
    side: &AddressSide,
    text: &impl TextSource,
    marks: &impl MarkSource,
    ordinal: usize,
    current: Range,
) -> Range {
    match side {
        AddressSide::Byte(n) => {
            let n = (*n).min(text.len());
            [n, n]
        }
        AddressSide::Character('.') => current,
        AddressSide::Character('$') => [text.len(), text.len()],
        AddressSide::Character('%') => [0, text.len()],
        AddressSide::Character(_) => current,
        AddressSide::Line(0) => [0, 0],
        AddressSide::Line(n) => [text.line_to_byte(*n), text.line_to_byte(n + 1)],
        AddressSide::Mark(m) => match marks.mark(*m, ordinal) {
            Some(pos) => [pos, pos],
            None => [0, 0],
        },
        AddressSide::RegexForward(re) => {
            text.search_forward(re, current[1]).unwrap_or(current)
        }
        AddressSide::RegexBackward(re) => {
            text.search_backward(re, current[0]).unwrap_or(current)
        }
        AddressSide::Invalid => current,
    }
}

/// Evaluate a full [`Address`] against `text`/`marks` for selection
/// `ordinal`, given the selection's `current` range, implementing the
/// `, ; + -` combiner semantics.
pub fn evaluate(
    address: &Address,
    text: &impl TextSource,
    marks: &impl MarkSource,
    ordinal: usize,
    current: Range,
) -> Range {
    if !address.had_combiner && address.right.is_omitted() {
        return default_left(address, text, marks, ordinal, current);
    }
    match address.delim {
        ',' => {
            let left = default_left(address, text, marks, ordinal, current);
            let right = default_right(address, text, marks, ordinal, current);
            union(left, right)
        }
        ';' => {
            let left = default_left(address, text, marks, ordinal, current);
            let right = if address.right.is_omitted() {
                [text.len(), text.len()]
            } else {
                evaluate_side(&address.right, text, marks, ordinal, left)
            };
            union(left, right)
        }
        '+' => {
            let base = if address.left.is_omitted() {
                current
            } else {
                evaluate_side(&address.left, text, marks, ordinal, current)
            };
            let n = relative_count(&address.right);
            line_range_offset(text, base[1], n as isize)
        }
        '-' => {
            let base = if address.left.is_omitted() {
                current
            } else {
                evaluate_side(&address.left, text, marks, ordinal, current)
            };
            let n = relative_count(&address.right);
            line_range_offset(text, base[0], -(n as isize))
        }
        _ => current,
    }
}

fn default_left(
    address: &Address,
    text: &impl TextSource,
    marks: &impl MarkSource,
    ordinal: usize,
    current: Range,
) -> Range {
    if address.left.is_omitted() {
        [0, 0]
    } else {
        evaluate_side(&address.left, text, marks, ordinal, current)
    }
}

fn default_right(
    address: &Address,
    text: &impl TextSource,
    marks: &impl MarkSource,
    ordinal: usize,
    current: Range,
) -> Range {
    if address.right.is_omitted() {
        [text.len(), text.len()]
    } else {
        evaluate_side(&address.right, text, marks, ordinal, current)
    }
}

fn union(a: Range, b: Range) -> Range {
    [a[0].min(b[0]), a[1].max(b[1])]
}

fn relative_count(right: &AddressSide) -> usize {
    match right {
        AddressSide::Line(n) => *n,
        AddressSide::Invalid => 1,
        _ => 1,
    }
}

/// The range of the line `n` lines after (or, for negative `n`, before) the
/// line containing `at`, saturating at the buffer start.
fn line_range_offset(text: &impl TextSource, at: usize, n: isize) -> Range {
    let line = text.byte_to_line(at) as isize;
    let target = (line + n).max(1) as usize;
    [text.line_to_byte(target), text.line_to_byte(target + 1)]
}
