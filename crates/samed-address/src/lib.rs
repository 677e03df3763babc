//! Address expression parser and evaluator.
//!
//! An [`Address`] is `(left, delim, right)` around one of `, ; + -`; either
//! side may be omitted, defaulting per `delim` (spec §4.3). Parsing never
//! touches a buffer; [`eval::evaluate`] evaluates a parsed address against a
//! [`eval::TextSource`] and [`eval::MarkSource`] for a given selection.

#![warn(missing_docs)]

mod eval;
mod side;

pub use eval::{evaluate, evaluate_side, MarkSource, Range, TextSource};
pub use side::AddressSide;

use samed_error::ErrorLog;
use samed_token::{TokenKind, TokenStream};

/// `(left, delim, right)`. `had_combiner` is false when no `, ; + -` token
/// was actually consumed — `delim` then holds a meaningless placeholder, and
/// evaluation treats a bare single-sided address as just that side rather
/// than threading it through a combiner. `explicit` is false only when
/// nothing address-shaped was consumed at all (no left side, no combiner, no
/// right side) — the signal the executor uses to fall back to a command's
/// address-default flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    /// Left side, or [`AddressSide::Invalid`] if omitted.
    pub left: AddressSide,
    /// One of `, ; + -`, meaningful only when `had_combiner` is true.
    pub delim: char,
    /// Whether a combiner token was actually consumed.
    pub had_combiner: bool,
    /// Right side, or [`AddressSide::Invalid`] if omitted.
    pub right: AddressSide,
    /// False iff the address was entirely absent from the command line.
    pub explicit: bool,
}

impl Address {
    /// The address that results from parsing no address tokens at all.
    pub fn none() -> Self {
        Address {
            left: AddressSide::Invalid,
            delim: ';',
            had_combiner: false,
            right: AddressSide::Invalid,
            explicit: false,
        }
    }
}

const COMBINER_DELIMS: &[u8] = b",;+-";

/// Parse zero, one, or two sides around an optional `, ; + -` delimiter.
pub fn parse_address(stream: &mut TokenStream<'_>, errors: &mut ErrorLog) -> Address {
    let left = match stream.peek() {
        Some(tok) if side::starts_side(stream, tok) => side::parse_side(stream, errors),
        _ => AddressSide::Invalid,
    };
    let mut explicit = !left.is_omitted();

    let (delim, had_combiner) = match stream.peek() {
        Some(tok) if tok.kind == TokenKind::Delimiter && is_combiner(stream.text(tok)) => {
            stream.pop();
            explicit = true;
            (stream_text_byte(stream.text(tok)) as char, true)
        }
        _ => (';', false),
    };

    let right = match stream.peek() {
        Some(tok) if side::starts_side(stream, tok) => {
            explicit = true;
            side::parse_side(stream, errors)
        }
        _ => AddressSide::Invalid,
    };

    Address {
        left,
        delim,
        had_combiner,
        right,
        explicit,
    }
}

fn is_combiner(text: &str) -> bool {
    COMBINER_DELIMS.contains(&text.as_bytes()[0])
}

fn stream_text_byte(text: &str) -> u8 {
    text.as_bytes()[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use samed_lexer::lex;

    fn parse(line: &str) -> Address {
        let mut stream = lex(line);
        let mut errors = ErrorLog::new();
        let addr = parse_address(&mut stream, &mut errors);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors.entries());
        addr
    }

    #[test]
    fn empty_line_has_no_address() {
        let mut stream = lex("");
        let mut errors = ErrorLog::new();
        let addr = parse_address(&mut stream, &mut errors);
        assert!(!addr.explicit);
    }

    #[test]
    fn bare_comma_is_explicit_with_omitted_sides() {
        let addr = parse(",");
        assert!(addr.explicit);
        assert!(addr.had_combiner);
        assert_eq!(addr.delim, ',');
        assert!(addr.left.is_omitted());
        assert!(addr.right.is_omitted());
    }

    #[test]
    fn numeric_range_parses_both_sides() {
        let addr = parse("1,2");
        assert_eq!(addr.left, AddressSide::Line(1));
        assert!(addr.had_combiner);
        assert_eq!(addr.delim, ',');
        assert_eq!(addr.right, AddressSide::Line(2));
    }

    #[test]
    fn missing_delim_has_no_combiner() {
        let mut stream = lex("5");
        let mut errors = ErrorLog::new();
        let addr = parse_address(&mut stream, &mut errors);
        assert_eq!(addr.left, AddressSide::Line(5));
        assert!(!addr.had_combiner);
        assert!(addr.right.is_omitted());
    }

    #[test]
    fn bare_forward_regex_is_left_only() {
        let addr = parse("/beta/");
        assert!(matches!(addr.left, AddressSide::RegexForward(_)));
        assert!(!addr.had_combiner);
        assert!(addr.right.is_omitted());
    }

    #[test]
    fn plus_without_left_or_right_defaults_to_one() {
        let addr = parse("+");
        assert!(addr.left.is_omitted());
        assert!(addr.had_combiner);
        assert_eq!(addr.delim, '+');
        assert!(addr.right.is_omitted());
    }

    #[test]
    fn stops_before_trailing_command_text() {
        let mut stream = lex("5,10d");
        let mut errors = ErrorLog::new();
        let addr = parse_address(&mut stream, &mut errors);
        assert_eq!(addr.left, AddressSide::Line(5));
        assert_eq!(addr.right, AddressSide::Line(10));
        let remaining = stream.peek().unwrap();
        assert_eq!(stream.text(remaining), "d");
    }
}
