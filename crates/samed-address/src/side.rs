//! [`AddressSide`] and the logic that parses a single side token sequence.

use regex::Regex;
use samed_error::{ErrorKind, ErrorLog};
use samed_token::{TokenKind, TokenStream};

/// One side of an [`crate::Address`].
#[derive(Debug, Clone)]
pub enum AddressSide {
    /// Absolute byte position.
    Byte(usize),
    /// `$`, `.`, or `%` — EOF, current range, whole file.
    Character(char),
    /// 1-based line number; `0` denotes the empty range at the start of the
    /// file.
    Line(usize),
    /// A mark name, resolved per-selection via its ordinal at evaluation
    /// time.
    Mark(u8),
    /// Search forward from the current range's end.
    RegexForward(Regex),
    /// Search backward from the current range's start.
    RegexBackward(Regex),
    /// The side was omitted.
    Invalid,
}

impl PartialEq for AddressSide {
    fn eq(&self, other: &Self) -> bool {
        use AddressSide::*;
        match (self, other) {
            (Byte(a), Byte(b)) => a == b,
            (Character(a), Character(b)) => a == b,
            (Line(a), Line(b)) => a == b,
            (Mark(a), Mark(b)) => a == b,
            (RegexForward(a), RegexForward(b)) => a.as_str() == b.as_str(),
            (RegexBackward(a), RegexBackward(b)) => a.as_str() == b.as_str(),
            (Invalid, Invalid) => true,
            _ => false,
        }
    }
}

impl AddressSide {
    /// True for [`AddressSide::Invalid`] (the side was omitted).
    pub fn is_omitted(&self) -> bool {
        matches!(self, AddressSide::Invalid)
    }
}

/// True if `tok` could begin a side, per spec: a `Number`, a dedicated
/// `Mark` token, or a `Delimiter` naming one of `# ' / ? $ . %`.
///
/// The source material states left-side lookahead excludes `? / $`, but
/// that contradicts both the worked example `/beta/ p` (a bare forward
/// regex with no left side) and the `side` grammar itself, which lists `/`,
/// `?`, and `$` as ordinary side starters. This crate resolves the
/// inconsistency by using the same, permissive lookahead for both the left
/// and right side — see `DESIGN.md`.
pub fn starts_side(stream: &TokenStream<'_>, tok: samed_token::Token) -> bool {
    match tok.kind {
        TokenKind::Number | TokenKind::Mark => true,
        TokenKind::Delimiter => {
            let c = stream.text(tok).as_bytes()[0];
            matches!(c, b'#' | b'\'' | b'/' | b'?' | b'$' | b'.' | b'%')
        }
        _ => false,
    }
}

/// Parse a single side. Callers must first confirm [`starts_side`] on the
/// upcoming token.
pub fn parse_side(stream: &mut TokenStream<'_>, errors: &mut ErrorLog) -> AddressSide {
    let Some(tok) = stream.pop() else {
        return AddressSide::Invalid;
    };
    match tok.kind {
        TokenKind::Number => AddressSide::Line(parse_usize(stream.text(tok))),
        TokenKind::Mark => {
            let letter = stream.text(tok).as_bytes()[1];
            AddressSide::Mark(letter)
        }
        TokenKind::Delimiter => {
            let c = stream.text(tok).as_bytes()[0];
            match c {
                b'#' => match stream.pop_if(|t| t.kind == TokenKind::Number) {
                    Some(num) => AddressSide::Byte(parse_usize(stream.text(num))),
                    None => {
                        errors.push_detail(ErrorKind::Address, tok.start, "expected byte position");
                        AddressSide::Invalid
                    }
                },
                b'\'' => {
                    // A `'` that did not form a `Mark` token in the lexer
                    // (not followed by exactly one letter) has no valid
                    // mark name to parse.
                    errors.push_detail(ErrorKind::Mark, tok.start, "expected mark name");
                    AddressSide::Invalid
                }
                b'/' => parse_regex_side(stream, errors, tok.start, b'/', true),
                b'?' => parse_regex_side(stream, errors, tok.start, b'?', false),
                b'$' | b'.' | b'%' => AddressSide::Character(c as char),
                _ => {
                    errors.push(ErrorKind::Address, tok.start);
                    AddressSide::Invalid
                }
            }
        }
        _ => {
            errors.push(ErrorKind::Address, tok.start);
            AddressSide::Invalid
        }
    }
}

fn parse_regex_side(
    stream: &mut TokenStream<'_>,
    errors: &mut ErrorLog,
    open_at: usize,
    open_byte: u8,
    forward: bool,
) -> AddressSide {
    let pattern = match stream.peek() {
        Some(t) if t.kind == TokenKind::String => {
            stream.pop();
            stream.text(t)
        }
        Some(t) if t.kind == TokenKind::Delimiter && stream.text(t).as_bytes()[0] == open_byte => {
            ""
        }
        _ => {
            errors.push_detail(ErrorKind::Regex, open_at, "expected regular expression");
            return AddressSide::Invalid;
        }
    };
    let closer_matches = stream
        .peek()
        .map(|t| t.kind == TokenKind::Delimiter && stream.text(t).as_bytes()[0] == open_byte)
        .unwrap_or(false);
    if closer_matches {
        stream.pop();
    } else {
        errors.push_detail(ErrorKind::Regex, open_at, "expected regular expression");
        return AddressSide::Invalid;
    }
    match Regex::new(pattern) {
        Ok(re) if forward => AddressSide::RegexForward(re),
        Ok(re) => AddressSide::RegexBackward(re),
        Err(_) => {
            errors.push_detail(ErrorKind::Regex, open_at, "expected regular expression");
            AddressSide::Invalid
        }
    }
}

fn parse_usize(text: &str) -> usize {
    text.parse().unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use samed_lexer::lex;

    fn parse(line: &str) -> (AddressSide, ErrorLog) {
        let mut stream = lex(line);
        let mut errors = ErrorLog::new();
        (parse_side(&mut stream, &mut errors), errors)
    }

    #[test]
    fn number_is_line() {
        let (side, errors) = parse("42");
        assert_eq!(side, AddressSide::Line(42));
        assert!(errors.is_empty());
    }

    #[test]
    fn hash_number_is_byte() {
        let (side, errors) = parse("#7");
        assert_eq!(side, AddressSide::Byte(7));
        assert!(errors.is_empty());
    }

    #[test]
    fn hash_without_number_errors() {
        let (side, errors) = parse("#");
        assert_eq!(side, AddressSide::Invalid);
        assert!(!errors.is_empty());
    }

    #[test]
    fn mark_token_is_mark_side() {
        let (side, errors) = parse("'a");
        assert_eq!(side, AddressSide::Mark(b'a'));
        assert!(errors.is_empty());
    }

    #[test]
    fn dollar_dot_percent_are_characters() {
        assert_eq!(parse("$").0, AddressSide::Character('$'));
        assert_eq!(parse(".").0, AddressSide::Character('.'));
        assert_eq!(parse("%").0, AddressSide::Character('%'));
    }

    #[test]
    fn forward_regex_side() {
        let (side, errors) = parse("/foo/");
        assert!(matches!(side, AddressSide::RegexForward(_)));
        assert!(errors.is_empty());
    }

    #[test]
    fn backward_regex_side() {
        let (side, errors) = parse("?foo?");
        assert!(matches!(side, AddressSide::RegexBackward(_)));
        assert!(errors.is_empty());
    }

    #[test]
    fn unterminated_regex_errors() {
        let (side, errors) = parse("/foo");
        assert_eq!(side, AddressSide::Invalid);
        assert!(!errors.is_empty());
    }
}
