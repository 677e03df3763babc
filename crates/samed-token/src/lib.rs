//! Token and [`TokenStream`] definitions shared by the lexer and every
//! parser layered on top of it (address parser, command parser).
//!
//! A [`Token`] never owns text: it is a `(kind, start, length)` triple over
//! the raw command line the caller supplied. Slicing is the caller's job via
//! [`TokenStream::text`].

#![warn(missing_docs)]

/// Token classification produced by the lexer.
///
/// `Mark` is not part of the original sam grammar's generic token set; it is
/// lexed directly as `'` followed by a single ASCII letter, rather than
/// requiring the address parser to re-slice a `String` token's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A byte sequence the lexer could not classify; surfaced so parsers can
    /// report a syntax error instead of silently skipping input.
    Invalid,
    /// One of `/ ! ; : % # ? , . + - = '`.
    Delimiter,
    /// `{`
    GroupStart,
    /// `}`
    GroupEnd,
    /// A run of decimal digits.
    Number,
    /// An accumulated run of non-whitespace, non-special bytes, or one of
    /// the single-character pipe command names `> < |`.
    String,
    /// `'` immediately followed by a single ASCII letter naming a mark.
    Mark,
}

/// A span of the input line together with its classification.
///
/// Token offsets produced by a single lexer run are monotone
/// non-decreasing, and a token always denotes a contiguous slice of the
/// input: there is no copying during lexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Token classification for parser decision making.
    pub kind: TokenKind,
    /// Byte offset of the first byte of the token within the original line.
    pub start: usize,
    /// Length of the token in bytes.
    pub len: usize,
}

impl Token {
    /// Construct a token spanning `[start, start + len)`.
    pub fn new(kind: TokenKind, start: usize, len: usize) -> Self {
        Token { kind, start, len }
    }

    /// Exclusive end offset of the token.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Ordered sequence of tokens plus a non-destructive read cursor.
///
/// Retains the original raw line so callers (mainly error reporting) can
/// slice token text or render a caret under an offset without threading the
/// line through every parser function separately. `tokens` is a [`Cow`] so a
/// production lexer can hand back a slice allocated out of a per-invocation
/// arena without copying, while tests and other standalone callers can still
/// build one from a plain `Vec`.
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    line: &'a str,
    tokens: std::borrow::Cow<'a, [Token]>,
    pos: usize,
}

impl<'a> TokenStream<'a> {
    /// Wrap a token list produced by lexing `line`.
    pub fn new(line: &'a str, tokens: Vec<Token>) -> Self {
        TokenStream {
            line,
            tokens: std::borrow::Cow::Owned(tokens),
            pos: 0,
        }
    }

    /// Wrap a token slice already allocated elsewhere (e.g. out of a
    /// [`samed_arena::Arena`]) rather than an owned `Vec`.
    pub fn from_slice(line: &'a str, tokens: &'a [Token]) -> Self {
        TokenStream {
            line,
            tokens: std::borrow::Cow::Borrowed(tokens),
            pos: 0,
        }
    }

    /// The original command line the tokens were lexed from.
    pub fn line(&self) -> &'a str {
        self.line
    }

    /// Slice of `line` denoted by `token`.
    pub fn text(&self, token: Token) -> &'a str {
        &self.line[token.start..token.end()]
    }

    /// Number of tokens not yet consumed.
    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    /// True once every token has been popped.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Look at the next token without advancing the cursor.
    pub fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    /// Look `n` tokens ahead (`n == 0` is equivalent to [`peek`](Self::peek)).
    pub fn peek_n(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).copied()
    }

    /// Consume and return the next token.
    pub fn pop(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Consume the next token only if `f` accepts it; rewinds otherwise.
    pub fn pop_if(&mut self, f: impl FnOnce(Token) -> bool) -> Option<Token> {
        match self.peek() {
            Some(tok) if f(tok) => {
                self.pos += 1;
                Some(tok)
            }
            _ => None,
        }
    }

    /// Byte offset one past the last consumed token, or the line length at
    /// end of input. Used to anchor error captions when the stream is
    /// exhausted.
    pub fn cursor_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.start)
            .unwrap_or(self.line.len())
    }

    /// Join the text of consecutive tokens starting at the cursor while `f`
    /// accepts each token, stopping at the first rejection, end of input, or
    /// a gap in the byte spans (whitespace was lexed away between them).
    /// Returns the joined text and advances the cursor past the tokens
    /// consumed. Used to reassemble a command name split across multiple
    /// `String`/`Delimiter` tokens (e.g. `cd` or `wq`).
    pub fn join_while(&mut self, mut f: impl FnMut(Token) -> bool) -> Option<&'a str> {
        let start_pos = self.pos;
        let mut end = None;
        while let Some(tok) = self.peek() {
            if let Some(prev_end) = end {
                if tok.start != prev_end {
                    break;
                }
            }
            if !f(tok) {
                break;
            }
            end = Some(tok.end());
            self.pos += 1;
        }
        let start_tok = self.tokens.get(start_pos)?;
        let end = end?;
        Some(&self.line[start_tok.start..end])
    }

    /// Advance the cursor past every token that starts before `offset`.
    /// Used after a parser has scanned raw line text directly (escape
    /// processing for `TEXT`/`SHELL`/`ARGV` arguments bypasses tokens
    /// entirely) to resynchronize the token cursor with the bytes consumed.
    pub fn skip_to(&mut self, offset: usize) {
        while let Some(tok) = self.peek() {
            if tok.start < offset {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Validate that group tokens are balanced and no `Invalid` token
    /// appears, without consuming the cursor.
    pub fn validate(&self) -> bool {
        let mut depth = 0i32;
        for tok in self.tokens.iter() {
            match tok.kind {
                TokenKind::Invalid => return false,
                TokenKind::GroupStart => depth += 1,
                TokenKind::GroupEnd => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            }
        }
        depth == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, start: usize, len: usize) -> Token {
        Token::new(kind, start, len)
    }

    #[test]
    fn peek_does_not_advance() {
        let toks = vec![tok(TokenKind::Number, 0, 1)];
        let stream = TokenStream::new("5", toks);
        assert_eq!(stream.peek(), stream.peek());
        assert_eq!(stream.remaining(), 1);
    }

    #[test]
    fn pop_advances_cursor() {
        let toks = vec![tok(TokenKind::Number, 0, 1), tok(TokenKind::Delimiter, 1, 1)];
        let mut stream = TokenStream::new("5,", toks);
        let first = stream.pop().unwrap();
        assert_eq!(first.kind, TokenKind::Number);
        assert_eq!(stream.remaining(), 1);
        let second = stream.pop().unwrap();
        assert_eq!(second.kind, TokenKind::Delimiter);
        assert!(stream.at_end());
    }

    #[test]
    fn text_slices_original_line() {
        let toks = vec![tok(TokenKind::String, 0, 2)];
        let stream = TokenStream::new("wq extra", toks);
        assert_eq!(stream.text(stream.peek().unwrap()), "wq");
    }

    #[test]
    fn validate_rejects_unbalanced_groups() {
        let toks = vec![tok(TokenKind::GroupStart, 0, 1)];
        let stream = TokenStream::new("{", toks);
        assert!(!stream.validate());
    }

    #[test]
    fn validate_rejects_invalid_token() {
        let toks = vec![tok(TokenKind::Invalid, 0, 1)];
        let stream = TokenStream::new("\x01", toks);
        assert!(!stream.validate());
    }

    #[test]
    fn validate_accepts_balanced_groups() {
        let toks = vec![
            tok(TokenKind::GroupStart, 0, 1),
            tok(TokenKind::String, 1, 1),
            tok(TokenKind::GroupEnd, 2, 1),
        ];
        let stream = TokenStream::new("{a}", toks);
        assert!(stream.validate());
    }

    #[test]
    fn skip_to_resyncs_cursor_past_raw_scanned_bytes() {
        let toks = vec![
            tok(TokenKind::Delimiter, 0, 1),
            tok(TokenKind::String, 1, 3),
            tok(TokenKind::Delimiter, 4, 1),
        ];
        let mut stream = TokenStream::new("/abc/", toks);
        stream.skip_to(5);
        assert!(stream.at_end());
    }

    #[test]
    fn join_while_stops_at_gap() {
        let toks = vec![tok(TokenKind::String, 0, 1), tok(TokenKind::String, 2, 1)];
        let mut stream = TokenStream::new("a b", toks);
        let joined = stream.join_while(|_| true);
        assert_eq!(joined, Some("a"));
        assert_eq!(stream.remaining(), 1);
    }
}
