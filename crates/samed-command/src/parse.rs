//! Command argument parser.
//!
//! After an [`Address`](samed_address::Address) has been read, the command
//! name is looked up in the [`Registry`] and its flags drive consumption of
//! the remaining arguments in a fixed order: `FORCE`, `TEXT`, `SHELL`,
//! `COUNT`, `REGEX`, `CMD`, `ARGV`. `TEXT`, `SHELL`, and `ARGV` scan the raw
//! line directly rather than through tokens, since none of the lexer's
//! generic rules know about backslash escapes or shell quoting; each such
//! scan calls [`TokenStream::skip_to`] afterward to resynchronize the
//! cursor.

use crate::flags::CommandFlags;
use crate::registry::Registry;
use crate::tree::{CommandTree, NodeId};
use samed_error::{ErrorKind, ErrorLog};
use samed_token::{Token, TokenKind, TokenStream};

/// Regex and shell state threaded across an entire top-level command line so
/// `REGEX_DEFAULT` and bare `SHELL` arguments can reuse the last one used.
#[derive(Debug, Clone, Default)]
pub struct ParseState {
    /// Most recently compiled regex, for `REGEX_DEFAULT` commands given an
    /// empty pattern (e.g. a bare `//`).
    pub last_regex: Option<regex::Regex>,
    /// Most recently used shell command, for a bare `|` with nothing after
    /// it.
    pub last_shell: Option<String>,
}

/// Parse one command (and, if its flags call for it, a nested command)
/// starting at the stream's cursor, pushing nodes into `tree`.
///
/// Returns `None` and appends to `errors` if the command name is missing,
/// unknown, or ambiguous; a partially built node from a failed argument is
/// still left in `tree` but not linked to anything, matching the log-and-
/// continue error model used everywhere else in this crate.
pub fn parse_command<H: Copy>(
    stream: &mut TokenStream<'_>,
    registry: &Registry<H>,
    tree: &mut CommandTree<H>,
    state: &mut ParseState,
    errors: &mut ErrorLog,
) -> Option<NodeId> {
    let name_start = stream.cursor_offset();
    let name = parse_command_name(stream)?;
    if name.is_empty() {
        errors.push(ErrorKind::Command, name_start);
        return None;
    }
    let def = match registry.lookup(name) {
        Some(def) => *def,
        None => {
            errors.push_detail(ErrorKind::Command, name_start, name.to_string());
            return None;
        }
    };
    let flags = def.flags;
    let id = tree.push_command(def);

    if flags.contains(CommandFlags::FORCE) {
        let has_bang = stream
            .peek()
            .map(|t| t.kind == TokenKind::Delimiter && stream.text(t) == "!")
            .unwrap_or(false);
        if has_bang {
            stream.pop();
            tree.get_mut(id).force = true;
        }
    }

    if flags.contains(CommandFlags::TEXT) {
        if let Some((count, text)) = parse_text_arg(stream, errors) {
            let node = tree.get_mut(id);
            node.count = crate::count::Count::exactly(count);
            node.text = Some(text);
        }
    }

    if flags.contains(CommandFlags::SHELL) {
        match parse_shell_arg(stream, state) {
            Some(shell) => tree.get_mut(id).shell = Some(shell),
            None => errors.push(ErrorKind::Shell, name_start),
        }
    }

    if flags.contains(CommandFlags::COUNT) {
        if let Some(count) = parse_count_arg(stream, errors) {
            tree.get_mut(id).count = count;
        }
    }

    if flags.contains(CommandFlags::REGEX) {
        if let Some(re) = parse_regex_arg(stream, errors, flags.contains(CommandFlags::REGEX_DEFAULT), state) {
            state.last_regex = Some(re.clone());
            tree.get_mut(id).regex = Some(re);
        }
    }

    if flags.contains(CommandFlags::CMD) {
        match parse_command(stream, registry, tree, state, errors) {
            Some(child) => tree.get_mut(id).child = Some(child),
            None => errors.push(ErrorKind::Command, stream.cursor_offset()),
        }
    }

    if flags.contains(CommandFlags::ARGV) {
        tree.get_mut(id).argv = parse_argv(stream);
    }

    Some(id)
}

/// Parse one `{…}` group: a `GroupStart` has already been matched by the
/// caller, an address then zero or more sibling commands follow, terminated
/// by a matching `GroupEnd`.
pub fn parse_group<H: Copy>(
    stream: &mut TokenStream<'_>,
    registry: &Registry<H>,
    tree: &mut CommandTree<H>,
    state: &mut ParseState,
    errors: &mut ErrorLog,
) -> NodeId {
    let group = tree.push_group();
    let mut prev: Option<NodeId> = None;
    loop {
        match stream.peek() {
            None => {
                errors.push(ErrorKind::UnmatchedBrace, stream.cursor_offset());
                break;
            }
            Some(t) if t.kind == TokenKind::GroupEnd => {
                stream.pop();
                break;
            }
            _ => {}
        }
        let address = samed_address::parse_address(stream, errors);
        let command_id = match stream.peek() {
            Some(t) if t.kind == TokenKind::GroupStart => {
                stream.pop();
                Some(parse_group(stream, registry, tree, state, errors))
            }
            _ => parse_command(stream, registry, tree, state, errors),
        };
        let Some(command_id) = command_id else { continue };
        tree.get_mut(command_id).address = address;
        match prev {
            Some(p) => tree.get_mut(p).next = Some(command_id),
            None => tree.get_mut(group).child = Some(command_id),
        }
        prev = Some(command_id);
    }
    group
}

fn parse_command_name<'a>(stream: &mut TokenStream<'a>) -> Option<&'a str> {
    match stream.peek() {
        Some(tok) if tok.kind == TokenKind::String && matches!(stream.text(tok), ">" | "<" | "|") => {
            stream.pop();
            Some(stream.text(tok))
        }
        Some(tok) if tok.kind == TokenKind::Delimiter && stream.text(tok) == "!" => {
            stream.pop();
            Some("!")
        }
        _ => stream.join_while(|t| matches!(t.kind, TokenKind::String | TokenKind::Number)),
    }
}

/// Scan `[start, end)` of the raw line for the first unescaped occurrence of
/// `delim`, returning the raw (still-escaped) span between `start` and the
/// delimiter, and the offset just past the delimiter. Shared by `TEXT` and
/// `REGEX` argument scanning, both of which use the same `\<char>` escaping.
fn scan_delimited(line: &str, start: usize, delim: u8) -> Option<(&str, usize)> {
    let bytes = line.as_bytes();
    let mut i = start;
    loop {
        if i >= bytes.len() {
            return None;
        }
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            i += 2;
            continue;
        }
        if bytes[i] == delim {
            return Some((&line[start..i], i + 1));
        }
        i += 1;
    }
}

fn unescape(raw: &str, delim: u8) -> String {
    let delim_char = delim as char;
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(d) if d == delim_char => out.push(d),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn parse_text_arg(stream: &mut TokenStream<'_>, errors: &mut ErrorLog) -> Option<(i64, String)> {
    let count: i64 = stream
        .pop_if(|t| t.kind == TokenKind::Number)
        .map(|t| stream.text(t).parse().unwrap_or(1))
        .unwrap_or(1)
        .max(1);
    let open = stream.peek().filter(|t| t.kind == TokenKind::Delimiter)?;
    let delim = stream.text(open).as_bytes()[0];
    let line = stream.line();
    match scan_delimited(line, open.start + 1, delim) {
        Some((raw, end)) => {
            stream.skip_to(end);
            Some((count, unescape(raw, delim)))
        }
        None => {
            errors.push(ErrorKind::Text, open.start);
            None
        }
    }
}

fn parse_regex_arg(
    stream: &mut TokenStream<'_>,
    errors: &mut ErrorLog,
    reuse_default: bool,
    state: &ParseState,
) -> Option<regex::Regex> {
    let open = match stream.peek().filter(|t| t.kind == TokenKind::Delimiter) {
        Some(t) => t,
        None => {
            return if reuse_default {
                state.last_regex.clone()
            } else {
                errors.push(ErrorKind::Regex, stream.cursor_offset());
                None
            };
        }
    };
    let delim = stream.text(open).as_bytes()[0];
    let line = stream.line();
    let (raw, end) = match scan_delimited(line, open.start + 1, delim) {
        Some(span) => span,
        None => {
            errors.push(ErrorKind::Regex, open.start);
            return None;
        }
    };
    stream.skip_to(end);
    if raw.is_empty() && reuse_default {
        return state.last_regex.clone();
    }
    match regex::Regex::new(raw) {
        Ok(re) => Some(re),
        Err(_) => {
            errors.push(ErrorKind::Regex, open.start);
            None
        }
    }
}

fn parse_shell_arg(stream: &mut TokenStream<'_>, state: &ParseState) -> Option<String> {
    let start = stream.cursor_offset();
    let rest = stream.line()[start..].trim();
    stream.skip_to(stream.line().len());
    if rest.is_empty() {
        state.last_shell.clone()
    } else {
        Some(rest.to_string())
    }
}

fn parse_count_arg(stream: &mut TokenStream<'_>, errors: &mut ErrorLog) -> Option<crate::count::Count> {
    let pct_matches = stream
        .peek()
        .map(|t| t.kind == TokenKind::Delimiter && stream.text(t) == "%")
        .unwrap_or(false);
    if let Some(pct) = pct_matches.then(|| stream.pop()).flatten() {
        return match stream.pop_if(|t| t.kind == TokenKind::Number) {
            Some(n) => Some(crate::count::Count::modulo(stream.text(n).parse().unwrap_or(1))),
            None => {
                errors.push(ErrorKind::Count, pct.start);
                None
            }
        };
    }
    let n_tok = stream.pop_if(|t| t.kind == TokenKind::Number)?;
    let start: i64 = stream.text(n_tok).parse().unwrap_or(0);
    let default_end = if start != 0 { i64::MAX } else { 0 };
    let comma_matches = stream
        .peek()
        .map(|t| t.kind == TokenKind::Delimiter && stream.text(t) == ",")
        .unwrap_or(false);
    if comma_matches {
        stream.pop();
    }
    let end = stream
        .pop_if(|t| t.kind == TokenKind::Number)
        .map(|m: Token| stream.text(m).parse().unwrap_or(default_end))
        .unwrap_or(default_end);
    Some(crate::count::Count {
        start,
        end,
        is_mod: false,
    })
}

fn parse_argv(stream: &mut TokenStream<'_>) -> Vec<String> {
    let start = stream.cursor_offset();
    let rest = &stream.line()[start..];
    stream.skip_to(stream.line().len());
    split_argv(rest)
}

fn split_argv(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_word = false;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            if in_word {
                out.push(std::mem::take(&mut cur));
                in_word = false;
            }
        } else if c == '"' || c == '\'' {
            in_word = true;
            for c2 in chars.by_ref() {
                if c2 == c {
                    break;
                }
                cur.push(c2);
            }
        } else {
            in_word = true;
            cur.push(c);
        }
    }
    if in_word {
        out.push(cur);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::CommandDef;
    use samed_lexer::lex;

    type Handler = fn();
    fn noop() {}

    static BUILTINS: &[CommandDef<Handler>] = &[
        CommandDef::new("delete", "delete", CommandFlags::DESTRUCTIVE, noop as Handler),
        CommandDef::new(
            "insert",
            "insert",
            CommandFlags::TEXT.union(CommandFlags::DESTRUCTIVE),
            noop as Handler,
        ),
        CommandDef::new(
            "substitute",
            "substitute",
            CommandFlags::REGEX
                .union(CommandFlags::REGEX_DEFAULT)
                .union(CommandFlags::TEXT)
                .union(CommandFlags::DESTRUCTIVE),
            noop as Handler,
        ),
        CommandDef::new(
            "x",
            "loop",
            CommandFlags::REGEX
                .union(CommandFlags::REGEX_DEFAULT)
                .union(CommandFlags::CMD)
                .union(CommandFlags::LOOP),
            noop as Handler,
        ),
        CommandDef::new(
            "write",
            "write",
            CommandFlags::ARGV.union(CommandFlags::FORCE),
            noop as Handler,
        ),
        CommandDef::new("pipe_out", "pipe", CommandFlags::SHELL, noop as Handler),
    ];

    fn registry() -> Registry<Handler> {
        Registry::new(BUILTINS)
    }

    fn parse(line: &str) -> (CommandTree<Handler>, ErrorLog, Option<NodeId>) {
        let mut stream = lex(line);
        let reg = registry();
        let mut tree = CommandTree::new();
        let mut state = ParseState::default();
        let mut errors = ErrorLog::new();
        let id = parse_command(&mut stream, &reg, &mut tree, &mut state, &mut errors);
        (tree, errors, id)
    }

    #[test]
    fn text_argument_with_escaped_delimiter_and_count() {
        let (tree, errors, id) = parse(r"3/foo\/bar/");
        assert!(errors.is_empty());
        let node = tree.get(id.unwrap());
        assert_eq!(node.text.as_deref(), Some("foo/bar"));
        assert_eq!(node.count.start, 3);
        assert_eq!(node.count.end, 3);
    }

    #[test]
    fn unterminated_text_logs_error() {
        let (_, errors, id) = parse("/unterminated");
        assert!(id.is_none());
        assert_eq!(errors.first().unwrap().kind, ErrorKind::Text);
    }

    #[test]
    fn substitute_reuses_last_regex_on_empty_pattern() {
        let mut stream = lex("//baz/");
        let reg = registry();
        let mut tree = CommandTree::new();
        let mut state = ParseState {
            last_regex: Some(regex::Regex::new("abc").unwrap()),
            last_shell: None,
        };
        let mut errors = ErrorLog::new();
        let id = parse_command(&mut stream, &reg, &mut tree, &mut state, &mut errors).unwrap();
        assert!(errors.is_empty());
        assert_eq!(tree.get(id).regex.as_ref().unwrap().as_str(), "abc");
        assert_eq!(tree.get(id).text.as_deref(), Some("baz"));
    }

    #[test]
    fn nested_cmd_argument_builds_a_child_node() {
        let (tree, errors, id) = parse("x/foo/ delete");
        assert!(errors.is_empty());
        let node = tree.get(id.unwrap());
        let child = tree.get(node.child.unwrap());
        assert_eq!(child.def().unwrap().name, "delete");
    }

    #[test]
    fn argv_splits_on_whitespace_and_respects_quotes() {
        let (tree, errors, id) = parse(r#"write "my file.txt" other"#);
        assert!(errors.is_empty());
        let node = tree.get(id.unwrap());
        assert_eq!(node.argv, vec!["my file.txt".to_string(), "other".to_string()]);
    }

    #[test]
    fn force_bang_is_consumed_before_argv() {
        let (tree, errors, id) = parse("write! out.txt");
        assert!(errors.is_empty());
        let node = tree.get(id.unwrap());
        assert!(node.force);
        assert_eq!(node.argv, vec!["out.txt".to_string()]);
    }

    #[test]
    fn shell_argument_takes_rest_of_line_verbatim() {
        let (tree, errors, id) = parse("pipe_out sort -u | uniq");
        assert!(errors.is_empty());
        let node = tree.get(id.unwrap());
        assert_eq!(node.shell.as_deref(), Some("sort -u | uniq"));
    }

    #[test]
    fn unknown_command_name_is_reported_with_detail() {
        let (_, errors, id) = parse("zzz");
        assert!(id.is_none());
        let err = errors.first().unwrap();
        assert_eq!(err.kind, ErrorKind::Command);
        assert_eq!(err.detail.as_deref(), Some("zzz"));
    }
}
