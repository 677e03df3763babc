//! Error kinds and a caret-annotated error log shared by every stage of the
//! command engine.
//!
//! Errors here are data, not control flow (spec'd behavior: the parser
//! appends to this log with a visual caret; the executor observes the log
//! and may set `should_exit`, but keeps returning normally so outer state
//! can be flushed). `Result` is reserved for collaborator I/O that the
//! caller cannot recover from inline (see `samed-engine::collab`).

#![warn(missing_docs)]

use std::fmt;

/// Classification of an engine error, matching the kinds enumerated by the
/// command grammar's external interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No error; placeholder for a clean transcript/log slot.
    Ok,
    /// Allocation failure in an arena.
    Memory,
    /// Malformed address expression.
    Address,
    /// A command required an address but none was given.
    NoAddress,
    /// `{`/`}` counts did not balance.
    UnmatchedBrace,
    /// A regular expression failed to compile.
    Regex,
    /// A delimited text argument was malformed (unterminated, bad escape).
    Text,
    /// A shell command argument was malformed or empty with no prior command.
    Shell,
    /// Unknown command name after registry lookup.
    Command,
    /// A command handler reported failure while executing.
    Execute,
    /// Unexpected embedded newline where a single line was required.
    Newline,
    /// Unknown or malformed mark reference.
    Mark,
    /// Two changes enqueued by this invocation overlap.
    Conflict,
    /// A write would silently discard a concurrent on-disk change.
    WriteConflict,
    /// A destructive command was used after a loop-class command.
    LoopInvalidCmd,
    /// A command not valid inside a `{…}` group was used there.
    GroupInvalidCmd,
    /// A `COUNT` argument was out of the command's accepted range.
    Count,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ErrorKind::Ok => "ok",
            ErrorKind::Memory => "out of memory",
            ErrorKind::Address => "bad address",
            ErrorKind::NoAddress => "no address",
            ErrorKind::UnmatchedBrace => "unmatched brace",
            ErrorKind::Regex => "bad regular expression",
            ErrorKind::Text => "bad text argument",
            ErrorKind::Shell => "bad shell command",
            ErrorKind::Command => "unknown command",
            ErrorKind::Execute => "command failed",
            ErrorKind::Newline => "unexpected newline",
            ErrorKind::Mark => "bad mark",
            ErrorKind::Conflict => "conflicting changes",
            ErrorKind::WriteConflict => "file changed on disk",
            ErrorKind::LoopInvalidCmd => "destructive command in looping construct",
            ErrorKind::GroupInvalidCmd => "command invalid inside group",
            ErrorKind::Count => "count out of range",
        };
        f.write_str(msg)
    }
}

/// A single diagnostic: a kind, the byte offset it points at, and an
/// optional free-form detail (e.g. the specific unknown command name).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{kind} at byte {offset}{}", detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default())]
pub struct EngineError {
    /// What kind of error this is.
    pub kind: ErrorKind,
    /// Byte offset into the command line the error points at.
    pub offset: usize,
    /// Optional free-form detail appended to the rendered message.
    pub detail: Option<String>,
}

impl EngineError {
    /// Construct an error with no extra detail.
    pub fn new(kind: ErrorKind, offset: usize) -> Self {
        EngineError {
            kind,
            offset,
            detail: None,
        }
    }

    /// Construct an error carrying a free-form detail string.
    pub fn with_detail(kind: ErrorKind, offset: usize, detail: impl Into<String>) -> Self {
        EngineError {
            kind,
            offset,
            detail: Some(detail.into()),
        }
    }

    /// Render the offending line with a `^` caret under [`Self::offset`].
    pub fn caret(&self, line: &str) -> String {
        let offset = self.offset.min(line.len());
        let mut caret_line = String::with_capacity(offset + 1);
        for ch in line[..offset].chars() {
            caret_line.push(if ch == '\t' { '\t' } else { ' ' });
        }
        caret_line.push('^');
        format!("{line}\n{caret_line} {self}")
    }
}

/// Append-only collection of diagnostics produced while processing one
/// top-level command line.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Vec<EngineError>,
}

impl ErrorLog {
    /// Create an empty log.
    pub fn new() -> Self {
        ErrorLog::default()
    }

    /// Append a diagnostic with no detail.
    pub fn push(&mut self, kind: ErrorKind, offset: usize) {
        self.entries.push(EngineError::new(kind, offset));
    }

    /// Append a diagnostic with a detail string.
    pub fn push_detail(&mut self, kind: ErrorKind, offset: usize, detail: impl Into<String>) {
        self.entries.push(EngineError::with_detail(kind, offset, detail));
    }

    /// True if nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All logged diagnostics in the order they were appended.
    pub fn entries(&self) -> &[EngineError] {
        &self.entries
    }

    /// The first logged diagnostic, if any.
    pub fn first(&self) -> Option<&EngineError> {
        self.entries.first()
    }
}
