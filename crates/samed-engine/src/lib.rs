//! Executor and command handlers: the part of the engine that actually runs
//! a parsed command tree.
//!
//! `samed-lexer`/`samed-token` tokenize a line, `samed-address` evaluates
//! addresses, and `samed-command` parses a line into a [`CommandTree`] —
//! none of those crates know anything about a real editor. This crate is
//! where that knowledge lives: [`collab`] declares the traits a host editor
//! implements, [`executor`] fans a parsed tree out over a window's
//! selections and dispatches to [`handlers`], and [`sam_cmd`] wires the
//! whole pipeline — lex, parse address, parse command, execute, apply —
//! behind one entry point.

#![warn(missing_docs)]

pub mod collab;
pub mod executor;
pub mod handlers;
pub mod set;

pub use collab::{Options, Process, ProcessOutput, Registers, Text, Ui, Window};
pub use executor::{run_line, HandlerFn, LeafArgs};
pub use set::{resolve as resolve_option, OptionDef, OptionKind, OptionValue};

use samed_arena::Arena;
use samed_command::{CommandTree, ParseState, Registry};
use samed_error::ErrorLog;
use samed_transcript::Transcript;

/// Everything carried across the lifetime of one editor session: the
/// command registry (built once, mutable for `:command`-style
/// user-registration), the regex/shell state threaded across lines, and the
/// scratch arena a line's tokens are lexed into.
pub struct Engine<C>
where
    C: Text + Window + Registers + Process + Ui + Options,
{
    registry: Registry<HandlerFn<C>>,
    state: ParseState,
    arena: Arena,
}

impl<C> Engine<C>
where
    C: Text + Window + Registers + Process + Ui + Options,
{
    /// A fresh engine over the builtin command table.
    pub fn new() -> Self {
        Engine {
            registry: Registry::new(handlers::builtins::<C>()),
            state: ParseState::default(),
            arena: Arena::new(),
        }
    }

    /// The command registry, for registering user commands or `help`.
    pub fn registry(&self) -> &Registry<HandlerFn<C>> {
        &self.registry
    }

    /// Mutable access to the command registry.
    pub fn registry_mut(&mut self) -> &mut Registry<HandlerFn<C>> {
        &mut self.registry
    }

    /// Parse and run one sam command line against `collab`, returning the
    /// diagnostics produced (empty on success) and the transcript of
    /// enqueued changes. The caller is responsible for calling
    /// [`apply_to_window`] on the result before running another line, since
    /// later lines should see the post-apply state.
    pub fn sam_cmd(&mut self, collab: &mut C, line: &str) -> (ErrorLog, Transcript) {
        let mut errors = ErrorLog::new();
        let mut transcript = Transcript::new();
        self.arena.reset();
        let mut stream = samed_lexer::lex_into(line, &self.arena);
        let mut tree = CommandTree::new();
        let root = samed_command::parse_line(&mut stream, &self.registry, &mut tree, &mut self.state, &mut errors);
        if let Some(root) = root {
            if errors.is_empty() {
                run_line(collab, &mut tree, root, &mut transcript, &mut errors);
            }
        }
        (errors, transcript)
    }
}

impl<C> Default for Engine<C>
where
    C: Text + Window + Registers + Process + Ui + Options,
{
    fn default() -> Self {
        Engine::new()
    }
}

/// Apply `transcript` to `collab`, re-anchoring its own selections.
///
/// This reimplements [`samed_transcript::Transcript::apply`]'s delta/reanchor
/// loop rather than calling it, because that method takes its text buffer
/// and selection sink as two independently-mutable parameters — appropriate
/// when they really are separate objects, but `collab` here plays both
/// roles, and Rust cannot hand out two live `&mut` borrows of the same value
/// to satisfy two generic parameters in one call. Sequential `&mut self`
/// calls on one object carry no such restriction.
pub fn apply_to_window<C: Text + Window>(collab: &mut C, transcript: &Transcript) -> bool {
    if transcript.error {
        return false;
    }
    let mut delta: i64 = 0;
    for change in transcript.changes() {
        let start = (change.range[0] as i64 + delta).max(0) as usize;
        let end = (change.range[1] as i64 + delta).max(0) as usize;
        match change.kind {
            samed_transcript::ChangeKind::Delete => {
                collab.apply_delete([start, end]);
            }
            samed_transcript::ChangeKind::Insert => {
                let data = change.data.as_deref().unwrap_or("");
                collab.apply_insert(start, data, change.count);
            }
            samed_transcript::ChangeKind::Change => {
                collab.apply_delete([start, end]);
                let data = change.data.as_deref().unwrap_or("");
                collab.apply_insert(start, data, change.count);
            }
        }
        reanchor(collab, change, start);
        delta += change_delta(change);
    }
    true
}

fn reanchor<C: Window>(collab: &mut C, change: &samed_transcript::Change, start: usize) {
    let Some(selection) = change.selection else { return };
    let visual = collab.is_visual_mode();
    match change.kind {
        samed_transcript::ChangeKind::Delete => {
            if visual {
                collab.dispose_selection(selection);
            } else {
                collab.move_cursor(selection, start);
            }
        }
        samed_transcript::ChangeKind::Insert | samed_transcript::ChangeKind::Change => {
            let data = change.data.as_deref().unwrap_or("");
            let inserted_len = change.len * change.count.max(0) as usize;
            let range = [start, start + inserted_len];
            if visual {
                collab.anchor_range(selection, range);
            } else if data.contains('\n') {
                collab.move_cursor(selection, range[0]);
            } else {
                collab.move_cursor(selection, range[1]);
            }
        }
    }
}

fn change_delta(change: &samed_transcript::Change) -> i64 {
    let inserted = match change.kind {
        samed_transcript::ChangeKind::Insert | samed_transcript::ChangeKind::Change => change.len as i64 * change.count,
        samed_transcript::ChangeKind::Delete => 0,
    };
    let deleted = match change.kind {
        samed_transcript::ChangeKind::Delete | samed_transcript::ChangeKind::Change => (change.range[1] - change.range[0]) as i64,
        samed_transcript::ChangeKind::Insert => 0,
    };
    inserted - deleted
}
