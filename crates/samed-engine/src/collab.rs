//! Collaborator traits: the editor-provided surfaces this crate's executor
//! and handlers operate through. Every concern the core command engine does
//! not own — the text buffer's storage, rendering, key dispatch, the regex
//! engine's own internals, subprocess plumbing, terminal capabilities — is
//! reached only through one of these traits.
//!
//! Handler functions and the executor are generic over a single type
//! parameter bound by all six traits (`C: Text + Window + Registers +
//! Process + Ui + Options`) rather than taking `dyn` trait objects, so a
//! concrete editor need only implement them once on its window type; no
//! vtables, no supertrait-object upcasting concerns.

use crate::set::{OptionDef, OptionValue};
use samed_address::{MarkSource, TextSource};
use samed_transcript::MutableText;

/// Read/write access to one file's text, plus mark resolution for address
/// evaluation. Mutation here is restricted to the transcript-apply phase —
/// handlers must never call [`MutableText`]'s methods directly, only enqueue
/// [`samed_transcript::Change`]s.
pub trait Text: TextSource + MutableText + MarkSource {
    /// Borrow the text in `range` (already resolved to buffer-local bytes).
    fn slice(&self, range: [usize; 2]) -> &str;

    /// Write `range` (or the whole file, if `range` covers it) to `path`, or
    /// to the file's current name if `path` is `None`. `force` bypasses the
    /// overwrite/time-skew check a real collaborator would otherwise apply.
    fn save(&mut self, path: Option<&str>, range: [usize; 2], force: bool) -> Result<(), String>;

    /// Read a file's contents for `r`.
    fn read_file(&self, path: &str) -> Result<String, String>;
}

/// One window: its selections, visual/normal mode, and the window list it
/// belongs to (needed by `X`/`Y`, `e`, `q`, and the editor commands).
pub trait Window {
    /// The range addresses default to when a side is `.`.
    fn current_range(&self) -> [usize; 2];
    /// Number of selections (cursors) in this window.
    fn selection_count(&self) -> usize;
    /// The range of selection `n`.
    fn selection_range(&self, selection: usize) -> [usize; 2];
    /// Replace selection `n`'s range and mark it anchored.
    fn anchor_range(&mut self, selection: usize, range: [usize; 2]);
    /// Collapse selection `n` to a single cursor position.
    fn move_cursor(&mut self, selection: usize, at: usize);
    /// Drop selection `n` entirely.
    fn dispose_selection(&mut self, selection: usize);
    /// True while any selection is anchored (visual mode).
    fn is_visual_mode(&self) -> bool;

    /// The file this window displays, if backed by one.
    fn file_name(&self) -> Option<&str>;
    /// True if the buffer has unsaved changes.
    fn is_modified(&self) -> bool;
    /// Set the modified flag (cleared after a successful save).
    fn set_modified(&mut self, modified: bool);

    /// Number of open windows, including this one.
    fn window_count(&self) -> usize;
    /// The file name backing window `n`, for `X`/`Y` pattern matching.
    fn window_file_name(&self, window: usize) -> Option<&str>;

    /// Close this window; `force` bypasses the unsaved-changes check.
    /// Returns `false` (and leaves the window open) if modified and not
    /// forced.
    fn close_current(&mut self, force: bool) -> bool;
    /// Open `file` in place of this window's buffer; `force` bypasses the
    /// unsaved-changes check on the window being replaced.
    fn open(&mut self, file: &str, force: bool) -> Result<(), String>;
    /// Split the current window (`vertical` selects `vsplit`/`vnew` over
    /// `split`/`new`); `file` names the buffer to open in the new window,
    /// or `None` to duplicate the current one.
    fn split(&mut self, file: Option<&str>, vertical: bool) -> Result<(), String>;
}

/// Sibling registers `$0..$9`, populated by `x`/`y` from regex captures.
pub trait Registers {
    /// Set register `index` (`0` is the whole match, `1..=9` capture
    /// groups).
    fn set_register(&mut self, index: usize, value: &str);
}

/// Result of a subprocess run through the `Process` collaborator.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Process exit code.
    pub exit_code: i32,
}

/// Subprocess piping for `>`, `<`, `|`, `!`.
pub trait Process {
    /// Run `shell` through the user's shell, feeding it `stdin` if given,
    /// and capturing stdout. Implementations should poll
    /// [`Ui::is_interrupted`] while the child runs and terminate it early if
    /// set.
    fn run(&mut self, shell: &str, stdin: Option<&str>) -> Result<ProcessOutput, String>;
}

/// Everything else: interrupt flag, mode switches, status line, working
/// directory, and process exit.
pub trait Ui {
    /// True if the user pressed the interrupt key during the last
    /// [`Process::run`] call.
    fn is_interrupted(&self) -> bool;
    /// Enter visual mode (a selection remains anchored after apply).
    fn set_mode_visual(&mut self);
    /// Enter normal mode (selections collapse to cursors after apply).
    fn set_mode_normal(&mut self);
    /// Show a one-line status/info message.
    fn info_show(&mut self, message: &str);
    /// Change the process working directory.
    fn set_cwd(&mut self, dir: &str) -> Result<(), String>;
    /// The user's home directory, `cd`'s default target.
    fn home_dir(&self) -> String;
    /// Exit the process with `code` once no windows remain.
    fn quit(&mut self, code: i32);
}

/// The `set` command's backing store: a table of known options plus
/// get/set access to their current values.
pub trait Options {
    /// The known option table, for name resolution.
    fn option_table(&self) -> &[OptionDef];
    /// The current value of `name`, if set.
    fn option_value(&self, name: &str) -> Option<OptionValue>;
    /// Store a new value for `name`.
    fn set_option(&mut self, name: &str, value: OptionValue);
}
