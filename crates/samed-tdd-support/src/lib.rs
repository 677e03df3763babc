//! In-memory collaborator fixtures for exercising `samed-engine`'s executor
//! and handlers without a real editor.
//!
//! [`FakeWindow`] implements every trait in `samed_engine::collab` over a
//! plain `String` buffer, a `Vec` of selections, and a couple of `Vec`s
//! standing in for the window list and shell-process queue. It is
//! deliberately not a realistic buffer (no piece table, no line index
//! caching) — its only job is to make the executor's contract with its
//! collaborators checkable.

#![warn(missing_docs)]

use regex::Regex;
use samed_address::{MarkSource, TextSource};
use samed_engine::{Options, OptionDef, OptionValue, Process, ProcessOutput, Registers, Text, Ui, Window};
use samed_transcript::MutableText;
use std::collections::HashMap;

/// One selection: a byte range plus whether it is anchored (visual) or
/// collapsed to a cursor (normal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// The selection's current range.
    pub range: [usize; 2],
    /// True once [`Window::anchor_range`] has been called on it and it has
    /// not since been collapsed by [`Window::move_cursor`].
    pub anchored: bool,
}

/// A scripted response for [`FakeWindow`]'s [`Process`] implementation,
/// consumed in FIFO order by [`Process::run`].
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    /// The exact `stdin` the next [`Process::run`] call is expected to
    /// receive, or `None` to accept anything.
    pub expect_stdin: Option<String>,
    /// The output to return.
    pub output: ProcessOutput,
}

/// An in-memory window over a single file, implementing every
/// `samed_engine::collab` trait.
#[derive(Debug, Clone)]
pub struct FakeWindow {
    text: String,
    selections: Vec<Selection>,
    visual_mode: bool,
    file_name: Option<String>,
    modified: bool,
    marks: HashMap<(u8, usize), usize>,
    registers: HashMap<usize, String>,
    windows: Vec<String>,
    interrupted: bool,
    cwd: String,
    home: String,
    info: Vec<String>,
    exit_code: Option<i32>,
    process_runs: Vec<(String, Option<String>)>,
    scripted: Vec<ScriptedRun>,
    options: Vec<OptionDef>,
    option_values: HashMap<String, OptionValue>,
    saved: Vec<(Option<String>, [usize; 2], bool)>,
    files: HashMap<String, String>,
}

impl FakeWindow {
    /// A window over `text`, with a single cursor at byte `0`.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        FakeWindow {
            text,
            selections: vec![Selection { range: [0, 0], anchored: false }],
            visual_mode: false,
            file_name: None,
            modified: false,
            marks: HashMap::new(),
            registers: HashMap::new(),
            windows: Vec::new(),
            interrupted: false,
            cwd: "/".to_string(),
            home: "/home/user".to_string(),
            info: Vec::new(),
            exit_code: None,
            process_runs: Vec::new(),
            scripted: Vec::new(),
            options: Vec::new(),
            option_values: HashMap::new(),
            saved: Vec::new(),
            files: HashMap::new(),
        }
    }

    /// Current buffer contents.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current selection list.
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Queue a scripted [`Process::run`] response.
    pub fn script_run(&mut self, expect_stdin: Option<&str>, stdout: &str, exit_code: i32) {
        self.scripted.push(ScriptedRun {
            expect_stdin: expect_stdin.map(str::to_string),
            output: ProcessOutput { stdout: stdout.to_string(), exit_code },
        });
    }

    /// Every `(argv, stdin)` pair actually passed to [`Process::run`].
    pub fn process_runs(&self) -> &[(String, Option<String>)] {
        &self.process_runs
    }

    /// Set a mark directly, bypassing the editor command that would
    /// normally create one.
    pub fn set_mark(&mut self, mark: u8, ordinal: usize, at: usize) {
        self.marks.insert((mark, ordinal), at);
    }

    /// Declare the option table this window answers `set` queries against.
    pub fn with_options(mut self, options: Vec<OptionDef>) -> Self {
        self.options = options;
        self
    }

    /// Stage a readable file for `r`/`open`, without touching the real
    /// filesystem.
    pub fn stage_file(&mut self, path: &str, contents: &str) {
        self.files.insert(path.to_string(), contents.to_string());
    }

    /// Every `(path, range, force)` triple passed to [`Text::save`].
    pub fn saves(&self) -> &[(Option<String>, [usize; 2], bool)] {
        &self.saved
    }

    /// True once [`Ui::quit`] has been called.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    fn line_starts(&self) -> Vec<usize> {
        let mut starts = vec![0];
        for (i, _) in self.text.match_indices('\n') {
            starts.push(i + 1);
        }
        starts
    }
}

impl TextSource for FakeWindow {
    fn len(&self) -> usize {
        self.text.len()
    }
    fn line_to_byte(&self, line: usize) -> usize {
        let starts = self.line_starts();
        if line == 0 {
            0
        } else if line - 1 < starts.len() {
            starts[line - 1]
        } else {
            self.text.len()
        }
    }
    fn byte_to_line(&self, byte: usize) -> usize {
        let starts = self.line_starts();
        match starts.binary_search(&byte) {
            Ok(i) => i + 1,
            Err(i) => i,
        }
    }
    fn search_forward(&self, re: &Regex, from: usize) -> Option<[usize; 2]> {
        re.find_at(&self.text, from.min(self.text.len())).map(|m| [m.start(), m.end()])
    }
    fn search_backward(&self, re: &Regex, from: usize) -> Option<[usize; 2]> {
        re.find_iter(&self.text[..from.min(self.text.len())]).last().map(|m| [m.start(), m.end()])
    }
}

impl MarkSource for FakeWindow {
    fn mark(&self, mark: u8, ordinal: usize) -> Option<usize> {
        self.marks.get(&(mark, ordinal)).copied()
    }
}

impl MutableText for FakeWindow {
    fn apply_delete(&mut self, range: [usize; 2]) {
        self.text.replace_range(range[0]..range[1], "");
        self.modified = true;
    }
    fn apply_insert(&mut self, at: usize, data: &str, count: i64) {
        let chunk = data.repeat(count.max(0) as usize);
        self.text.insert_str(at, &chunk);
        self.modified = true;
    }
}

impl Text for FakeWindow {
    fn slice(&self, range: [usize; 2]) -> &str {
        &self.text[range[0]..range[1]]
    }
    fn save(&mut self, path: Option<&str>, range: [usize; 2], force: bool) -> Result<(), String> {
        self.saved.push((path.map(str::to_string), range, force));
        Ok(())
    }
    fn read_file(&self, path: &str) -> Result<String, String> {
        self.files.get(path).cloned().ok_or_else(|| format!("no such file: {path}"))
    }
}

impl Window for FakeWindow {
    fn current_range(&self) -> [usize; 2] {
        self.selections.first().map(|s| s.range).unwrap_or([0, 0])
    }
    fn selection_count(&self) -> usize {
        self.selections.len()
    }
    fn selection_range(&self, selection: usize) -> [usize; 2] {
        self.selections[selection].range
    }
    fn anchor_range(&mut self, selection: usize, range: [usize; 2]) {
        self.selections[selection] = Selection { range, anchored: true };
    }
    fn move_cursor(&mut self, selection: usize, at: usize) {
        self.selections[selection] = Selection { range: [at, at], anchored: false };
    }
    fn dispose_selection(&mut self, selection: usize) {
        if self.selections.len() > 1 {
            self.selections.remove(selection);
        } else {
            self.selections[0] = Selection { range: [0, 0], anchored: false };
        }
    }
    fn is_visual_mode(&self) -> bool {
        self.visual_mode
    }
    fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
    fn is_modified(&self) -> bool {
        self.modified
    }
    fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }
    fn window_count(&self) -> usize {
        1 + self.windows.len()
    }
    fn window_file_name(&self, window: usize) -> Option<&str> {
        if window == 0 {
            self.file_name.as_deref()
        } else {
            self.windows.get(window - 1).map(String::as_str)
        }
    }
    fn close_current(&mut self, force: bool) -> bool {
        if self.modified && !force {
            return false;
        }
        self.modified = false;
        true
    }
    fn open(&mut self, file: &str, force: bool) -> Result<(), String> {
        if self.modified && !force {
            return Err("buffer has unsaved changes".to_string());
        }
        match self.files.get(file) {
            Some(contents) => {
                self.text = contents.clone();
                self.file_name = Some(file.to_string());
                self.modified = false;
                self.selections = vec![Selection { range: [0, 0], anchored: false }];
                Ok(())
            }
            None => Err(format!("no such file: {file}")),
        }
    }
    fn split(&mut self, file: Option<&str>, _vertical: bool) -> Result<(), String> {
        self.windows.push(file.unwrap_or("[No Name]").to_string());
        Ok(())
    }
}

impl Registers for FakeWindow {
    fn set_register(&mut self, index: usize, value: &str) {
        self.registers.insert(index, value.to_string());
    }
}

impl Process for FakeWindow {
    fn run(&mut self, shell: &str, stdin: Option<&str>) -> Result<ProcessOutput, String> {
        self.process_runs.push((shell.to_string(), stdin.map(str::to_string)));
        let next = self.scripted.first();
        if let Some(expected) = next.and_then(|s| s.expect_stdin.as_deref()) {
            if stdin != Some(expected) {
                return Err(format!("unexpected stdin: {stdin:?}"));
            }
        }
        if self.scripted.is_empty() {
            return Ok(ProcessOutput { stdout: String::new(), exit_code: 0 });
        }
        Ok(self.scripted.remove(0).output)
    }
}

impl Ui for FakeWindow {
    fn is_interrupted(&self) -> bool {
        self.interrupted
    }
    fn set_mode_visual(&mut self) {
        self.visual_mode = true;
    }
    fn set_mode_normal(&mut self) {
        self.visual_mode = false;
    }
    fn info_show(&mut self, message: &str) {
        self.info.push(message.to_string());
    }
    fn set_cwd(&mut self, dir: &str) -> Result<(), String> {
        self.cwd = dir.to_string();
        Ok(())
    }
    fn home_dir(&self) -> String {
        self.home.clone()
    }
    fn quit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}

impl Options for FakeWindow {
    fn option_table(&self) -> &[OptionDef] {
        &self.options
    }
    fn option_value(&self, name: &str) -> Option<OptionValue> {
        self.option_values.get(name).cloned()
    }
    fn set_option(&mut self, name: &str, value: OptionValue) {
        self.option_values.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_to_byte_handles_start_and_past_end() {
        let w = FakeWindow::new("alpha\nbeta\ngamma\n");
        assert_eq!(w.line_to_byte(0), 0);
        assert_eq!(w.line_to_byte(1), 0);
        assert_eq!(w.line_to_byte(2), 6);
        assert_eq!(w.line_to_byte(4), w.len());
    }

    #[test]
    fn apply_insert_and_delete_mutate_the_buffer() {
        let mut w = FakeWindow::new("abcdef");
        w.apply_delete([1, 3]);
        assert_eq!(w.text(), "adef");
        w.apply_insert(0, "XY", 2);
        assert_eq!(w.text(), "XYXYadef");
    }

    #[test]
    fn dispose_selection_collapses_the_sole_selection_rather_than_removing_it() {
        let mut w = FakeWindow::new("abc");
        w.dispose_selection(0);
        assert_eq!(w.selections(), &[Selection { range: [0, 0], anchored: false }]);
    }

    #[test]
    fn scripted_process_run_rejects_unexpected_stdin() {
        let mut w = FakeWindow::new("x");
        w.script_run(Some("expected"), "out", 0);
        assert!(w.run("cmd", Some("other")).is_err());
    }
}
