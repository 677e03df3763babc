//! Expands one parsed command tree over a window's selections.
//!
//! A top-level invocation fans out once, over the window's current
//! selections; everything under that single top-level node — including a
//! `{…}` group's siblings — runs against the *same* enclosing selection, per
//! the grammar's "a group iterates over its siblings under each enclosing
//! selection." The loop-class commands (`g v x y X Y`) are the only things
//! that introduce a further, inner iteration, and they do so by recursing
//! into their own `CMD` child once per match rather than by re-consulting
//! the window's selection list.
//!
//! `COUNT` gating follows what the gated node is reached once *per*: a leaf
//! command or `g`/`v` is reached once per iteration its own `COUNT` means to
//! constrain, so its node's own reach count (`CommandNode::iteration`)
//! gates it directly. `x`/`y` are different — the node itself is reached
//! once per enclosing selection, while its parsed `COUNT` constrains which
//! of the *matches* found inside that one invocation recurse into the
//! child; `run_split` gates those by match index instead.
//!
//! An address-less child recursed into from `g v x y X Y` takes its dot
//! directly from the match/gap/window range that invoked it, rather than
//! re-deriving the flag-based default a bare top-level invocation would use
//! (an `ADDR_LINE` command under `x` acts on the match, not the whole line
//! the match sits in). `run_one`'s `forced_current` parameter carries this
//! distinction down the recursion.

use crate::collab::{Process, Registers, Text, Ui, Window};
use regex::Regex;
use samed_address::evaluate;
use samed_command::{CommandFlags, CommandTree, NodeId};
use samed_error::{ErrorKind, ErrorLog};
use samed_transcript::Transcript;

/// Arguments visible to a leaf command's handler: the resolved range plus
/// whichever parsed arguments its flags called for.
pub struct LeafArgs<'a> {
    /// The address, resolved against this invocation's enclosing selection.
    pub range: [usize; 2],
    /// Compiled `REGEX` argument.
    pub regex: Option<&'a Regex>,
    /// Unescaped `TEXT` argument.
    pub text: Option<&'a str>,
    /// Raw `SHELL` argument.
    pub shell: Option<&'a str>,
    /// Parsed `ARGV` argument.
    pub argv: &'a [String],
    /// Trailing `!` was present.
    pub force: bool,
    /// The `TEXT` repeat count, or the parsed `COUNT` argument.
    pub count: samed_command::Count,
    /// The selection this invocation is running under, if any.
    pub selection: Option<usize>,
    /// Which window this invocation is running under.
    pub window: usize,
}

/// A leaf command's handler: given the collaborator and its parsed
/// arguments, enqueue [`samed_transcript::Change`]s and/or perform
/// collaborator I/O. Never called for `g v x y X Y` or `{…}` groups — those
/// are executor-internal, since they need to recurse into the tree itself.
pub type HandlerFn<C> = for<'a> fn(&mut C, &LeafArgs<'a>, &mut Transcript, &mut ErrorLog) -> Result<(), samed_error::EngineError>;

type Tree<C> = CommandTree<HandlerFn<C>>;

/// Run one fully parsed top-level command line against `collab`'s current
/// selections, enqueueing changes into `transcript`. Does not apply the
/// transcript — call [`crate::apply_to_window`] (or your own applier) once
/// every command for this invocation has run.
pub fn run_line<C>(collab: &mut C, tree: &mut Tree<C>, root: NodeId, transcript: &mut Transcript, errors: &mut ErrorLog)
where
    C: Text + Window + Registers + Process + Ui,
{
    let selections = collab.selection_count();
    if selections == 0 {
        let current = collab.current_range();
        let mut loop_ran = false;
        run_one(collab, tree, root, None, current, false, transcript, errors, &mut loop_ran);
        return;
    }
    for ordinal in 0..selections {
        let current = collab.selection_range(ordinal);
        let mut loop_ran = false;
        run_one(collab, tree, root, Some(ordinal), current, false, transcript, errors, &mut loop_ran);
    }
}

#[allow(clippy::too_many_arguments)]
fn run_one<C>(
    collab: &mut C,
    tree: &mut Tree<C>,
    id: NodeId,
    selection: Option<usize>,
    current: [usize; 2],
    forced_current: bool,
    transcript: &mut Transcript,
    errors: &mut ErrorLog,
    loop_ran: &mut bool,
) where
    C: Text + Window + Registers + Process + Ui,
{
    if tree.get(id).is_group() {
        if *loop_ran {
            errors.push(ErrorKind::GroupInvalidCmd, 0);
            return;
        }
        let Some(first) = tree.get(id).child else { return };
        let siblings: Vec<NodeId> = tree.siblings(first).collect();
        let mut group_loop_ran = false;
        for sib in siblings {
            run_one(collab, tree, sib, selection, current, forced_current, transcript, errors, &mut group_loop_ran);
        }
        *loop_ran = *loop_ran || group_loop_ran;
        return;
    }

    let iteration = {
        let node = tree.get_mut(id);
        node.iteration += 1;
        node.iteration
    };
    let (def, explicit_address) = {
        let node = tree.get(id);
        (*node.def().unwrap(), node.address.clone())
    };
    // `x`/`y`'s `COUNT` gates which matches/gaps recurse into the child
    // (handled inside `run_split`), not whether this invocation runs at
    // all — the node is reached once per enclosing selection, not once per
    // match. `g`/`v` and every leaf command are reached once per iteration
    // they mean to count, so the node's own iteration counter applies
    // directly.
    let gates_by_own_iteration = !matches!(def.name, "x" | "y");
    if gates_by_own_iteration && !tree.get(id).count.matches(iteration) {
        return;
    }

    if def.flags.contains(CommandFlags::ADDR_NONE) && !explicit_address.explicit {
        errors.push(ErrorKind::NoAddress, 0);
        return;
    }

    if *loop_ran && def.flags.contains(CommandFlags::DESTRUCTIVE) {
        errors.push(ErrorKind::LoopInvalidCmd, 0);
        return;
    }

    let ordinal = selection.unwrap_or(0);
    let range = if explicit_address.explicit {
        evaluate(&explicit_address, &*collab, &*collab, ordinal, current)
    } else if forced_current {
        // Recursed from a loop-class command (`g v x y X Y`): `current` is
        // already the match/gap/window range that is this invocation's dot,
        // and an address-less child command acts on it directly rather than
        // re-deriving a flag-based default (e.g. `ADDR_LINE` expanding to the
        // whole line).
        current
    } else {
        default_range(&*collab, def.flags, current)
    };

    match def.name {
        "g" | "v" => run_guard(collab, tree, id, def.name == "v", selection, range, transcript, errors),
        "x" | "y" => run_split(collab, tree, id, def.name == "y", selection, range, transcript, errors),
        "X" | "Y" => run_windows(collab, tree, id, def.name == "Y", selection, range, transcript, errors),
        _ => {
            let node = tree.get(id);
            let args = LeafArgs {
                range,
                regex: node.regex.as_ref(),
                text: node.text.as_deref(),
                shell: node.shell.as_deref(),
                argv: &node.argv,
                force: node.force,
                count: node.count,
                selection,
                window: 0,
            };
            if let Err(err) = (def.handler)(collab, &args, transcript, errors) {
                errors.push(err.kind, err.offset);
            }
        }
    }

    if def.flags.contains(CommandFlags::LOOP) {
        *loop_ran = true;
    }
}

fn default_range<C: Text>(collab: &C, flags: CommandFlags, current: [usize; 2]) -> [usize; 2] {
    if flags.contains(CommandFlags::ADDR_POS) {
        [current[1], current[1]]
    } else if flags.contains(CommandFlags::ADDR_LINE) {
        let line = collab.byte_to_line(current[0]);
        [collab.line_to_byte(line), collab.line_to_byte(line + 1)]
    } else if flags.contains(CommandFlags::ADDR_AFTER) {
        let line = collab.byte_to_line(current[1]);
        let at = collab.line_to_byte(line + 1);
        [at, at]
    } else if flags.intersects(CommandFlags::ADDR_ALL.union(CommandFlags::ADDR_ALL_1CURSOR)) {
        [0, collab.len()]
    } else {
        current
    }
}

#[allow(clippy::too_many_arguments)]
fn run_guard<C>(
    collab: &mut C,
    tree: &mut Tree<C>,
    id: NodeId,
    invert: bool,
    selection: Option<usize>,
    range: [usize; 2],
    transcript: &mut Transcript,
    errors: &mut ErrorLog,
) where
    C: Text + Window + Registers + Process + Ui,
{
    let (regex, child) = {
        let node = tree.get(id);
        (node.regex.clone(), node.child)
    };
    let Some(re) = regex else {
        errors.push(ErrorKind::Regex, 0);
        return;
    };
    let Some(child) = child else { return };
    let matched = re.is_match(collab.slice(range));
    if matched != invert {
        let mut loop_ran = false;
        run_one(collab, tree, child, selection, range, true, transcript, errors, &mut loop_ran);
    }
}

#[allow(clippy::too_many_arguments)]
fn run_split<C>(
    collab: &mut C,
    tree: &mut Tree<C>,
    id: NodeId,
    complement: bool,
    selection: Option<usize>,
    range: [usize; 2],
    transcript: &mut Transcript,
    errors: &mut ErrorLog,
) where
    C: Text + Window + Registers + Process + Ui,
{
    let (regex, child, mut count) = {
        let node = tree.get(id);
        (node.regex.clone(), node.child, node.count)
    };
    let Some(child) = child else { return };
    let slice = collab.slice(range).to_string();
    let matches = find_matches(regex.as_ref(), &slice, range[0], range[1], collab);

    if complement {
        let mut cursor = range[0];
        let mut gaps = Vec::new();
        for m in &matches {
            if m[0] > cursor {
                gaps.push([cursor, m[0]]);
            }
            cursor = m[1];
        }
        if cursor < range[1] {
            gaps.push([cursor, range[1]]);
        }
        count.resolve(gaps.len() as i64);
        for (i, gap) in gaps.into_iter().enumerate() {
            if !count.matches((i + 1) as i64) {
                continue;
            }
            let mut loop_ran = false;
            run_one(collab, tree, child, selection, gap, true, transcript, errors, &mut loop_ran);
        }
    } else {
        count.resolve(matches.len() as i64);
        for (i, m) in matches.into_iter().enumerate() {
            if !count.matches((i + 1) as i64) {
                continue;
            }
            if regex.is_some() {
                let text = collab.slice(m).to_string();
                collab.set_register(0, &text);
            }
            let mut loop_ran = false;
            run_one(collab, tree, child, selection, m, true, transcript, errors, &mut loop_ran);
        }
    }
}

/// Non-overlapping matches of `regex` inside `[start, end)`, or (when
/// `regex` is `None`, the `y`-without-pattern case) one match per line. Empty
/// matches advance by one byte; an empty match at end-of-range right after a
/// newline is suppressed, matching the usual "don't select the phantom line
/// after a trailing newline" behavior.
fn find_matches<C: Text>(regex: Option<&Regex>, slice: &str, start: usize, end: usize, collab: &C) -> Vec<[usize; 2]> {
    let mut out = Vec::new();
    match regex {
        Some(re) => {
            let mut pos = 0usize;
            loop {
                if pos > slice.len() {
                    break;
                }
                let Some(m) = re.find_at(slice, pos) else { break };
                let (s, e) = (m.start(), m.end());
                let empty = s == e;
                if empty && s == slice.len() && slice.ends_with('\n') {
                    break;
                }
                out.push([start + s, start + e]);
                pos = if empty { e + 1 } else { e };
            }
        }
        None => {
            let mut at = start;
            while at < end {
                let line = collab.byte_to_line(at);
                let mut next = collab.line_to_byte(line + 1).min(end);
                if next <= at {
                    next = end;
                }
                out.push([at, next]);
                at = next;
            }
        }
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn run_windows<C>(
    collab: &mut C,
    tree: &mut Tree<C>,
    id: NodeId,
    complement: bool,
    selection: Option<usize>,
    range: [usize; 2],
    transcript: &mut Transcript,
    errors: &mut ErrorLog,
) where
    C: Text + Window + Registers + Process + Ui,
{
    let (regex, child) = {
        let node = tree.get(id);
        (node.regex.clone(), node.child)
    };
    let Some(child) = child else { return };
    let window_count = collab.window_count();
    for w in 0..window_count {
        let matched = match (&regex, collab.window_file_name(w)) {
            (Some(re), Some(name)) => re.is_match(name),
            (Some(_), None) => false,
            (None, _) => true,
        };
        if matched != complement {
            // Cross-window dispatch (running the child against window `w`'s
            // own buffer rather than the current one) is left to the
            // embedding editor: this core only evaluates the match test and
            // always runs the child in the current window's context.
            let mut loop_ran = false;
            run_one(collab, tree, child, selection, range, true, transcript, errors, &mut loop_ran);
        }
    }
}
