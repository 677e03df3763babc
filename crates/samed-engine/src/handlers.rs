//! Builtin leaf command handlers and their [`samed_command::CommandDef`]
//! table.
//!
//! `g v x y X Y` and `{…}` groups are deliberately absent here — the
//! executor special-cases them since they recurse into the tree itself
//! (see [`crate::executor`]). Everything else is an ordinary handler:
//! read the [`crate::executor::LeafArgs`] the executor already resolved,
//! enqueue [`samed_transcript::Change`]s, and touch the collaborator only
//! for things a transcript can't express (register writes, subprocess I/O,
//! window/file operations).

use crate::collab::{Options, Process, Registers, Text, Ui, Window};
use crate::executor::{HandlerFn, LeafArgs};
use crate::set;
use samed_command::{CommandDef, CommandFlags as F};
use samed_error::{EngineError, ErrorKind, ErrorLog};
use samed_transcript::{Change, Transcript};

/// The builtin command table for a concrete collaborator `C`. Built by an
/// ordinary function (not a `'static` table) because `HandlerFn<C>` is
/// generic over `C` and a `const`/`static` item cannot capture an enclosing
/// function's type parameters.
pub fn builtins<C>() -> Vec<CommandDef<HandlerFn<C>>>
where
    C: Text + Window + Registers + Process + Ui + Options,
{
    vec![
        CommandDef::new("a", "append text after the address", F::TEXT.union(F::ADDR_AFTER).union(F::DESTRUCTIVE), append as HandlerFn<C>),
        CommandDef::new("i", "insert text before the address", F::TEXT.union(F::ADDR_POS).union(F::DESTRUCTIVE), insert as HandlerFn<C>),
        CommandDef::new("c", "replace the address with text", F::TEXT.union(F::ADDR_LINE).union(F::DESTRUCTIVE), change as HandlerFn<C>),
        CommandDef::new("d", "delete the address", F::ADDR_LINE.union(F::DESTRUCTIVE), delete as HandlerFn<C>),
        CommandDef::new("p", "select the address", F::ADDR_LINE, print as HandlerFn<C>),
        CommandDef::new(
            "s",
            "replace regex matches within the address with text",
            F::REGEX.union(F::REGEX_DEFAULT).union(F::TEXT).union(F::ADDR_LINE).union(F::DESTRUCTIVE),
            substitute as HandlerFn<C>,
        ),
        CommandDef::new(
            "g",
            "run cmd if the address matches regex",
            F::REGEX.union(F::REGEX_DEFAULT).union(F::CMD).union(F::COUNT).union(F::ADDR_LINE).union(F::LOOP),
            noop as HandlerFn<C>,
        ),
        CommandDef::new(
            "v",
            "run cmd unless the address matches regex",
            F::REGEX.union(F::REGEX_DEFAULT).union(F::CMD).union(F::COUNT).union(F::ADDR_LINE).union(F::LOOP),
            noop as HandlerFn<C>,
        ),
        CommandDef::new(
            "x",
            "run cmd once per regex match in the address",
            F::REGEX.union(F::REGEX_DEFAULT).union(F::CMD).union(F::COUNT).union(F::ADDR_ALL).union(F::LOOP),
            noop as HandlerFn<C>,
        ),
        CommandDef::new(
            "y",
            "run cmd once per gap between regex matches in the address",
            F::REGEX.union(F::REGEX_DEFAULT).union(F::CMD).union(F::COUNT).union(F::ADDR_ALL).union(F::LOOP),
            noop as HandlerFn<C>,
        ),
        CommandDef::new(
            "X",
            "run cmd once per window whose name matches regex",
            F::REGEX.union(F::CMD).union(F::WIN).union(F::LOOP),
            noop as HandlerFn<C>,
        ),
        CommandDef::new(
            "Y",
            "run cmd once per window whose name does not match regex",
            F::REGEX.union(F::CMD).union(F::WIN).union(F::LOOP),
            noop as HandlerFn<C>,
        ),
        CommandDef::new(
            ">",
            "pipe the address to argv, discarding output",
            F::SHELL.union(F::ADDR_ALL_1CURSOR),
            pipe_to as HandlerFn<C>,
        ),
        CommandDef::new(
            "<",
            "replace the address with argv's output",
            F::SHELL.union(F::ADDR_ALL_1CURSOR).union(F::DESTRUCTIVE),
            pipe_from as HandlerFn<C>,
        ),
        CommandDef::new(
            "|",
            "replace the address with argv's output, fed the address as input",
            F::SHELL.union(F::ADDR_ALL_1CURSOR).union(F::DESTRUCTIVE),
            filter as HandlerFn<C>,
        ),
        CommandDef::new("!", "run argv, ignoring the address", F::SHELL.union(F::ADDR_NONE), shell as HandlerFn<C>),
        CommandDef::new("w", "write the address to a file", F::ARGV.union(F::FORCE).union(F::ADDR_ALL), write as HandlerFn<C>),
        CommandDef::new("r", "insert a file's contents at the address", F::ARGV.union(F::ADDR_AFTER).union(F::DESTRUCTIVE), read as HandlerFn<C>),
        CommandDef::new("e", "replace the window's buffer with a file", F::ARGV.union(F::FORCE).union(F::ADDR_NONE), edit as HandlerFn<C>),
        CommandDef::new("q", "close the current window", F::FORCE.union(F::ADDR_NONE), quit as HandlerFn<C>),
        CommandDef::new("cd", "change the working directory", F::ARGV.union(F::ADDR_NONE), cd as HandlerFn<C>),
        CommandDef::new("open", "open a file in a new window", F::ARGV.union(F::ADDR_NONE), open as HandlerFn<C>),
        CommandDef::new("split", "split the window horizontally", F::ARGV.union(F::ADDR_NONE), split as HandlerFn<C>),
        CommandDef::new("vsplit", "split the window vertically", F::ARGV.union(F::ADDR_NONE), vsplit as HandlerFn<C>),
        CommandDef::new("new", "open an empty window", F::ADDR_NONE, new_window as HandlerFn<C>),
        CommandDef::new("vnew", "open an empty window, split vertically", F::ADDR_NONE, vnew as HandlerFn<C>),
        CommandDef::new("wq", "write then close the window", F::FORCE.union(F::ARGV).union(F::ADDR_ALL), wq as HandlerFn<C>),
        CommandDef::new("qall", "close every window", F::FORCE.union(F::ADDR_NONE), qall as HandlerFn<C>),
        CommandDef::new("help", "show command help", F::ADDR_NONE, help as HandlerFn<C>),
        CommandDef::new("set", "set an editor option", F::ARGV.union(F::ADDR_NONE), set_option as HandlerFn<C>),
    ]
}

/// Placeholder handler for loop-class commands, which the executor never
/// actually dispatches through `def.handler` (see [`crate::executor`]).
fn noop<C>(_collab: &mut C, _args: &LeafArgs<'_>, _transcript: &mut Transcript, _errors: &mut ErrorLog) -> Result<(), EngineError> {
    Ok(())
}

fn append<C: Text>(_collab: &mut C, args: &LeafArgs<'_>, transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    insert_text(args, transcript, errors, args.range[1])
}

fn insert<C: Text>(_collab: &mut C, args: &LeafArgs<'_>, transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    insert_text(args, transcript, errors, args.range[0])
}

fn insert_text(args: &LeafArgs<'_>, transcript: &mut Transcript, errors: &mut ErrorLog, at: usize) -> Result<(), EngineError> {
    let Some(text) = args.text else {
        errors.push(ErrorKind::Text, at);
        return Ok(());
    };
    transcript.enqueue(
        Change::insert(args.window, args.selection, at, text.to_string(), args.count.start.max(1)),
        errors,
    );
    Ok(())
}

fn change<C: Text>(_collab: &mut C, args: &LeafArgs<'_>, transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    let Some(text) = args.text else {
        errors.push(ErrorKind::Text, args.range[0]);
        return Ok(());
    };
    transcript.enqueue(Change::change(args.window, args.selection, args.range, text.to_string()), errors);
    Ok(())
}

fn delete<C: Text>(_collab: &mut C, args: &LeafArgs<'_>, transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    transcript.enqueue(Change::delete(args.window, args.selection, args.range), errors);
    Ok(())
}

fn print<C: Window>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, _errors: &mut ErrorLog) -> Result<(), EngineError> {
    if let Some(selection) = args.selection {
        collab.anchor_range(selection, args.range);
    }
    Ok(())
}

fn substitute<C: Text>(collab: &mut C, args: &LeafArgs<'_>, transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    let (Some(re), Some(text)) = (args.regex, args.text) else {
        errors.push(ErrorKind::Regex, args.range[0]);
        return Ok(());
    };
    let slice = collab.slice(args.range);
    let Some(m) = re.find(slice) else { return Ok(()) };
    let match_range = [args.range[0] + m.start(), args.range[0] + m.end()];
    transcript.enqueue(Change::change(args.window, args.selection, match_range, text.to_string()), errors);
    Ok(())
}

fn pipe_to<C: Text + Process>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    let Some(shell) = args.shell else {
        errors.push(ErrorKind::Shell, args.range[0]);
        return Ok(());
    };
    let input = collab.slice(args.range).to_string();
    collab.run(shell, Some(&input)).map_err(|_| EngineError::new(ErrorKind::Execute, args.range[0]))?;
    Ok(())
}

fn pipe_from<C: Process>(collab: &mut C, args: &LeafArgs<'_>, transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    let Some(shell) = args.shell else {
        errors.push(ErrorKind::Shell, args.range[0]);
        return Ok(());
    };
    let output = collab.run(shell, None).map_err(|_| EngineError::new(ErrorKind::Execute, args.range[0]))?;
    transcript.enqueue(Change::change(args.window, args.selection, args.range, output.stdout), errors);
    Ok(())
}

fn filter<C: Text + Process>(collab: &mut C, args: &LeafArgs<'_>, transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    let Some(shell) = args.shell else {
        errors.push(ErrorKind::Shell, args.range[0]);
        return Ok(());
    };
    let input = collab.slice(args.range).to_string();
    let output = collab.run(shell, Some(&input)).map_err(|_| EngineError::new(ErrorKind::Execute, args.range[0]))?;
    transcript.enqueue(Change::change(args.window, args.selection, args.range, output.stdout), errors);
    Ok(())
}

fn shell<C: Process>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    let Some(cmd) = args.shell else {
        errors.push(ErrorKind::Shell, 0);
        return Ok(());
    };
    collab.run(cmd, None).map_err(|_| EngineError::new(ErrorKind::Execute, 0))?;
    Ok(())
}

fn write<C: Text + Window>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    let path = args.argv.first().map(String::as_str);
    match collab.save(path, args.range, args.force) {
        Ok(()) => {
            collab.set_modified(false);
            Ok(())
        }
        Err(_) => {
            errors.push(ErrorKind::WriteConflict, 0);
            Ok(())
        }
    }
}

fn read<C: Text>(collab: &mut C, args: &LeafArgs<'_>, transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    let Some(path) = args.argv.first() else {
        errors.push(ErrorKind::Command, 0);
        return Ok(());
    };
    match collab.read_file(path) {
        Ok(contents) => {
            transcript.enqueue(Change::insert(args.window, args.selection, args.range[0], contents, 1), errors);
            Ok(())
        }
        Err(_) => {
            errors.push(ErrorKind::Execute, 0);
            Ok(())
        }
    }
}

fn edit<C: Window>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    let Some(path) = args.argv.first() else {
        errors.push(ErrorKind::Command, 0);
        return Ok(());
    };
    if collab.open(path, args.force).is_err() {
        errors.push(ErrorKind::Execute, 0);
    }
    Ok(())
}

fn quit<C: Window + Ui>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    if collab.close_current(args.force) {
        if collab.window_count() == 0 {
            collab.quit(0);
        }
    } else {
        errors.push(ErrorKind::Execute, 0);
    }
    Ok(())
}

fn cd<C: Ui>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    let dir = args.argv.first().cloned().unwrap_or_else(|| collab.home_dir());
    if collab.set_cwd(&dir).is_err() {
        errors.push(ErrorKind::Execute, 0);
    }
    Ok(())
}

fn open<C: Window>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    let Some(path) = args.argv.first() else {
        errors.push(ErrorKind::Command, 0);
        return Ok(());
    };
    if collab.split(Some(path), false).is_err() {
        errors.push(ErrorKind::Execute, 0);
    }
    Ok(())
}

fn split<C: Window>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    if collab.split(args.argv.first().map(String::as_str), false).is_err() {
        errors.push(ErrorKind::Execute, 0);
    }
    Ok(())
}

fn vsplit<C: Window>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    if collab.split(args.argv.first().map(String::as_str), true).is_err() {
        errors.push(ErrorKind::Execute, 0);
    }
    Ok(())
}

fn new_window<C: Window>(collab: &mut C, _args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    if collab.split(None, false).is_err() {
        errors.push(ErrorKind::Execute, 0);
    }
    Ok(())
}

fn vnew<C: Window>(collab: &mut C, _args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    if collab.split(None, true).is_err() {
        errors.push(ErrorKind::Execute, 0);
    }
    Ok(())
}

fn wq<C: Text + Window + Ui>(collab: &mut C, args: &LeafArgs<'_>, transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    write(collab, args, transcript, errors)?;
    quit(collab, args, transcript, errors)
}

fn qall<C: Window + Ui>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    while collab.window_count() > 0 {
        if !collab.close_current(args.force) {
            errors.push(ErrorKind::Execute, 0);
            return Ok(());
        }
    }
    collab.quit(0);
    Ok(())
}

fn help<C: Ui>(collab: &mut C, _args: &LeafArgs<'_>, _transcript: &mut Transcript, _errors: &mut ErrorLog) -> Result<(), EngineError> {
    collab.info_show("see the command reference for a full list");
    Ok(())
}

fn set_option<C: Options>(collab: &mut C, args: &LeafArgs<'_>, _transcript: &mut Transcript, errors: &mut ErrorLog) -> Result<(), EngineError> {
    for arg in args.argv {
        let options = collab.option_table().to_vec();
        match set::resolve(arg, &options, |name| collab.option_value(name)) {
            Ok((name, value)) => collab.set_option(&name, value),
            Err(err) => errors.push_detail(err.kind, 0, err.detail.unwrap_or_default()),
        }
    }
    Ok(())
}
