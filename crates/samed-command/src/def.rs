//! [`CommandDef`] — the static description of one builtin or
//! user-registered command.

use crate::flags::CommandFlags;

/// A command's static shape: its name, help text, the flags controlling
/// argument parsing and execution, and a handler.
///
/// Generic over `H` (normally a `fn` pointer type) so this crate never
/// needs to know the collaborator types a handler actually operates on —
/// `samed-engine` instantiates `CommandDef<HandlerFn>` with its own handler
/// signature.
#[derive(Debug, Clone, Copy)]
pub struct CommandDef<H: Copy> {
    /// Command name, e.g. `"delete"`, looked up by closest unique prefix.
    pub name: &'static str,
    /// One-line help text shown by the `help` command.
    pub help: &'static str,
    /// Argument shape and execution flags.
    pub flags: CommandFlags,
    /// The handler invoked once the command has been fully parsed.
    pub handler: H,
}

impl<H: Copy> CommandDef<H> {
    /// Construct a command definition.
    pub const fn new(name: &'static str, help: &'static str, flags: CommandFlags, handler: H) -> Self {
        CommandDef {
            name,
            help,
            flags,
            handler,
        }
    }
}

impl<H: Copy> PartialEq for CommandDef<H> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl<H: Copy> Eq for CommandDef<H> {}
