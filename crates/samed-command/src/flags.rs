//! Flag bits controlling a command's argument shape and execution rules.

bitflags::bitflags! {
    /// Per-[`crate::CommandDef`] flags. Argument-shape flags (`TEXT`,
    /// `SHELL`, `COUNT`, `REGEX`, `REGEX_DEFAULT`, `CMD`, `ARGV`, `FORCE`)
    /// control what the command parser consumes; execution flags (`ONCE`,
    /// `LOOP`, `DESTRUCTIVE`, `WIN`) control how the executor dispatches.
    /// The address-default flags determine the implicit range used when no
    /// address was given.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandFlags: u32 {
        /// Takes a nested sub-command argument.
        const CMD = 1 << 0;
        /// Takes a delimited regular expression argument.
        const REGEX = 1 << 1;
        /// A missing `REGEX` argument reuses the most recently used regex.
        const REGEX_DEFAULT = 1 << 2;
        /// Takes a `COUNT` argument (`%n`, `n`, or `n,m`).
        const COUNT = 1 << 3;
        /// Takes a delimited, escape-processed text argument.
        const TEXT = 1 << 4;
        /// Takes the remainder of the line as a shell command.
        const SHELL = 1 << 5;
        /// Accepts a trailing `!` to set `force`.
        const FORCE = 1 << 6;
        /// Takes whitespace-separated, quote-aware argv.
        const ARGV = 1 << 7;
        /// Runs exactly once regardless of selection count.
        const ONCE = 1 << 8;
        /// A loop-class command (`x y g v X Y`).
        const LOOP = 1 << 9;
        /// Mutates text; rejected after a loop-class command has run.
        const DESTRUCTIVE = 1 << 10;
        /// Operates on a window rather than only a file.
        const WIN = 1 << 11;

        /// No implicit address; an explicit one is required.
        const ADDR_NONE = 1 << 12;
        /// Implicit address is an empty range at the cursor.
        const ADDR_POS = 1 << 13;
        /// Implicit address is the current line.
        const ADDR_LINE = 1 << 14;
        /// Implicit address is an empty range at the start of the next line.
        const ADDR_AFTER = 1 << 15;
        /// Implicit address is the whole file.
        const ADDR_ALL = 1 << 16;
        /// Implicit address is the whole file, but only when one cursor
        /// exists.
        const ADDR_ALL_1CURSOR = 1 << 17;
    }
}

impl CommandFlags {
    /// Mask covering all address-default flags.
    pub const ADDR_MASK: CommandFlags = CommandFlags::ADDR_NONE
        .union(CommandFlags::ADDR_POS)
        .union(CommandFlags::ADDR_LINE)
        .union(CommandFlags::ADDR_AFTER)
        .union(CommandFlags::ADDR_ALL)
        .union(CommandFlags::ADDR_ALL_1CURSOR);
}
