//! Command registry: an immutable builtin table plus a mutable
//! user-command map, looked up by closest-unique-prefix match.

use crate::def::CommandDef;
use std::collections::HashMap;

/// Holds the builtin command table and any user-registered commands.
///
/// Lookup ([`Registry::lookup`]) prefers an exact name match, then falls
/// back to the single builtin-or-user command whose name the input is an
/// unambiguous prefix of — e.g. `q` resolves to `quit` as long as no other
/// registered command also starts with `q`.
pub struct Registry<H: Copy> {
    builtins: Vec<CommandDef<H>>,
    usercmds: HashMap<String, CommandDef<H>>,
}

impl<H: Copy> Registry<H> {
    /// Create a registry over a builtin table. Accepts a `Vec` (the usual
    /// case when `H` is a handler type generic over a collaborator bound,
    /// since such a table cannot live in a `'static` array) or a `&'static`
    /// slice of `Copy` definitions.
    pub fn new(builtins: impl Into<Vec<CommandDef<H>>>) -> Self {
        Registry {
            builtins: builtins.into(),
            usercmds: HashMap::new(),
        }
    }

    fn all(&self) -> impl Iterator<Item = &CommandDef<H>> {
        self.builtins.iter().chain(self.usercmds.values())
    }

    /// Resolve `name` to a command definition.
    pub fn lookup(&self, name: &str) -> Option<&CommandDef<H>> {
        if name.is_empty() {
            return None;
        }
        if let Some(exact) = self.all().find(|d| d.name == name) {
            return Some(exact);
        }
        let mut candidates = self.all().filter(|d| d.name.starts_with(name));
        let first = candidates.next()?;
        if candidates.next().is_none() {
            Some(first)
        } else {
            None
        }
    }

    /// Register a user command, visible to both [`Self::lookup`] and
    /// [`Self::help_entries`]. Overwrites any existing user command with
    /// the same name.
    pub fn register(&mut self, def: CommandDef<H>) {
        self.usercmds.insert(def.name.to_string(), def);
    }

    /// Remove a user-registered command. No-op (and returns `false`) for
    /// builtins or unknown names — removal either succeeds entirely or has
    /// no effect.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.usercmds.remove(name).is_some()
    }

    /// All command definitions, builtin and user, for the `help` command.
    pub fn help_entries(&self) -> Vec<&CommandDef<H>> {
        self.all().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::CommandFlags;

    type Handler = fn();
    fn noop() {}

    static BUILTINS: &[CommandDef<Handler>] = &[
        CommandDef::new("delete", "delete text", CommandFlags::empty(), noop as Handler),
        CommandDef::new("quit", "quit", CommandFlags::empty(), noop as Handler),
    ];

    #[test]
    fn exact_match_wins() {
        let reg = Registry::new(BUILTINS);
        assert_eq!(reg.lookup("quit").unwrap().name, "quit");
    }

    #[test]
    fn unique_prefix_resolves() {
        let reg = Registry::new(BUILTINS);
        assert_eq!(reg.lookup("q").unwrap().name, "quit");
        assert_eq!(reg.lookup("d").unwrap().name, "delete");
    }

    #[test]
    fn ambiguous_prefix_fails() {
        static AMBIGUOUS: &[CommandDef<Handler>] = &[
            CommandDef::new("write", "w", CommandFlags::empty(), noop as Handler),
            CommandDef::new("wq", "wq", CommandFlags::empty(), noop as Handler),
        ];
        let reg = Registry::new(AMBIGUOUS);
        assert!(reg.lookup("w").is_none());
        assert!(reg.lookup("write").is_some());
    }

    #[test]
    fn register_and_unregister_are_atomic() {
        let mut reg = Registry::new(BUILTINS);
        reg.register(CommandDef::new("myc", "custom", CommandFlags::empty(), noop as Handler));
        assert!(reg.lookup("myc").is_some());
        assert!(reg.unregister("myc"));
        assert!(reg.lookup("myc").is_none());
        assert!(!reg.unregister("myc"));
    }

    #[test]
    fn user_command_shadows_nothing_but_is_visible_to_lookup_and_help() {
        let mut reg = Registry::new(BUILTINS);
        reg.register(CommandDef::new("zz", "z", CommandFlags::empty(), noop as Handler));
        assert_eq!(reg.help_entries().len(), 3);
        assert_eq!(reg.lookup("zz").unwrap().name, "zz");
    }
}
