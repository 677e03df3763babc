//! Command registry, flags, and the command-tree parser.
//!
//! Generic over a handler type `H: Copy` (normally a `fn` pointer) so this
//! crate never depends on `samed-engine`'s collaborator traits; the engine
//! instantiates every generic type here with its own handler signature.

#![warn(missing_docs)]

mod count;
mod def;
mod flags;
mod parse;
mod registry;
mod tree;

pub use count::Count;
pub use def::CommandDef;
pub use flags::CommandFlags;
pub use parse::{parse_command, parse_group, ParseState};
pub use registry::Registry;
pub use tree::{CommandNode, CommandTree, NodeId, NodeKind};

/// Parse one full top-level command line: an address, then either a `{…}`
/// group or a single command, consuming every token.
///
/// Returns the root node id on success. A top-level group has no address of
/// its own attached by this function — callers that need to apply a
/// top-level address to a group's whole iteration should read
/// [`samed_address::parse_address`] themselves before checking for
/// `GroupStart`, exactly as this function does, and apply it the same way
/// [`parse::parse_group`]'s recursive case does for nested groups.
pub fn parse_line<H: Copy>(
    stream: &mut samed_token::TokenStream<'_>,
    registry: &Registry<H>,
    tree: &mut CommandTree<H>,
    state: &mut ParseState,
    errors: &mut samed_error::ErrorLog,
) -> Option<NodeId> {
    let address = samed_address::parse_address(stream, errors);
    let root = match stream.peek() {
        Some(t) if t.kind == samed_token::TokenKind::GroupStart => {
            stream.pop();
            Some(parse_group(stream, registry, tree, state, errors))
        }
        _ => parse_command(stream, registry, tree, state, errors),
    };
    if let Some(id) = root {
        tree.get_mut(id).address = address;
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use samed_error::ErrorLog;
    use samed_lexer::lex;

    type Handler = fn();
    fn noop() {}

    static BUILTINS: &[CommandDef<Handler>] =
        &[CommandDef::new("delete", "delete", CommandFlags::DESTRUCTIVE, noop as Handler)];

    #[test]
    fn parse_line_attaches_address_to_the_root_command() {
        let mut stream = lex("1,3d");
        let reg = Registry::new(BUILTINS);
        let mut tree = CommandTree::new();
        let mut state = ParseState::default();
        let mut errors = ErrorLog::new();
        let id = parse_line(&mut stream, &reg, &mut tree, &mut state, &mut errors).unwrap();
        assert!(errors.is_empty());
        let node = tree.get(id);
        assert_eq!(node.def().unwrap().name, "delete");
        assert_eq!(node.address.left, samed_address::AddressSide::Line(1));
    }

    #[test]
    fn parse_line_builds_a_group_with_siblings_in_order() {
        let mut stream = lex("{1d 2d}");
        let reg = Registry::new(BUILTINS);
        let mut tree = CommandTree::new();
        let mut state = ParseState::default();
        let mut errors = ErrorLog::new();
        let id = parse_line(&mut stream, &reg, &mut tree, &mut state, &mut errors).unwrap();
        assert!(errors.is_empty());
        let group = tree.get(id);
        assert!(group.is_group());
        let siblings: Vec<_> = tree.siblings(group.child.unwrap()).collect();
        assert_eq!(siblings.len(), 2);
    }
}
