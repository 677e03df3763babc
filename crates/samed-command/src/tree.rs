//! Arena-backed command tree.
//!
//! Nested commands (`x`/`y`/`g`/`v`/`X`/`Y`'s `CMD` argument, and `{…}`
//! group siblings) are naturally a tree of owned children, but this crate
//! avoids self-referential `Box`/raw-pointer parent links. Instead every
//! parsed command or group is a node in a flat [`CommandTree`], and
//! `child`/`next` are [`NodeId`] indices rather than pointers — the
//! systems-rewrite equivalent of the arena-allocated, index-addressed tree
//! the design notes call for.

use crate::count::Count;
use crate::def::CommandDef;
use regex::Regex;

/// Index of a [`CommandNode`] within a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// What a [`CommandNode`] represents.
#[derive(Debug, Clone, Copy)]
pub enum NodeKind<H: Copy> {
    /// A resolved command invocation.
    Command(CommandDef<H>),
    /// A `{…}` group; `child` names the first sibling inside it.
    Group,
}

/// One parsed command invocation, or a `{…}` group.
#[derive(Debug, Clone)]
pub struct CommandNode<H: Copy> {
    /// What this node is.
    pub kind: NodeKind<H>,
    /// Parsed address (meaningless for [`NodeKind::Group`]).
    pub address: samed_address::Address,
    /// Parsed `COUNT` argument, or the `TEXT` repeat count.
    pub count: Count,
    /// Compiled `REGEX` argument, if the command takes one.
    pub regex: Option<Regex>,
    /// Unescaped `TEXT` argument.
    pub text: Option<String>,
    /// Raw `SHELL` argument.
    pub shell: Option<String>,
    /// Parsed `ARGV` argument.
    pub argv: Vec<String>,
    /// Trailing `!` was present.
    pub force: bool,
    /// Nested command (the `CMD` argument), or a group's first sibling.
    pub child: Option<NodeId>,
    /// Next sibling within the enclosing group, if any.
    pub next: Option<NodeId>,
    /// Set by the executor while iterating; not touched by the parser.
    pub iteration: i64,
}

impl<H: Copy> CommandNode<H> {
    fn new(kind: NodeKind<H>) -> Self {
        CommandNode {
            kind,
            address: samed_address::Address::none(),
            count: Count::all(),
            regex: None,
            text: None,
            shell: None,
            argv: Vec::new(),
            force: false,
            child: None,
            next: None,
            iteration: 0,
        }
    }

    /// The resolved definition, or `None` for a [`NodeKind::Group`].
    pub fn def(&self) -> Option<&CommandDef<H>> {
        match &self.kind {
            NodeKind::Command(def) => Some(def),
            NodeKind::Group => None,
        }
    }

    /// True for a `{…}` group node.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }
}

/// Owns every [`CommandNode`] parsed while processing one top-level command
/// line. Reset (dropped and recreated) per invocation, mirroring the
/// arena's per-invocation lifetime.
#[derive(Debug, Clone, Default)]
pub struct CommandTree<H: Copy> {
    nodes: Vec<CommandNode<H>>,
}

impl<H: Copy> CommandTree<H> {
    /// An empty tree.
    pub fn new() -> Self {
        CommandTree { nodes: Vec::new() }
    }

    /// Insert a new command node and return its id.
    pub fn push_command(&mut self, def: CommandDef<H>) -> NodeId {
        self.push(NodeKind::Command(def))
    }

    /// Insert a new group node and return its id.
    pub fn push_group(&mut self) -> NodeId {
        self.push(NodeKind::Group)
    }

    fn push(&mut self, kind: NodeKind<H>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(CommandNode::new(kind));
        id
    }

    /// Borrow a node.
    pub fn get(&self, id: NodeId) -> &CommandNode<H> {
        &self.nodes[id.0 as usize]
    }

    /// Mutably borrow a node.
    pub fn get_mut(&mut self, id: NodeId) -> &mut CommandNode<H> {
        &mut self.nodes[id.0 as usize]
    }

    /// Iterate a group's siblings starting at `first`, in order.
    pub fn siblings(&self, first: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = Some(first);
        std::iter::from_fn(move || {
            let id = cur?;
            cur = self.get(id).next;
            Some(id)
        })
    }

    /// Number of nodes allocated so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no nodes have been allocated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
