use crate::commands::{ACTION, COMMANDS, NAME};
use crate::node::{Mapping, Node};

/// Operations performed on each command while walking a command tree
pub trait CommandVisitor {
    /// Called for every command before its children, with the names from the root down to it.
    fn visit(&mut self, command: &Mapping, path: &[String]);
}

/// Walk the `commands` of `root` depth-first, parents before children.
pub fn walk_commands(root: &Node, visitor: &mut impl CommandVisitor) {
    if let Node::Mapping(root) = root {
        walk_children(root, visitor, &[]);
    }
}

fn walk_children(parent: &Mapping, visitor: &mut impl CommandVisitor, path: &[String]) {
    let Some(Node::Sequence(children)) = parent.get(COMMANDS) else {
        return;
    };
    for (index, child) in children.iter().enumerate() {
        let Node::Mapping(command) = child else {
            continue;
        };
        let name = command
            .get(NAME)
            .and_then(Node::as_str)
            .map_or_else(|| format!("#{index}"), str::to_string);
        let mut current_path = path.to_vec();
        current_path.push(name);
        visitor.visit(command, &current_path);
        walk_children(command, visitor, &current_path);
    }
}

/// A flat listing of commands by their name path
#[derive(Debug, Default)]
pub struct CommandListing {
    pub entries: Vec<ListingEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub path: Vec<String>,
    pub action: Option<String>,
}

impl CommandVisitor for CommandListing {
    fn visit(&mut self, command: &Mapping, path: &[String]) {
        self.entries.push(ListingEntry {
            path: path.to_vec(),
            action: command
                .get(ACTION)
                .and_then(Node::as_str)
                .map(str::to_string),
        });
    }
}
