use crate::commands::{ACTION, COMMANDS, FROM, NAME};
use crate::node::{Mapping, Node, Scalar};
use log::{debug, warn};
use std::path::{Component, Path, PathBuf};

#[must_use]
pub fn inherit_path(parent: &Path, child: PathBuf) -> PathBuf {
    if child.as_os_str().is_empty() {
        parent.to_path_buf()
    } else if child.is_relative() {
        parent.join(child)
    } else {
        child
    }
}

/// Collapse `.` and `..` components without touching the filesystem.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Settings flowing from a command down to its children
#[derive(Default, Clone, Debug)]
pub struct Inheritance {
    /// Effective base directory that actions resolve against
    from: PathBuf,
    /// Directory that relative `from` values are anchored to
    base_dir: PathBuf,
    entry_path: Vec<String>,
}

impl Inheritance {
    /// Start an inheritance chain for a config root.
    ///
    /// The root's own `from` is used when present, otherwise `base_dir`.
    #[must_use]
    pub fn for_root(root: &Mapping, base_dir: &Path) -> Self {
        let mut inheritance = Inheritance {
            from: base_dir.to_path_buf(),
            base_dir: base_dir.to_path_buf(),
            entry_path: Vec::new(),
        };
        inheritance.from = inheritance.effective_from(root, &[]);
        inheritance
    }

    /// Base directory for `command`, located at `entry_path` in the tree.
    fn effective_from(&self, command: &Mapping, entry_path: &[String]) -> PathBuf {
        match command.get(FROM) {
            Some(Node::Scalar(Scalar::String(from))) => {
                normalize_path(&inherit_path(&self.base_dir, PathBuf::from(from)))
            }
            None | Some(Node::Scalar(Scalar::Null)) => self.from.clone(),
            Some(other) => {
                let at = if entry_path.is_empty() {
                    "<root>".to_string()
                } else {
                    entry_path.join(".")
                };
                warn!("Ignoring non-string `from` at {at}: {other:?}");
                self.from.clone()
            }
        }
    }

    fn merge_entry_path(&self, entry: &str) -> Vec<String> {
        let mut new_entry_path = self.entry_path.clone();
        new_entry_path.push(entry.to_string());
        new_entry_path
    }
}

/// A trait for tree nodes that take their base directory from an enclosing command
pub trait Inheritable {
    /// Calculate the inheritance state for this item.
    fn calculate_inheritance(&self, inheritance: &Inheritance) -> Inheritance;

    /// Apply previously calculated inheritance to this item.
    fn apply_inheritance(&mut self, inheritance: &Inheritance);

    /// Calculate and apply inheritance in one step.
    fn inherit(&mut self, inheritance: &Inheritance) {
        let inherited = self.calculate_inheritance(inheritance);
        self.apply_inheritance(&inherited);
    }
}

impl Inheritable for Mapping {
    fn calculate_inheritance(&self, inheritance: &Inheritance) -> Inheritance {
        let name = self.get(NAME).and_then(Node::as_str).unwrap_or("?");
        let entry_path = inheritance.merge_entry_path(name);
        Inheritance {
            from: inheritance.effective_from(self, &entry_path),
            base_dir: inheritance.base_dir.clone(),
            entry_path,
        }
    }

    fn apply_inheritance(&mut self, inheritance: &Inheritance) {
        if let Some(Node::Scalar(Scalar::String(action))) = self.get_mut(ACTION) {
            let resolved = normalize_path(&inherit_path(&inheritance.from, PathBuf::from(&*action)));
            debug!(
                "Resolved action of {} to {}",
                inheritance.entry_path.join("."),
                resolved.display()
            );
            *action = resolved.to_string_lossy().into_owned();
        }
        inherit_children(self, inheritance);
    }
}

fn inherit_children(command: &mut Mapping, inheritance: &Inheritance) {
    if let Some(Node::Sequence(children)) = command.get_mut(COMMANDS) {
        for child in children {
            if let Node::Mapping(child) = child {
                child.inherit(inheritance);
            }
        }
    }
}

/// Rewrite every command's `action` into a path under its effective base directory.
///
/// The root's `from` (or `base_dir` when the root has none) seeds the walk; each command's
/// own `from` overrides what it inherited for itself and all of its descendants.
pub fn resolve_action_paths(root: &mut Node, base_dir: &Path) {
    let Node::Mapping(root) = root else {
        warn!("Config root is not a mapping, skipping action resolution");
        return;
    };
    let inheritance = Inheritance::for_root(root, base_dir);
    inherit_children(root, &inheritance);
}
