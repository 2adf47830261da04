//! Splicing of `imports` directives into a document tree
//!
//! Imports on a sequence element replace that element with the imported content, flattened one
//! level. Imports on any other mapping are shallow-merged over the mapping's own keys. Every
//! imported document is itself fully resolved before it is spliced or merged, and every relative
//! import path resolves against the resolver's base directory rather than the importing document.

use std::path::PathBuf;

use log::debug;
use thiserror::Error;

use crate::node::{Mapping, Node, Scalar, flatten_once};
use crate::source::{Loader, Source, SourceError};

/// Key holding the import directive of a mapping
pub const IMPORTS: &str = "imports";

/// Errors that can occur while resolving imports
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unable to import `{reference}` at {entry}: {source}")]
    Resolution {
        reference: String,
        entry: String,
        #[source]
        source: SourceError,
    },
    #[error("Import cycle detected: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },
    #[error("Invalid import at {entry}: {reason}")]
    InvalidImport { entry: String, reason: String },
}

fn display_entry(entry: &[String]) -> String {
    if entry.is_empty() {
        "<root>".to_string()
    } else {
        entry.join(".")
    }
}

fn child_entry(entry: &[String], segment: impl Into<String>) -> Vec<String> {
    let mut child = entry.to_vec();
    child.push(segment.into());
    child
}

/// Read the import references of a directive value.
fn import_references(directive: &Node, entry: &[String]) -> Result<Vec<String>, ImportError> {
    let invalid = |reason: String| ImportError::InvalidImport {
        entry: display_entry(entry),
        reason,
    };
    match directive {
        Node::Scalar(Scalar::String(reference)) => Ok(vec![reference.clone()]),
        Node::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(format!("expected a string, got {item:?}")))
            })
            .collect(),
        other => Err(invalid(format!(
            "expected a string or a list of strings, got {other:?}"
        ))),
    }
}

/// Resolves import directives through a [`Loader`]
pub struct Resolver<L: Loader> {
    loader: L,
    base_dir: PathBuf,
    /// Identities of the documents currently being resolved, outermost first
    chain: Vec<String>,
}

impl<L: Loader> Resolver<L> {
    pub fn new(loader: L, base_dir: impl Into<PathBuf>) -> Self {
        Resolver {
            loader,
            base_dir: base_dir.into(),
            chain: Vec::new(),
        }
    }

    #[must_use]
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Resolve every import in the document loaded from `source`.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` if any import fails to load, is malformed, or forms a cycle.
    pub fn resolve_document(&mut self, source: &Source, node: &mut Node) -> Result<(), ImportError> {
        self.chain.push(source.identity());
        let result = self.resolve(node, &[]);
        self.chain.pop();
        result
    }

    /// Resolve every import below `node`.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` if any import fails to load, is malformed, or forms a cycle.
    pub fn resolve(&mut self, node: &mut Node, entry: &[String]) -> Result<(), ImportError> {
        match node {
            Node::Sequence(items) => self.resolve_sequence(items, entry),
            Node::Mapping(map) => self.resolve_mapping(map, entry),
            Node::Scalar(_) => Ok(()),
        }
    }

    fn resolve_sequence(
        &mut self,
        items: &mut Vec<Node>,
        entry: &[String],
    ) -> Result<(), ImportError> {
        let mut index = 0;
        while index < items.len() {
            match &mut items[index] {
                Node::Sequence(nested) => {
                    // Spliced elements are examined again from the same index
                    let nested = std::mem::take(nested);
                    items.splice(index..=index, flatten_once(nested));
                }
                Node::Mapping(map) if map.contains_key(IMPORTS) => {
                    let item_entry = child_entry(entry, index.to_string());
                    let references = import_references(&map[IMPORTS], &item_entry)?;
                    let mut fragments = Vec::with_capacity(references.len());
                    for reference in &references {
                        let fragment = self.import(reference, &item_entry)?;
                        if !fragment.is_null() {
                            fragments.push(fragment);
                        }
                    }
                    let spliced = flatten_once(fragments);
                    let count = spliced.len();
                    items.splice(index..=index, spliced);
                    index += count;
                }
                Node::Mapping(map) => {
                    self.resolve_mapping(map, &child_entry(entry, index.to_string()))?;
                    index += 1;
                }
                Node::Scalar(_) => index += 1,
            }
        }
        let flattened = flatten_once(std::mem::take(items));
        *items = flattened;
        Ok(())
    }

    fn resolve_mapping(&mut self, map: &mut Mapping, entry: &[String]) -> Result<(), ImportError> {
        for (key, value) in map.iter_mut() {
            if key != IMPORTS {
                self.resolve(value, &child_entry(entry, key.as_str()))?;
            }
        }

        let Some(directive) = map.get(IMPORTS) else {
            return Ok(());
        };
        for reference in import_references(directive, entry)? {
            match self.import(&reference, entry)? {
                Node::Mapping(fragment) => {
                    for (key, value) in fragment {
                        map.insert(key, value);
                    }
                }
                Node::Scalar(Scalar::Null) => debug!("Import `{reference}` is empty"),
                other => {
                    return Err(ImportError::InvalidImport {
                        entry: display_entry(entry),
                        reason: format!(
                            "`{reference}` must resolve to a mapping to merge into a mapping, got {}",
                            if other.as_sequence().is_some() {
                                "a sequence"
                            } else {
                                "a scalar"
                            }
                        ),
                    });
                }
            }
        }
        map.shift_remove(IMPORTS);
        Ok(())
    }

    /// Load one import reference and resolve its own imports.
    fn import(&mut self, reference: &str, entry: &[String]) -> Result<Node, ImportError> {
        let source = Source::classify(reference, &self.base_dir);
        let identity = source.identity();
        if self.chain.contains(&identity) {
            let mut chain = self.chain.clone();
            chain.push(identity);
            return Err(ImportError::Cycle { chain });
        }

        debug!("Importing `{reference}` at {}", display_entry(entry));
        let mut fragment =
            self.loader
                .load(&source)
                .map_err(|source| ImportError::Resolution {
                    reference: reference.to_string(),
                    entry: display_entry(entry),
                    source,
                })?;

        self.chain.push(identity);
        let result = self.resolve(&mut fragment, &[format!("<{reference}>")]);
        self.chain.pop();
        result?;
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DocumentFormat, MemoryLoader, parse_document};

    const HOST: &str = "https://cmds.example.com";

    fn yaml(text: &str) -> Node {
        parse_document(text, DocumentFormat::Yaml, "test").unwrap()
    }

    fn resolve(loader: MemoryLoader, text: &str) -> Result<Node, ImportError> {
        let mut node = yaml(text);
        let mut resolver = Resolver::new(loader, "/work");
        resolver.resolve_document(&Source::Local(PathBuf::from("/work/.cmd.yaml")), &mut node)?;
        Ok(node)
    }

    fn url(name: &str) -> String {
        format!("{HOST}/{name}")
    }

    #[test]
    fn test_no_imports_is_identity() {
        let text = r#"
from: /proj
commands:
  - name: build
    action: build.sh
    commands:
      - name: sub
        action: sub.sh
"#;
        assert_eq!(resolve(MemoryLoader::new(), text).unwrap(), yaml(text));
    }

    #[test]
    fn test_shallow_merge_import_wins() {
        let loader = MemoryLoader::new().with(url("x.yaml"), "b: 3\nc: 4\n");
        let node = resolve(
            loader,
            &format!("a: 1\nb: 2\nimports: [{}]\n", url("x.yaml")),
        )
        .unwrap();
        assert_eq!(node, yaml("a: 1\nb: 3\nc: 4\n"));
        let keys: Vec<&str> = node
            .as_mapping()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_later_imports_override_earlier() {
        let loader = MemoryLoader::new()
            .with(url("one.yaml"), "name: one\nfrom: /one\n")
            .with(url("two.yaml"), "name: two\n");
        let node = resolve(
            loader,
            &format!(
                "name: host\nimports:\n  - {}\n  - {}\n",
                url("one.yaml"),
                url("two.yaml")
            ),
        )
        .unwrap();
        assert_eq!(node, yaml("name: two\nfrom: /one\n"));
    }

    #[test]
    fn test_sequence_splice_and_flatten() {
        let loader = MemoryLoader::new().with(url("x.yaml"), "- name: a\n- name: b\n");
        let node = resolve(
            loader,
            &format!(
                "commands:\n  - imports: {}\n  - name: y\n",
                url("x.yaml")
            ),
        )
        .unwrap();
        assert_eq!(
            node,
            yaml("commands:\n  - name: a\n  - name: b\n  - name: y\n")
        );
    }

    #[test]
    fn test_sequence_import_of_single_mapping() {
        let loader = MemoryLoader::new().with(url("one.yaml"), "name: one\naction: one.sh\n");
        let node = resolve(
            loader,
            &format!(
                "commands:\n  - name: first\n  - imports: {}\n",
                url("one.yaml")
            ),
        )
        .unwrap();
        assert_eq!(
            node,
            yaml("commands:\n  - name: first\n  - name: one\n    action: one.sh\n")
        );
    }

    #[test]
    fn test_nested_sequences_are_flattened() {
        let node = resolve(MemoryLoader::new(), "items:\n  - [a, [b, c]]\n  - d\n").unwrap();
        assert_eq!(node, yaml("items: [a, b, c, d]\n"));
    }

    #[test]
    fn test_transitive_imports() {
        let loader = MemoryLoader::new()
            .with(
                url("outer.yaml"),
                format!(
                    "- name: outer\n  commands:\n    - imports: {}\n",
                    url("inner.yaml")
                ),
            )
            .with(url("inner.yaml"), "- name: inner\n  action: inner.sh\n");
        let node = resolve(
            loader,
            &format!("commands:\n  - imports: {}\n", url("outer.yaml")),
        )
        .unwrap();
        assert_eq!(
            node,
            yaml(
                "commands:\n  - name: outer\n    commands:\n      - name: inner\n        action: inner.sh\n"
            )
        );
    }

    #[test]
    fn test_mapping_children_resolved_before_own_imports() {
        let loader = MemoryLoader::new()
            .with(url("child.yaml"), "- name: child\n")
            .with(url("meta.yaml"), "description: merged\n");
        let node = resolve(
            loader,
            &format!(
                "name: root\ncommands:\n  - imports: {}\nimports: {}\n",
                url("child.yaml"),
                url("meta.yaml")
            ),
        )
        .unwrap();
        assert_eq!(
            node,
            yaml("name: root\ncommands:\n  - name: child\ndescription: merged\n")
        );
    }

    #[test]
    fn test_empty_import_contributes_nothing() {
        let loader = MemoryLoader::new().with(url("empty.yaml"), "");
        let node = resolve(
            loader,
            &format!(
                "name: x\nimports: {0}\ncommands:\n  - imports: {0}\n  - name: y\n",
                url("empty.yaml")
            ),
        )
        .unwrap();
        assert_eq!(node, yaml("name: x\ncommands:\n  - name: y\n"));
    }

    #[test]
    fn test_missing_import_is_fatal() {
        let err = resolve(
            MemoryLoader::new(),
            &format!(
                "commands:\n  - name: ok\n  - imports: {}\n",
                url("missing.yaml")
            ),
        )
        .unwrap_err();
        match err {
            ImportError::Resolution {
                reference, entry, ..
            } => {
                assert_eq!(reference, url("missing.yaml"));
                assert_eq!(entry, "commands.1");
            }
            other => panic!("Expected Resolution error, got: {other:?}"),
        }
    }

    #[test]
    fn test_self_import_is_a_cycle() {
        let loader = MemoryLoader::new().with(
            url("self.yaml"),
            format!("- imports: {}\n", url("self.yaml")),
        );
        let err = resolve(
            loader,
            &format!("commands:\n  - imports: {}\n", url("self.yaml")),
        )
        .unwrap_err();
        match err {
            ImportError::Cycle { chain } => {
                assert_eq!(chain.last(), Some(&url("self.yaml")));
                assert_eq!(chain.len(), 3);
            }
            other => panic!("Expected Cycle error, got: {other:?}"),
        }
    }

    #[test]
    fn test_mutual_imports_are_a_cycle() {
        let loader = MemoryLoader::new()
            .with(url("a.yaml"), format!("imports: {}\n", url("b.yaml")))
            .with(url("b.yaml"), format!("imports: {}\n", url("a.yaml")));
        let err = resolve(loader, &format!("imports: {}\n", url("a.yaml"))).unwrap_err();
        assert!(matches!(err, ImportError::Cycle { .. }));
        assert!(err.to_string().contains("a.yaml -> "));
    }

    #[test]
    fn test_diamond_imports_are_allowed() {
        let loader = MemoryLoader::new()
            .with(url("shared.yaml"), "- name: shared\n")
            .with(
                url("left.yaml"),
                format!("- imports: {}\n", url("shared.yaml")),
            )
            .with(
                url("right.yaml"),
                format!("- imports: {}\n", url("shared.yaml")),
            );
        let node = resolve(
            loader,
            &format!(
                "commands:\n  - imports: [{}, {}]\n",
                url("left.yaml"),
                url("right.yaml")
            ),
        )
        .unwrap();
        assert_eq!(
            node,
            yaml("commands:\n  - name: shared\n  - name: shared\n")
        );
    }

    #[test]
    fn test_invalid_directive_shape() {
        let err = resolve(MemoryLoader::new(), "name: x\nimports:\n  path: a.yaml\n").unwrap_err();
        assert!(matches!(err, ImportError::InvalidImport { .. }));
    }

    #[test]
    fn test_sequence_merged_into_mapping_rejected() {
        let loader = MemoryLoader::new().with(url("list.yaml"), "- a\n- b\n");
        let err = resolve(loader, &format!("name: x\nimports: {}\n", url("list.yaml"))).unwrap_err();
        match err {
            ImportError::InvalidImport { reason, .. } => assert!(reason.contains("sequence")),
            other => panic!("Expected InvalidImport, got: {other:?}"),
        }
    }

    #[test]
    fn test_local_import_relative_to_base_dir() {
        let loader = MemoryLoader::new().with("/work/cmds/build.yaml", "- name: build\n");
        let node = resolve(loader, "commands:\n  - imports: cmds/build.yaml\n").unwrap();
        assert_eq!(node, yaml("commands:\n  - name: build\n"));
    }
}
