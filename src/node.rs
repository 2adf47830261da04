//! Generic document tree used while assembling a command definition
//!
//! Every document, local or remote, is parsed into a [`Node`] before imports are spliced in.
//! The tree only knows about mappings, sequences and scalars; anchors, aliases, merge keys and
//! tags have already been discharged by the time a `Node` exists.

use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;

/// Ordered mapping with unique string keys
pub type Mapping = IndexMap<String, Node>;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Unsupported mapping key: {0} (only scalar keys are allowed)")]
    UnsupportedKey(String),
}

/// A single element of a document tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Mapping(Mapping),
    Sequence(Vec<Node>),
    Scalar(Scalar),
}

/// Leaf values of a document tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_yaml::Number),
    String(String),
}

impl Node {
    #[must_use]
    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    /// Returns the string value if this node is a string scalar
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(Scalar::String(value.to_string()))
    }
}

/// Expands every sequence element into its parent, one level deep.
#[must_use]
pub fn flatten_once(items: Vec<Node>) -> Vec<Node> {
    let mut flattened = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Node::Sequence(inner) => flattened.extend(inner),
            other => flattened.push(other),
        }
    }
    flattened
}

fn key_to_string(key: Value) -> Result<String, NodeError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Tagged(tagged) => key_to_string(tagged.value),
        other @ (Value::Sequence(_) | Value::Mapping(_)) => Err(NodeError::UnsupportedKey(
            serde_yaml::to_string(&other)
                .map_or_else(|_| "<complex key>".to_string(), |s| s.trim().to_string()),
        )),
    }
}

impl TryFrom<Value> for Node {
    type Error = NodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Null => Node::null(),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Node::Scalar(Scalar::Number(n)),
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Sequence(items) => Node::Sequence(
                items
                    .into_iter()
                    .map(Node::try_from)
                    .collect::<Result<Vec<Node>, NodeError>>()?,
            ),
            Value::Mapping(map) => {
                let mut mapping = Mapping::with_capacity(map.len());
                for (key, value) in map {
                    mapping.insert(key_to_string(key)?, Node::try_from(value)?);
                }
                Node::Mapping(mapping)
            }
            // Tags carry no meaning for command definitions
            Value::Tagged(tagged) => Node::try_from(tagged.value)?,
        })
    }
}
