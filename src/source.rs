//! Loading documents from local files or remote URLs

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde_yaml::Value;
use thiserror::Error;

use crate::commands::inherit::inherit_path;
use crate::node::{Node, NodeError};

/// Errors that can occur while loading a single document
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source not found: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to fetch {url}: {reason}")]
    Fetch {
        url: String,
        status: Option<u16>,
        reason: String,
    },
    #[error("Unable to parse YAML document {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Unable to parse JSON document {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unable to normalize document {origin}: {source}")]
    Shape {
        origin: String,
        #[source]
        source: NodeError,
    },
}

/// Text format of a document, picked from its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    #[must_use]
    pub fn from_reference(reference: &str) -> Self {
        let path = reference
            .split(['?', '#'])
            .next()
            .unwrap_or(reference)
            .to_ascii_lowercase();
        if path.ends_with(".json") {
            DocumentFormat::Json
        } else {
            DocumentFormat::Yaml
        }
    }
}

/// Where a document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Local(PathBuf),
    Remote(String),
}

/// Scheme of `reference` if it is shaped like `scheme://...`.
///
/// The authority may be empty, so `file:///etc/cmds.yaml` still has scheme `file`.
#[must_use]
pub fn url_scheme(reference: &str) -> Option<&str> {
    let (scheme, _) = reference.split_once("://")?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

/// Returns true if `reference` is an absolute URL rather than a filesystem path.
///
/// This check is purely syntactic: anything shaped like `scheme://...` is remote, whatever the
/// scheme. Unsupported schemes are rejected when the document is fetched.
#[must_use]
pub fn is_url(reference: &str) -> bool {
    url_scheme(reference).is_some()
}

impl Source {
    /// Classify an import reference, joining relative paths onto `base_dir`.
    #[must_use]
    pub fn classify(reference: &str, base_dir: &Path) -> Self {
        if is_url(reference) {
            Source::Remote(reference.to_string())
        } else {
            Source::Local(inherit_path(base_dir, PathBuf::from(reference)))
        }
    }

    /// Stable identity used to detect import cycles.
    #[must_use]
    pub fn identity(&self) -> String {
        match self {
            Source::Local(path) => path
                .canonicalize()
                .unwrap_or_else(|_| path.clone())
                .to_string_lossy()
                .into_owned(),
            Source::Remote(url) => url.clone(),
        }
    }

    #[must_use]
    pub fn origin(&self) -> String {
        match self {
            Source::Local(path) => path.display().to_string(),
            Source::Remote(url) => url.clone(),
        }
    }

    #[must_use]
    pub fn format(&self) -> DocumentFormat {
        DocumentFormat::from_reference(&self.origin())
    }
}

/// Something that can turn a [`Source`] into a normalized [`Node`] tree
pub trait Loader {
    /// Load and normalize the document behind `source`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the document cannot be read, fetched or parsed.
    fn load(&self, source: &Source) -> Result<Node, SourceError>;
}

/// Parse document text and discharge anchors, aliases and merge keys.
///
/// The parsed value is serialized and parsed again so that the resulting tree carries no
/// format-specific reference constructs.
///
/// # Errors
///
/// Returns `SourceError::Yaml`/`SourceError::Json` on malformed syntax, or
/// `SourceError::Shape` if a mapping uses a non-scalar key.
pub fn parse_document(
    text: &str,
    format: DocumentFormat,
    origin: &str,
) -> Result<Node, SourceError> {
    if text.trim().is_empty() {
        return Ok(Node::null());
    }
    let yaml_err = |source: serde_yaml::Error| SourceError::Yaml {
        origin: origin.to_string(),
        source,
    };
    let mut value: Value = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(yaml_err)?,
        DocumentFormat::Json => serde_json::from_str(text).map_err(|source| SourceError::Json {
            origin: origin.to_string(),
            source,
        })?,
    };
    value.apply_merge().map_err(yaml_err)?;
    let reserialized = serde_yaml::to_string(&value).map_err(yaml_err)?;
    let normalized: Value = serde_yaml::from_str(&reserialized).map_err(yaml_err)?;
    Node::try_from(normalized).map_err(|source| SourceError::Shape {
        origin: origin.to_string(),
        source,
    })
}

/// Loads local files from disk and remote documents over HTTP
pub struct DocumentLoader {
    agent: ureq::Agent,
}

impl DocumentLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    fn read_local(path: &Path) -> Result<String, SourceError> {
        std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                SourceError::NotFound {
                    path: path.to_path_buf(),
                    source,
                }
            } else {
                SourceError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
    }

    fn fetch_remote(&self, url: &str) -> Result<String, SourceError> {
        let scheme = url_scheme(url).unwrap_or_default().to_ascii_lowercase();
        if !matches!(scheme.as_str(), "http" | "https") {
            return Err(SourceError::Fetch {
                url: url.to_string(),
                status: None,
                reason: format!("unsupported scheme `{scheme}`"),
            });
        }

        let mut response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::StatusCode(code) => SourceError::Fetch {
                url: url.to_string(),
                status: Some(code),
                reason: format!("HTTP {code}"),
            },
            other => SourceError::Fetch {
                url: url.to_string(),
                status: None,
                reason: other.to_string(),
            },
        })?;
        response
            .body_mut()
            .read_to_string()
            .map_err(|e| SourceError::Fetch {
                url: url.to_string(),
                status: None,
                reason: e.to_string(),
            })
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader for DocumentLoader {
    fn load(&self, source: &Source) -> Result<Node, SourceError> {
        let text = match source {
            Source::Local(path) => {
                debug!("Reading {}", path.display());
                Self::read_local(path)?
            }
            Source::Remote(url) => {
                debug!("Fetching {url}");
                self.fetch_remote(url)?
            }
        };
        parse_document(&text, source.format(), &source.origin())
    }
}

/// Serves documents from memory, keyed by URL or path.
///
/// Local paths it does not hold are read from disk, remote URLs it does not hold answer 404.
/// Useful for embedding fixed fragments and for exercising remote imports without a network.
#[derive(Default, Clone)]
pub struct MemoryLoader {
    documents: HashMap<String, String>,
}

impl MemoryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(key.into(), text.into());
        self
    }
}

impl Loader for MemoryLoader {
    fn load(&self, source: &Source) -> Result<Node, SourceError> {
        let origin = source.origin();
        if let Some(text) = self.documents.get(&origin) {
            return parse_document(text, source.format(), &origin);
        }
        match source {
            Source::Local(path) => {
                let text = DocumentLoader::read_local(path)?;
                parse_document(&text, source.format(), &origin)
            }
            Source::Remote(url) => Err(SourceError::Fetch {
                url: url.clone(),
                status: Some(404),
                reason: "HTTP 404".to_string(),
            }),
        }
    }
}
