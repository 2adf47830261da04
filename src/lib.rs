//! Core implementation of cmdtree
//!
//! cmdtree assembles a CLI command tree from a declarative YAML (or JSON) document. Command
//! definitions may be split across local files and remote URLs through `imports` directives;
//! cmdtree splices every import into place, then rewrites each command's `action` into a path
//! under the directory its definition inherits through `from`.

use std::path::{Path, PathBuf};

use log::debug;

use crate::commands::inherit::{inherit_path, resolve_action_paths};
use crate::config_file::{ConfigError, find_config};
use crate::imports::Resolver;
use crate::node::Node;
use crate::source::{DocumentLoader, Loader, Source};

pub mod commands;
pub mod config_file;
pub mod imports;
pub mod logger;
pub mod node;
pub mod output;
pub mod source;

/// Load configuration from a file (or auto-detect), returning the assembled tree and the config file path.
///
/// A relative `config_file` resolves against `base_dir`, and so do relative import paths and a
/// missing root `from`. Without `config_file` the search starts in `base_dir` and walks up its
/// parents; a config found that way anchors relative paths at its own directory instead.
///
/// # Errors
///
/// Returns `ConfigError` if the config file is not found, cannot be parsed, or any
/// import fails to resolve.
pub fn load_config(
    config_file: Option<&str>,
    base_dir: &Path,
) -> Result<(Node, PathBuf), ConfigError> {
    load_config_with(config_file, base_dir, DocumentLoader::new())
}

/// Like [`load_config`], fetching every document through `loader`.
///
/// # Errors
///
/// Returns `ConfigError` if the config file is not found, cannot be parsed, or any
/// import fails to resolve.
pub fn load_config_with<L: Loader>(
    config_file: Option<&str>,
    base_dir: &Path,
    loader: L,
) -> Result<(Node, PathBuf), ConfigError> {
    let (config_path, base_dir) = match config_file {
        Some(file) => {
            let config_path = inherit_path(base_dir, PathBuf::from(file));
            if !config_path.exists() {
                return Err(ConfigError::ConfigNotFound(config_path));
            }
            (config_path, base_dir.to_path_buf())
        }
        None => {
            let config_path = find_config(base_dir)?;
            let config_dir = config_path
                .parent()
                .map_or_else(|| base_dir.to_path_buf(), Path::to_path_buf);
            (config_path, config_dir)
        }
    };
    debug!(
        "Assembling command tree from {} (base dir: {})",
        config_path.display(),
        base_dir.display()
    );

    let source = Source::Local(config_path.clone());
    let mut resolver = Resolver::new(loader, base_dir.as_path());
    let mut root = resolver.loader().load(&source)?;
    resolver.resolve_document(&source, &mut root)?;
    resolve_action_paths(&mut root, &base_dir);
    Ok((root, config_path))
}
