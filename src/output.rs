//! Rendering of the assembled tree

use clap::ValueEnum;
use thiserror::Error;

use crate::node::Node;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unable to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Unable to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output document format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Render `node` as text in `format`, always ending with a newline.
///
/// # Errors
///
/// Returns `RenderError` if the tree contains values the format cannot represent.
pub fn render(node: &Node, format: OutputFormat) -> Result<String, RenderError> {
    let mut text = match format {
        OutputFormat::Yaml => serde_yaml::to_string(node)?,
        OutputFormat::Json => serde_json::to_string_pretty(node)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}
