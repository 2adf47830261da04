use std::io::Write;
use std::process::ExitCode;

use clap::Args;

use cmdtree::node::Node;
use cmdtree::output::{OutputFormat, render};

#[derive(Args, Debug, Default)]
pub struct ResolveArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    format: OutputFormat,
}

/// Print the assembled tree.
///
/// # Errors
///
/// Returns an error if rendering or writing to stdout fails.
pub fn run(args: &ResolveArgs, config: &Node) -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Render fully before writing so a failure never leaves partial output
    let text = render(config, args.format)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}
