use std::io::Write;
use std::process::ExitCode;

use cmdtree::commands::walk::{CommandListing, walk_commands};
use cmdtree::node::Node;

/// Print one line per command: its name path, then its action if it has one.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run(config: &Node) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut listing = CommandListing::default();
    walk_commands(config, &mut listing);

    let mut stdout = std::io::stdout().lock();
    for entry in &listing.entries {
        match entry.action {
            Some(ref action) => writeln!(stdout, "{}\t{action}", entry.path.join(" "))?,
            None => writeln!(stdout, "{}", entry.path.join(" "))?,
        }
    }
    Ok(ExitCode::SUCCESS)
}
