//! Command tree handling on top of the generic document tree
//!
//! A command is a mapping with a `name`, an optional `from` base directory, an optional `action`
//! and optional child `commands`. Base directories cascade from the config root down through
//! every nesting level, while still allowing override at any level.

pub mod inherit;
pub mod walk;

/// Key holding a command's display name
pub const NAME: &str = "name";
/// Key holding the base directory that `action` resolves against
pub const FROM: &str = "from";
/// Key holding the executable script of a command
pub const ACTION: &str = "action";
/// Key holding child commands
pub const COMMANDS: &str = "commands";
