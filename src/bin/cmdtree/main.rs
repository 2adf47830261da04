mod list;
mod resolve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use cmdtree::commands::inherit::inherit_path;
use cmdtree::config_file::working_directory;
use cmdtree::load_config;

#[derive(Parser, Debug)]
#[command(
    name = "cmdtree",
    about = "Assemble a command tree from split and remote definitions"
)]
struct Cli {
    /// Path to config file (auto-detected if not specified)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory to search for the config and resolve relative paths against (defaults to the working directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Log file path (enables file logging in addition to stderr)
    #[arg(long)]
    log_file: Option<String>,

    /// Show debug logs
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the fully merged command tree (default)
    Resolve(resolve::ResolveArgs),
    /// List every command with its resolved action
    List,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_ref()
        .map(std::fs::File::create)
        .transpose()?;
    cmdtree::logger::init(cli.verbose, log_file)?;

    let cwd = working_directory()?;
    let base_dir = match cli.base_dir {
        Some(dir) => inherit_path(&cwd, dir),
        None => cwd,
    };

    let (config, _) = load_config(cli.config.as_deref(), &base_dir)?;

    match cli.command {
        Some(Commands::Resolve(ref args)) => resolve::run(args, &config),
        Some(Commands::List) => list::run(&config),
        None => resolve::run(&resolve::ResolveArgs::default(), &config),
    }
}
