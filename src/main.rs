use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use quoting::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for quoting::AppCommand {
    fn from(cmd: Commands) -> quoting::AppCommand {
        match cmd {
            Commands::Server => quoting::AppCommand::Server,
            Commands::Client => quoting::AppCommand::Client,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve the current quotation on /quote
    Server,
    /// Fetch the current quotation from the server and save it to a file
    Client,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded first so RUST_LOG can come from the file.
    let env_file = dotenvy::dotenv();
    init_logging(cli.verbose);

    match env_file {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
    }

    let result = match cli.command {
        Some(Commands::Setup) => quoting::cli::setup::setup(),
        Some(cmd) => quoting::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
