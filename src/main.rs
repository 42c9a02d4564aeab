#![cfg_attr(test, recursion_limit = "256")]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod config;
mod error;
mod export;
mod ui;
mod validators;
mod version;

mod auth;
mod client;
mod employees;
mod refresh;
mod session;
mod store;

#[cfg(test)]
mod tests;

use cli::CliHandler;
use version::CURRENT_VERSION;

#[derive(Parser)]
#[command(
    name = "kardex",
    about = "Command-line client for the Kardex HR employee records API",
    long_about = "Kardex - Employee records client

OVERVIEW:
  This tool manages employee records against the Kardex HR backend.

WORKFLOW:
  1. Login with your credentials
  2. List, inspect and edit employee records
  3. Export rosters to CSV

QUICK START:
  kardex login                          # Authenticate with username/password
  kardex list --search garcia           # Find employees
  kardex show 42                        # Full record for one employee
  kardex create --file empleado.json    # Create from a JSON file
  kardex export --output roster.csv     # Export the active roster
  kardex status                         # Check session and endpoint",
    version = CURRENT_VERSION,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Login with username and password
    Login(LoginArgs),

    /// Logout and discard the stored session
    Logout,

    /// Show session status
    #[command(aliases = &["st"])]
    Status,

    /// List employees
    #[command(aliases = &["ls"])]
    List(ListArgs),

    /// Show one employee record
    Show(ShowArgs),

    /// Create an employee from a JSON file
    Create(CreateArgs),

    /// Update an employee from a JSON file
    Update(UpdateArgs),

    /// Delete an employee record
    #[command(aliases = &["rm"])]
    Remove(RemoveArgs),

    /// Export employees to CSV
    Export(ExportArgs),

    /// Configure settings
    #[command(aliases = &["cfg"])]
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct LoginArgs {
    /// Username; prompted for when omitted
    pub username: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Free-text search over name, employee number and identifiers
    #[arg(short, long)]
    pub search: Option<String>,

    /// Sort field, prefix with - for descending
    #[arg(long)]
    pub ordering: Option<String>,

    /// Filter by department id
    #[arg(long)]
    pub departamento: Option<u64>,

    /// Filter by position id
    #[arg(long)]
    pub puesto: Option<u64>,

    #[arg(long)]
    pub page: Option<u64>,

    #[arg(long)]
    pub page_size: Option<u64>,

    /// Show only inactive employees
    #[arg(long, conflicts_with = "all")]
    pub inactive: bool,

    /// Include both active and inactive employees
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: u64,
}

#[derive(Args)]
pub struct CreateArgs {
    /// JSON file with the new employee record
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: u64,

    /// JSON file with the fields to change
    #[arg(short, long)]
    pub file: PathBuf,

    /// Send a full replacement instead of a partial update
    #[arg(long)]
    pub replace: bool,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub id: u64,

    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file; defaults to empleados_<date>.csv
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub list: ListArgs,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    Show,
    SetEndpoint { url: String },
    SetTimeout { seconds: u64 },
    SetVerbose { enabled: String },
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(format!("kardex={}", log_level));
    subscriber.init();

    let mut handler = CliHandler::with_config_path(None);

    if let Err(e) = handler.execute(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
