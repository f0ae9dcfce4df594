//! Command-line client for the Notes API.
//!
//! Commands:
//! - list: List your notes, with search and pagination
//! - get: Show one note
//! - create: Create a note
//! - update: Change fields of a note
//! - delete: Delete a note
//! - health: Check that the server is up
//!
//! Configuration via environment:
//! - NOTES_URL: Base URL of the notes server (default: http://localhost:8000)
//! - NOTES_TOKEN: ID token sent as `Authorization: Bearer <token>`

mod commands;

use clap::{Parser, Subcommand};

use commands::{
    create::CreateArgs, delete::DeleteArgs, get::GetArgs, list::ListArgs, update::UpdateArgs,
};

/// Notes API CLI
///
/// Output is JSON by default; pass --human for formatted text.
#[derive(Parser)]
#[command(name = "notes")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output human-readable formatted text instead of JSON
    #[arg(long, global = true)]
    human: bool,

    /// Notes server URL
    #[arg(
        long,
        env = "NOTES_URL",
        default_value = "http://localhost:8000",
        global = true
    )]
    url: String,

    /// ID token for authentication
    #[arg(long, env = "NOTES_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List your notes
    List(ListArgs),

    /// Show a single note
    Get(GetArgs),

    /// Create a new note
    Create(CreateArgs),

    /// Update fields of an existing note
    Update(UpdateArgs),

    /// Delete a note
    Delete(DeleteArgs),

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let client = match commands::build_client(cli.token.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let base_url = cli.url.trim_end_matches('/');
    let result = match cli.command {
        Commands::List(args) => commands::list::execute(&client, base_url, cli.human, args).await,
        Commands::Get(args) => commands::get::execute(&client, base_url, cli.human, args).await,
        Commands::Create(args) => {
            commands::create::execute(&client, base_url, cli.human, args).await
        }
        Commands::Update(args) => {
            commands::update::execute(&client, base_url, cli.human, args).await
        }
        Commands::Delete(args) => {
            commands::delete::execute(&client, base_url, cli.human, args).await
        }
        Commands::Health => commands::health::execute(&client, base_url, cli.human).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
