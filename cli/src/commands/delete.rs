//! DELETE command - Delete a note.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::{HumanReadable, make_empty_request, note_url, output};

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Note ID to delete
    pub id: String,

    /// Skip confirmation prompt (for non-interactive use)
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Result of a delete, for output.
#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
}

impl HumanReadable for DeleteResult {
    fn print_human(&self) {
        println!("{}", "Note deleted successfully!".green().bold());
        println!();
        println!("  {} {}", "ID:".cyan(), self.id);
    }
}

/// Execute the delete command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: DeleteArgs,
) -> Result<()> {
    // Confirmation prompt for interactive use
    if human && !args.yes {
        eprint!(
            "{} Are you sure you want to delete note {}? [y/N] ",
            "Warning:".yellow().bold(),
            args.id
        );

        use std::io::Write;
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            eprintln!("Aborted.");
            return Ok(());
        }
    }

    let url = note_url(base_url, &args.id)?;
    make_empty_request(client.delete(url)).await?;

    output(
        &DeleteResult {
            id: args.id,
            deleted: true,
        },
        human,
    )
}
