//! LIST command - List your notes.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use notes_core::NoteResponse;
use serde::{Deserialize, Serialize};

use super::{HumanReadable, format_timestamp, make_request, output, truncate};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Only notes whose title, content, or tags contain this text
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    /// Page number, starting at 1
    #[arg(long)]
    pub page: Option<u32>,

    /// Notes per page
    #[arg(long)]
    pub page_size: Option<u32>,
}

/// Response from listing notes.
#[derive(Debug, Deserialize, Serialize)]
pub struct ListNotesResponse {
    pub items: Vec<NoteResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    #[serde(default)]
    pub total_pages: u64,
}

impl HumanReadable for ListNotesResponse {
    fn print_human(&self) {
        println!("{}", "Notes".green().bold());
        println!("{}", "=".repeat(80));
        println!();

        if self.items.is_empty() {
            println!("  {}", "(No notes)".dimmed());
            println!();
        }

        for note in &self.items {
            let pin = if note.is_pinned {
                "*".yellow()
            } else {
                " ".normal()
            };
            println!("  {} {}", pin, truncate(&note.title, 60).bold());
            println!("    {} {}", "ID:".cyan(), note.id);
            if !note.tags.is_empty() {
                println!("    {} {}", "Tags:".cyan(), note.tags.join(", "));
            }
            println!(
                "    {} {}",
                "Updated:".cyan(),
                format_timestamp(&note.updated_at)
            );
            if let Some(content) = &note.content {
                let first_line = content.lines().next().unwrap_or_default();
                println!("    {}", truncate(first_line, 70).dimmed());
            }
            println!();
        }

        println!(
            "  {} {} (page {} of {})",
            "Total:".cyan(),
            self.total,
            self.page,
            self.total_pages.max(1)
        );
        println!();
        println!("  {}", "* = pinned".dimmed());
    }
}

/// Execute the list command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: ListArgs,
) -> Result<()> {
    let url = format!("{}/api/v1/notes", base_url);

    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(query) = args.query {
        params.push(("query", query));
    }
    if let Some(page) = args.page {
        params.push(("page", page.to_string()));
    }
    if let Some(page_size) = args.page_size {
        params.push(("page_size", page_size.to_string()));
    }

    let response: ListNotesResponse = make_request(client.get(&url).query(&params)).await?;

    output(&response, human)
}
