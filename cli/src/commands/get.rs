//! GET command - Show one note.

use anyhow::Result;
use clap::Args;
use notes_core::NoteResponse;

use super::{make_request, note_url, output};

/// Arguments for the get command.
#[derive(Args)]
pub struct GetArgs {
    /// Note ID
    pub id: String,
}

/// Execute the get command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: GetArgs,
) -> Result<()> {
    let url = note_url(base_url, &args.id)?;

    let note: NoteResponse = make_request(client.get(url)).await?;

    output(&note, human)
}
