//! UPDATE command - Change fields of an existing note.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use notes_core::NoteResponse;
use serde_json::{Map, Value};

use super::{make_request, note_url, output, print_note};

/// Arguments for the update command.
///
/// Only the fields given are sent; everything else is left as is.
#[derive(Args)]
pub struct UpdateArgs {
    /// Note ID
    pub id: String,

    /// New title
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// New body
    #[arg(long, short = 'c', conflicts_with = "clear_content")]
    pub content: Option<String>,

    /// Remove the body
    #[arg(long)]
    pub clear_content: bool,

    /// Replace the tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Remove all tags
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,

    /// New color as #RRGGBB
    #[arg(long, conflicts_with = "clear_color")]
    pub color: Option<String>,

    /// Remove the color
    #[arg(long)]
    pub clear_color: bool,

    /// Pin or unpin
    #[arg(long)]
    pub pinned: Option<bool>,
}

impl UpdateArgs {
    fn body(&self) -> Value {
        let mut body = Map::new();
        if let Some(title) = &self.title {
            body.insert("title".into(), title.clone().into());
        }
        if let Some(content) = &self.content {
            body.insert("content".into(), content.clone().into());
        } else if self.clear_content {
            body.insert("content".into(), Value::Null);
        }
        if !self.tags.is_empty() {
            body.insert("tags".into(), self.tags.clone().into());
        } else if self.clear_tags {
            body.insert("tags".into(), Value::Array(Vec::new()));
        }
        if let Some(color) = &self.color {
            body.insert("color".into(), color.clone().into());
        } else if self.clear_color {
            body.insert("color".into(), Value::Null);
        }
        if let Some(pinned) = self.pinned {
            body.insert("is_pinned".into(), pinned.into());
        }
        Value::Object(body)
    }
}

/// Execute the update command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: UpdateArgs,
) -> Result<()> {
    let body = args.body();
    if body.as_object().is_some_and(Map::is_empty) {
        bail!("nothing to update; pass at least one field option");
    }

    let url = note_url(base_url, &args.id)?;
    let note: NoteResponse = make_request(client.put(url).json(&body)).await?;

    if human {
        println!("{}", "Note updated successfully!".green().bold());
        println!();
        print_note(&note);
        Ok(())
    } else {
        output(&note, human)
    }
}
