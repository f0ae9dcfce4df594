//! CREATE command - Create a note.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use notes_core::NoteResponse;
use serde_json::{Map, Value};

use super::{make_request, output, print_note};

/// Arguments for the create command.
#[derive(Args)]
pub struct CreateArgs {
    /// Note title
    #[arg(long, short = 't')]
    pub title: String,

    /// Note body
    #[arg(long, short = 'c')]
    pub content: Option<String>,

    /// Tag to attach (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Color as #RRGGBB
    #[arg(long)]
    pub color: Option<String>,

    /// Pin the note
    #[arg(long)]
    pub pinned: bool,
}

impl CreateArgs {
    fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("title".into(), self.title.clone().into());
        if let Some(content) = &self.content {
            body.insert("content".into(), content.clone().into());
        }
        if !self.tags.is_empty() {
            body.insert("tags".into(), self.tags.clone().into());
        }
        if let Some(color) = &self.color {
            body.insert("color".into(), color.clone().into());
        }
        if self.pinned {
            body.insert("is_pinned".into(), true.into());
        }
        Value::Object(body)
    }
}

/// Execute the create command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: CreateArgs,
) -> Result<()> {
    let url = format!("{}/api/v1/notes", base_url);

    let note: NoteResponse = make_request(client.post(&url).json(&args.body())).await?;

    if human {
        println!("{}", "Note created successfully!".green().bold());
        println!();
        print_note(&note);
        Ok(())
    } else {
        output(&note, human)
    }
}
