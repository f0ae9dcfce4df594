//! Command implementations for the notes CLI.
//!
//! Each command module provides:
//! - Args struct for clap argument parsing
//! - execute() function that performs the command
//! - Human-readable and JSON output formatting

pub mod create;
pub mod delete;
pub mod get;
pub mod health;
pub mod list;
pub mod update;

use anyhow::Result;
use colored::Colorize;
use notes_core::NoteResponse;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;

/// Common error type for HTTP requests.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error ({status}) {code}: {message}")]
    Server {
        status: u16,
        code: String,
        message: String,
    },
}

/// Build an HTTP client, optionally configured with a Bearer token.
pub fn build_client(token: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    if let Some(token) = token {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| anyhow::anyhow!("Invalid token value: {}", e))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        builder = builder.default_headers(headers);
    }

    Ok(builder.build()?)
}

/// Print output in JSON or human-readable format.
pub fn output<T: Serialize + HumanReadable>(value: &T, human: bool) -> Result<()> {
    if human {
        value.print_human();
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Trait for types that can be printed in human-readable format.
pub trait HumanReadable {
    fn print_human(&self);
}

impl HumanReadable for NoteResponse {
    fn print_human(&self) {
        print_note(self);
    }
}

/// Print one note, as in `get` and after `create` / `update`.
pub fn print_note(note: &NoteResponse) {
    if note.is_pinned {
        println!("{} {}", "*".yellow(), note.title.bold());
    } else {
        println!("{}", note.title.bold());
    }
    println!("  {} {}", "ID:".cyan(), note.id);
    if !note.tags.is_empty() {
        println!("  {} {}", "Tags:".cyan(), note.tags.join(", "));
    }
    if let Some(color) = &note.color {
        println!("  {} {}", "Color:".cyan(), color);
    }
    println!("  {} {}", "Created:".cyan(), format_timestamp(&note.created_at));
    println!("  {} {}", "Updated:".cyan(), format_timestamp(&note.updated_at));
    if let Some(content) = &note.content {
        println!();
        for line in content.lines() {
            println!("  {}", line);
        }
    }
}

/// Send a request and decode a JSON success body.
pub async fn make_request<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, CliError> {
    let response = check_status(request.send().await?).await?;
    Ok(response.json::<T>().await?)
}

/// Send a request whose success response has no body.
pub async fn make_empty_request(request: reqwest::RequestBuilder) -> Result<(), CliError> {
    check_status(request.send().await?).await?;
    Ok(())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CliError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(server_error(status.as_u16(), &body))
}

/// Build a [`CliError::Server`] from an error body, JSON or not.
fn server_error(status: u16, body: &str) -> CliError {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let error = parsed.as_ref().and_then(|json| json.get("error"));

    let code = error
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut message = error
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or(body)
        .to_string();

    // Validation errors list each offending field.
    if let Some(details) = error.and_then(|e| e.get("details")).and_then(|d| d.as_array()) {
        for detail in details {
            if let (Some(field), Some(msg)) = (
                detail.get("field").and_then(|v| v.as_str()),
                detail.get("message").and_then(|v| v.as_str()),
            ) {
                message.push_str(&format!("\n  - {field}: {msg}"));
            }
        }
    }

    CliError::Server {
        status,
        code,
        message,
    }
}

/// URL of a single note. The id is percent-encoded as one path segment,
/// so ids containing `/`, `?` or `#` stay on the note route.
pub fn note_url(base_url: &str, id: &str) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(base_url)
        .map_err(|e| anyhow::anyhow!("Invalid server URL {base_url:?}: {e}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Server URL cannot have a path: {base_url}"))?
        .pop_if_empty()
        .extend(["api", "v1", "notes", id]);
    Ok(url)
}

/// Format a timestamp for human display.
pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Truncate a string for display, adding ellipsis if needed.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
