//! HEALTH command - Check that the server is up.

use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use super::{HumanReadable, make_request, output};

/// Response from `GET /health`.
#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

impl HumanReadable for HealthResponse {
    fn print_human(&self) {
        let status = if self.status == "healthy" {
            self.status.green().bold()
        } else {
            self.status.red().bold()
        };
        println!("{} {}", self.service, status);
    }
}

/// Execute the health command.
pub async fn execute(client: &reqwest::Client, base_url: &str, human: bool) -> Result<()> {
    let url = format!("{}/health", base_url);

    let response: HealthResponse = make_request(client.get(&url)).await?;

    output(&response, human)
}
