//! `docsight health`: check the analysis service.

use anyhow::Result;

use docsight_config::DocsightConfig;
use docsight_stream::ChatClient;

use crate::terminal_output::{note_error, note_success};

pub async fn run(config: &DocsightConfig) -> Result<()> {
    let client = ChatClient::new(config.base_url(), config.timeout())?;
    match client.health_check().await {
        Ok(status) => {
            note_success(&format!("{} is reachable", client.base_url()));
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Err(err) => {
            note_error(&format!("{}: {err:#}", client.base_url()));
            Err(err)
        }
    }
}
