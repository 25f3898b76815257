//! Audio transcription — `restyle transcribe`.

use std::path::Path;

use anyhow::{Context, Result};

use restyle::api::ApiClient;
use restyle::config::Config;

pub async fn cmd_transcribe(config: &Config, audio: &Path) -> Result<()> {
    let client = ApiClient::new(config).context("Failed to build API client")?;
    let transcription = client
        .transcribe(audio)
        .await
        .context("Transcription failed")?;
    println!("{}", transcription.text);
    Ok(())
}
