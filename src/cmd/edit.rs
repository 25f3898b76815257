//! The edit pipeline — `restyle edit`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;

use restyle::api::ApiClient;
use restyle::config::Config;
use restyle::pipeline::{PipelineDriver, SubmitOutcome};
use restyle::session::{Session, Stage};
use restyle::stream::retry::RetryPolicy;
use restyle::stream::{StatusStream, WsConnector};
use restyle::ui::EditProgress;

/// Upload an image, submit an instruction (typed or transcribed from audio),
/// and drive the edit pipeline with live progress.
pub async fn cmd_edit(
    config: &Config,
    image: &Path,
    prompt: Option<&str>,
    audio: Option<&Path>,
    project_id: Option<&str>,
) -> Result<()> {
    let client = ApiClient::new(config).context("Failed to build API client")?;
    let session = Arc::new(Session::new());
    if let Some(project_id) = project_id {
        session.set_project_id(project_id);
    }

    // Bring the status stream up before any work so server-pushed progress
    // for this client identity is never missed.
    let connector = WsConnector::new(config, client.clone(), session.client_id());
    let stream = StatusStream::new(
        connector,
        Arc::clone(&session),
        RetryPolicy::fixed(config.reconnect_delay),
    );
    let stream_handle = stream.spawn();

    let progress = EditProgress::new().watch(session.subscribe());

    session.update_status(|s| {
        s.stage = Some(Stage::Uploading);
        s.progress = 0;
    });
    let uploaded = client
        .upload_image(image)
        .await
        .context("Image upload failed")?;
    session.set_image_id(&uploaded.image_id);
    session.update_status(|s| s.stage = None);

    // Voice flow: transcribe first, then submit like typed text.
    let instruction = match (prompt, audio) {
        (Some(text), _) => text.to_string(),
        (None, Some(audio)) => {
            let transcription = client
                .transcribe(audio)
                .await
                .context("Transcription failed")?;
            println!(
                "{} {}",
                style("Transcribed:").bold(),
                transcription.text
            );
            transcription.text
        }
        (None, None) => anyhow::bail!("Provide a prompt or --audio"),
    };

    let driver = PipelineDriver::new(Arc::new(client), Arc::clone(&session));
    let result = driver.submit_edit(&instruction).await;

    // On the success path the watcher has already observed the idle reset;
    // on failures the busy window can be too short for the watch channel to
    // surface, so stop it explicitly rather than waiting.
    progress.abort();
    let _ = progress.await;
    stream_handle.shutdown().await;

    match result.context("Edit failed")? {
        SubmitOutcome::Completed(version) => {
            println!("{} {}", style("✓").green().bold(), style("Edit complete").bold());
            println!("  {}", version.image_url);
            if let Some(seconds) = version.processing_time {
                println!("  rendered in {seconds:.1}s");
            }
            Ok(())
        }
        SubmitOutcome::NoImage => anyhow::bail!("No image bound to the session"),
        SubmitOutcome::Busy => anyhow::bail!("Another edit is already in flight"),
    }
}
