//! Version export — `restyle export`.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use restyle::api::ApiClient;
use restyle::config::Config;

/// Download a version's image payload to a local file.
pub async fn cmd_export(
    config: &Config,
    project_id: &str,
    version_id: &str,
    out: &Path,
) -> Result<()> {
    let client = ApiClient::new(config).context("Failed to build API client")?;
    let bytes = client
        .export_version(project_id, version_id)
        .await
        .context("Export failed")?;
    std::fs::write(out, &bytes)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!(
        "{} {} ({} bytes)",
        style("Exported to").bold(),
        out.display(),
        bytes.len()
    );
    Ok(())
}
