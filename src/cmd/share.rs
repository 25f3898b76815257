//! Sharing — `restyle share` and `restyle view`.

use anyhow::{Context, Result};
use console::style;

use restyle::api::ApiClient;
use restyle::config::Config;

/// Create a public share link for a project version.
pub async fn cmd_share(config: &Config, project_id: &str, version_id: &str) -> Result<()> {
    let client = ApiClient::new(config).context("Failed to build API client")?;
    let link = client
        .share_version(project_id, version_id)
        .await
        .context("Failed to create share link")?;
    println!("{} {}", style("Share link:").bold(), link.share_url);
    Ok(())
}

/// Fetch a shared view by token and print its contents.
pub async fn cmd_view(config: &Config, token: &str) -> Result<()> {
    let client = ApiClient::new(config).context("Failed to build API client")?;
    let view = client
        .fetch_shared(token)
        .await
        .context("Failed to fetch shared view")?;

    if let Some(original) = &view.original_image {
        println!("{} {}", style("Original:").bold(), original);
    }
    if let Some(edited) = &view.edited_image {
        println!("{} {}", style("Edited:").bold(), edited);
    }
    if let Some(plan) = &view.edit_plan {
        println!("{}", style("Edit plan:").bold());
        println!("{}", serde_json::to_string_pretty(&plan.0)?);
    }
    Ok(())
}
