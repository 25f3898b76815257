use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use restyle::config::Config;

mod cmd;

#[derive(Parser)]
#[command(name = "restyle")]
#[command(version, about = "AI interior design editing client")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base URL of the design API. Overrides RESTYLE_API_BASE and restyle.toml.
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Path to a restyle.toml config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a room image and apply an edit instruction
    Edit {
        /// Path to the room image
        #[arg(short, long)]
        image: PathBuf,

        /// The edit instruction, e.g. "paint the wall teal"
        prompt: Option<String>,

        /// Transcribe this audio file instead of a typed prompt
        #[arg(long, conflicts_with = "prompt")]
        audio: Option<PathBuf>,

        /// Project to record the version under
        #[arg(long)]
        project: Option<String>,
    },
    /// Transcribe an audio instruction to text
    Transcribe {
        /// Path to the audio file
        audio: PathBuf,
    },
    /// Create a public share link for a project version
    Share {
        #[arg(long)]
        project: String,
        #[arg(long)]
        version: String,
    },
    /// Fetch a shared view by its token
    View { token: String },
    /// Download a version's image to a local file
    Export {
        #[arg(long)]
        project: String,
        #[arg(long)]
        version: String,
        /// Output file path
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "restyle=debug" } else { "restyle=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::resolve(cli.api_base.as_deref(), cli.config.as_deref(), cli.verbose)?;

    match &cli.command {
        Commands::Edit {
            image,
            prompt,
            audio,
            project,
        } => {
            cmd::cmd_edit(
                &config,
                image,
                prompt.as_deref(),
                audio.as_deref(),
                project.as_deref(),
            )
            .await?;
        }
        Commands::Transcribe { audio } => {
            cmd::cmd_transcribe(&config, audio).await?;
        }
        Commands::Share { project, version } => {
            cmd::cmd_share(&config, project, version).await?;
        }
        Commands::View { token } => {
            cmd::cmd_view(&config, token).await?;
        }
        Commands::Export {
            project,
            version,
            out,
        } => {
            cmd::cmd_export(&config, project, version, out).await?;
        }
    }

    Ok(())
}
