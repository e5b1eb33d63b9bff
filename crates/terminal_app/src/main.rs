use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use project_terminal::{logging, AgentConfig, Session};
use terminal_app::app::App;
use terminal_app::providers::{provider_for_id, search_backend, DEFAULT_PROVIDER_ID};
use tokio::io::BufReader;

#[derive(Parser)]
#[command(
    name = "project-terminal",
    version,
    about = "Terminal design assistant that edits a sandboxed project from fenced file operations"
)]
struct Cli {
    /// JSON config file (falls back to PROJECT_TERMINAL_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reasoning backend: anthropic or mock.
    #[arg(long, default_value = DEFAULT_PROVIDER_ID)]
    provider: String,

    /// Directory holding projects, backups and chat history.
    #[arg(long)]
    workspace: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = AgentConfig::load(cli.config.as_deref()).context("load configuration")?;
    if let Some(workspace) = cli.workspace {
        config.workspace_dir = Some(workspace);
    }
    tokio::fs::create_dir_all(config.workspace_dir())
        .await
        .with_context(|| format!("create workspace {}", config.workspace_dir().display()))?;

    let backend = provider_for_id(&cli.provider, &config)?;
    let search = search_backend(&config)?;
    let profile = backend.profile();
    tracing::info!(
        provider = %profile.provider_id,
        model = %profile.model_id,
        search = search.is_some(),
        "starting session"
    );

    let session = Session::from_config(&config, backend, search);
    let mut app = App::new(session, std::io::stdout());

    let cancel = app.cancel_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            cancel.notify_waiters();
        }
    });

    app.run(BufReader::new(tokio::io::stdin()))
        .await
        .context("terminal session")?;
    Ok(())
}
