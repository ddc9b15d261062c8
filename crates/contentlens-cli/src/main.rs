mod app;
mod config;

use clap::{Parser, Subcommand};
use config::ContentLensConfig;
use contentlens_core::WorkflowState;
use contentlens_gateway::GatewayServer;
use contentlens_ingest::prepare_document;
use contentlens_orchestrator::WorkflowOptions;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "contentlens", about = "ContentLens: multi-agent media brief analysis")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "contentlens.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run the workflow once on a local file and print the resulting state
    Process {
        /// Document to analyze (pdf, docx, txt, png, jpg, jpeg)
        file: PathBuf,
        /// What to do with the document
        #[arg(short, long, default_value = "Analyze this document")]
        request: String,
        /// Stop after extraction
        #[arg(long)]
        extract_only: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = ContentLensConfig::load(&cli.config).await?;
    config.apply_env(|key| std::env::var(key).ok());

    let state = app::build_state(&config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{host}:{port}");

            let app = GatewayServer::build(state);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!(addr = %addr, "ContentLens API listening");
            axum::serve(listener, app).await?;
        }
        Commands::Process {
            file,
            request,
            extract_only,
        } => {
            let document = prepare_document(&state.loader, &file).await?;
            let initial = WorkflowState::new(document.text, request, document.source_lang);
            let options = WorkflowOptions { extract_only };

            match state.workflow.run(initial, options).await {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(failure) => {
                    println!("{}", serde_json::to_string_pretty(&failure)?);
                    anyhow::bail!("workflow failed: {}", failure.error);
                }
            }
        }
    }

    Ok(())
}
