//! Quill application binary - composition root.
//!
//! Ties the Quill crates into a single executable:
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Install tracing (stderr, so REPL output on stdout stays clean)
//! 3. Connect the generation and embedding clients to the model server
//! 4. Run the chat REPL, the document REPL, or the HTTP API

mod cli;
mod repl;

use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use quill_api::{start_server, AppState};
use quill_chat::ChatSession;
use quill_core::config::QuillConfig;
use quill_docs::DocumentSession;
use quill_llm::{DynGenerationClient, OllamaClient};
use quill_vector::{DynEmbeddingService, OllamaEmbedding};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Loaded before tracing so its log level can apply; problems
    // are reported once the subscriber is up.
    let config_file = args.resolve_config_path();
    let loaded = QuillConfig::load_if_exists(&config_file);
    let mut config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => QuillConfig::default(),
    };

    // Tracing.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(args.resolve_log_level(&config)))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Quill v{}", env!("CARGO_PKG_VERSION"));
    let path = config_file.display();
    match loaded {
        Ok(Some(_)) => tracing::info!(path = %path, "Configuration loaded"),
        Ok(None) => tracing::info!(path = %path, "No configuration file, using defaults"),
        Err(e) => tracing::warn!(
            path = %path,
            error = %e,
            "Failed to load configuration. Using defaults."
        ),
    }

    args.apply_overrides(&mut config)?;
    config.validate()?;

    // Model server clients.
    let client: Arc<dyn DynGenerationClient> = Arc::new(OllamaClient::new(&config.model)?);
    tracing::info!(
        model = %config.model.name,
        base_url = %config.model.base_url,
        "Generation client ready"
    );

    match args.command {
        Command::Chat => {
            let mut session = ChatSession::from_config(&config.chat, client);
            let stdin = BufReader::new(tokio::io::stdin());
            repl::run_chat(&mut session, stdin, &mut std::io::stdout()).await?;
        }
        Command::Docs { file } => {
            let mut session = build_docs(&config, client)?;
            if let Some(path) = file {
                let report = repl::ingest_file(&mut session, &path).await?;
                repl::print_report(&mut std::io::stdout(), &report)?;
            }
            let stdin = BufReader::new(tokio::io::stdin());
            repl::run_docs(&mut session, stdin, &mut std::io::stdout()).await?;
        }
        Command::Serve { .. } => {
            let chat = ChatSession::from_config(&config.chat, Arc::clone(&client));
            let docs = build_docs(&config, client)?;
            let state = AppState::new(config.clone(), chat, docs);

            if let Err(e) = start_server(&config, state).await {
                tracing::error!(
                    host = %config.server.host,
                    port = config.server.port,
                    error = %e,
                    "API server stopped. Is another instance running?"
                );
                return Err(e.into());
            }
        }
    }

    Ok(())
}

fn build_docs(
    config: &QuillConfig,
    client: Arc<dyn DynGenerationClient>,
) -> Result<DocumentSession, quill_core::QuillError> {
    let embedder: Arc<dyn DynEmbeddingService> = Arc::new(OllamaEmbedding::from_config(config)?);
    tracing::info!(
        model = %config.embedding_model(),
        storage_dir = %config.documents.storage_dir,
        "Document session ready"
    );
    DocumentSession::from_config(config, client, embedder)
}
