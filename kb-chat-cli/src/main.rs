//! CLI entry point for kb-chat

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use kb_chat_agent::ChatAgent;
use kb_chat_core::config::{Config, ConfigLoader};
use kb_chat_core::knowledge::KnowledgeService;
use kb_chat_core::logging::init_logging;
use kb_chat_core::session::SessionStore;
use kb_chat_providers::GeminiClient;
use kb_chat_server::{run_server, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "kb-chat")]
#[command(about = "Knowledge-base chatbot backed by Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send a single message and print the reply
    Ask {
        /// Message to send
        #[arg(short, long)]
        message: String,
        /// Session id for conversation continuity
        #[arg(short, long)]
        session: Option<String>,
    },
    /// List Gemini models available to the configured API key
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    let config = config_loader
        .load()
        .with_context(|| format!("Failed to load config from {}", config_loader.config_dir().display()))?;
    let _log_guard = init_logging(&config.logging);

    match cli.command {
        Commands::Serve { host, port } => {
            info!("Starting server");
            run_serve(config, host, port).await?;
        }
        Commands::Ask { message, session } => {
            info!("Processing message: {}", message);
            run_ask(&config, &message, session).await?;
        }
        Commands::Models => {
            run_models(&config).await?;
        }
    }

    Ok(())
}

/// Build the knowledge service and chat agent shared by `serve` and `ask`
async fn build_state(config: &Config) -> Result<AppState> {
    let knowledge = KnowledgeService::load(&config.knowledge.path)?;
    info!(
        "Loaded {} knowledge entries from {}",
        knowledge.entries().len(),
        config.knowledge.path
    );

    let provider = GeminiClient::connect(&config.gemini).await?;
    let sessions = Arc::new(SessionStore::new(config.sessions.max_history));
    let agent = ChatAgent::new(Arc::new(provider), sessions)
        .with_render_window(config.sessions.render_window)
        .with_timeout(Duration::from_secs(config.gemini.timeout_secs));

    Ok(AppState::new(
        Arc::new(agent),
        Arc::new(knowledge),
        config.knowledge.max_context_entries,
    ))
}

async fn run_serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let state = build_state(&config).await?;

    println!("{}", style("Starting kb-chat server...").bold().cyan());
    println!("Model: {}", state.agent.model());
    println!("Knowledge base: {}", config.knowledge.path);
    println!("Listening on: http://{}", addr);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                println!("\n{}", style("Shutting down...").yellow());
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    run_server(state, addr, shutdown_rx).await?;

    println!("{}", style("Server stopped.").green());
    Ok(())
}

async fn run_ask(config: &Config, message: &str, session: Option<String>) -> Result<()> {
    let state = build_state(config).await?;
    let session_id = session.unwrap_or_else(|| "cli".to_string());

    let context = state
        .knowledge
        .relevant_context(message, state.max_context_entries);

    println!("{}", style("Processing...").cyan());
    let reply = state
        .agent
        .respond_detailed(message, Some(&context), &session_id)
        .await;

    println!("\n{}", style("Response:").bold());
    println!("{}", reply.text());

    if reply.is_degraded() {
        anyhow::bail!("Generation failed in session {}", session_id);
    }
    Ok(())
}

async fn run_models(config: &Config) -> Result<()> {
    let client = GeminiClient::from_config(&config.gemini)?;
    let models = client.list_models().await?;

    println!("{}", style("Available Gemini models:").bold().cyan());
    println!("{}", "=".repeat(50));
    for model in &models {
        println!("\n{}", style(format!("Model: {}", model.name)).bold());
        println!(
            "  Display Name: {}",
            model.display_name.as_deref().unwrap_or("")
        );
        println!(
            "  Description: {}",
            model.description.as_deref().unwrap_or("")
        );
        println!(
            "  Supported Methods: {}",
            model.supported_methods.join(", ")
        );
    }

    let usable = models
        .iter()
        .filter(|m| m.supported_methods.iter().any(|s| s == "generateContent"))
        .count();
    println!(
        "\n{} of {} models support generateContent",
        style(usable).green(),
        models.len()
    );
    Ok(())
}
