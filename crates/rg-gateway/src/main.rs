//! rg-gateway: Reply Gateway Main Binary
//!
//! Usage:
//!   rg-gateway           - Start the HTTP server
//!   rg-gateway --help    - Show help
//!   rg-gateway --version - Show version

use rg_api::{Orchestrator, start_server};
use rg_core::{Config, LlmClient, PersonaPrompt, SqliteMessageStore};
use rg_schedule::{EvictionScheduler, EvictionTrigger};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// HTTP server
    Server,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args() {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("rg-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting rg-gateway...");

    run_server(config).await
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("rg-gateway - LLM reply gateway");
    println!();
    println!("Usage:");
    println!("  rg-gateway           Start the HTTP server");
    println!("  rg-gateway --help    Show this help message");
    println!("  rg-gateway --version Show version");
    println!();
    println!("Environment Variables:");
    println!("  LLM_API_KEY             API key (required; OPENAI_API_KEY also accepted)");
    println!("  LLM_PROVIDER            Provider: openai or claude (default: openai)");
    println!("  LLM_MODEL               Model name (default: gpt-5)");
    println!("  LLM_BASE_URL            Custom API endpoint");
    println!("  LLM_TIMEOUT_SECS        Completion timeout (default: 60)");
    println!("  LLM_MAX_TOKENS          Reply token limit (default: 1024)");
    println!("  PORT                    HTTP port (default: 8080; API_PORT also accepted)");
    println!("  DB_PATH                 SQLite file (default: data/reply-gateway.db)");
    println!("  EVICTION_INTERVAL_SECS  History eviction interval (default: 86400)");
    println!("  EVICTION_CRON           Cron expression, overrides the interval");
    println!("  PROMPT_TEMPLATE_PATH    Persona template file");
    println!();
    println!("Settings may also be given in ./reply-gateway.toml.");
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let store = Arc::new(
        SqliteMessageStore::new(&config.history.db_path)
            .map_err(|e| anyhow::anyhow!("Failed to open history store: {}", e))?,
    );
    tracing::info!("History store: {}", config.history.db_path);

    let client = Arc::new(
        LlmClient::new(&config.llm)
            .map_err(|e| anyhow::anyhow!("Failed to create LLM client: {}", e))?,
    );
    tracing::info!("LLM provider: {:?}, model: {}", client.provider(), client.model());

    let prompt = PersonaPrompt::load(config.prompt.template_path.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load persona prompt: {}", e))?;

    let trigger = EvictionTrigger::from_config(&config.eviction)
        .map_err(|e| anyhow::anyhow!("Invalid eviction schedule: {}", e))?;
    tracing::info!("History eviction: {}", trigger);

    let scheduler = Arc::new(EvictionScheduler::new());
    scheduler.start().await?;

    let orchestrator = Orchestrator::new(store, client, Arc::clone(&scheduler), trigger, prompt)
        .with_completion_timeout(config.llm.timeout());

    tracing::info!("rg-gateway initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    let served = start_server(config.api.port, Arc::new(orchestrator), shutdown_signal()).await;

    tracing::info!("Stopping eviction scheduler...");
    scheduler.stop().await;

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        // Keep serving
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
