use anyhow::Result;
use clap::{Parser, Subcommand};
use repo_rag::config::Config;
use repo_rag::indexer::Indexer;
use repo_rag::ollama::OllamaClient;
use repo_rag::retriever::Retriever;
use repo_rag::server::{self, AppState};
use repo_rag::store::InMemoryVectorStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Repo-RAG: index a source tree and answer questions grounded in the code
#[derive(Parser)]
#[command(name = "repo-rag")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "RAG service for source-code repositories", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default mode)
    Serve {
        /// Address to listen on, overriding the configuration
        #[arg(long)]
        listen: Option<String>,
    },

    /// Show version and configuration information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Version) => {
            show_version_info(&config);
            Ok(())
        }
        Some(Commands::Serve { listen }) => run_server(config, listen).await,
        None => run_server(config, None).await,
    }
}

async fn run_server(config: Config, listen: Option<String>) -> Result<()> {
    let model = Arc::new(OllamaClient::new(config.ollama.clone())?);
    let store = Arc::new(InMemoryVectorStore::new());

    let indexer = Indexer::new(store.clone(), model.clone(), config.indexing.clone());
    let retriever = Retriever::new(store, model, config.retrieval.clone());

    let state = AppState {
        indexer,
        retriever,
        indexing_config: config.indexing.clone(),
    };

    let addr = listen.unwrap_or_else(|| config.server.listen_addr.clone());
    server::serve(state, &addr).await
}

fn show_version_info(config: &Config) {
    println!("repo-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Model server:");
    println!("  Base URL:        {}", config.ollama.base_url);
    println!("  Embedding model: {}", config.ollama.embedding_model);
    println!("  Chat model:      {}", config.ollama.chat_model);
    println!(
        "  Fallback dim:    {}",
        config.ollama.fallback_embedding_dimension
    );
    println!();
    println!("Indexing:");
    println!("  Parallelism:     {}", config.indexing.max_parallelism);
    println!("  Batch size:      {}", config.indexing.embedding_batch_size);
    println!("  Max file size:   {} bytes", config.indexing.max_file_size);
    println!();
    println!("Configuration:");
    println!("  Priority:        Env vars > Config file > Defaults");
    println!("  Env prefix:      REPO_RAG_*");
    println!();
    println!("Chunkers:");
    println!("  C#:              syntax-tree chunks, one per method");
    println!("  SQL:             statement chunks with classification tags");
    println!("  Everything else: size-bounded line chunks");
}
