use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use wws_cli::{
    Assistant, InputCommand, display_banner, handle_input_with_history, parse_input,
    print_answer, print_help, print_stats,
};
use wws_core::{Embedder, IndexingResult, LLMProvider, RAGEngine, VectorStore};
use wws_ollama::{OllamaClient, OllamaConfig};
use wws_rag::{HashEmbedder, LocalDocumentIndexer, LocalVectorStore, RagConfig, WaterWorksRAGEngine};

#[derive(Parser)]
#[command(name = "wws")]
#[command(about = "Question answering over the Water Works Supply Chain documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Ask a single question and exit
    #[arg(short, long)]
    question: Option<String>,

    /// Delete the vector index and ingest everything again
    #[arg(long, global = true)]
    rebuild: bool,

    /// Directory holding internal_docs/, product_docs/ and customer_reviews/
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory of the persisted vector index
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    /// Use local hash embeddings instead of the Ollama embedding model
    #[arg(long, global = true)]
    offline_embeddings: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest documents into the vector index and exit
    Ingest,
    /// Print index statistics and exit
    Stats,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut rag_config = RagConfig::from_env()?;
    if let Some(dir) = &cli.data_dir {
        rag_config.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.index_dir {
        rag_config.index_dir = dir.clone();
    }
    rag_config.validate()?;
    tracing::debug!(
        data_dir = %rag_config.data_dir.display(),
        index_dir = %rag_config.index_dir.display(),
        offline = cli.offline_embeddings,
        "configuration loaded"
    );

    let ollama_config = OllamaConfig::from_env()?;

    if cli.offline_embeddings {
        run(cli, rag_config, ollama_config, Arc::new(HashEmbedder::default())).await
    } else {
        let embedder = Arc::new(OllamaClient::new(ollama_config.clone())?);
        run(cli, rag_config, ollama_config, embedder).await
    }
}

async fn run<E: Embedder + 'static>(
    cli: Cli,
    rag_config: RagConfig,
    ollama_config: OllamaConfig,
    embedder: Arc<E>,
) -> Result<()> {
    let mut vector_store = LocalVectorStore::new(&rag_config.index_dir, embedder);

    // Statistics never create an index
    if matches!(cli.command, Some(Commands::Stats)) && !cli.rebuild && !vector_store.index_exists() {
        println!(
            "{} No vector index at {}; run `wws ingest` first",
            "ℹ️".blue(),
            vector_store.index_dir().display()
        );
        return Ok(());
    }

    // Open the index; a missing or corrupt directory comes back empty
    vector_store.connect().await?;
    if cli.rebuild {
        println!("{} Rebuilding vector index", "🧹".yellow());
        vector_store.rebuild().await?;
    }
    tracing::debug!(state = ?vector_store.index_state(), "vector index opened");
    let needs_ingestion = vector_store.needs_ingestion().await;
    let vector_store = Arc::new(vector_store);

    let indexer = LocalDocumentIndexer::new(vector_store.clone(), rag_config);
    let mut rag_engine = WaterWorksRAGEngine::new(vector_store.clone());
    rag_engine.initialize().await?;

    match cli.command {
        Some(Commands::Ingest) => {
            println!("{} Ingesting documents...", "📚".blue());
            let result = indexer.index_all().await?;
            print_ingestion_summary(&result);
            return Ok(());
        }
        Some(Commands::Stats) => {
            print_stats(&rag_engine.stats().await?);
            return Ok(());
        }
        None => {}
    }

    if needs_ingestion {
        println!("{} Building vector index...", "📚".blue());
        let result = indexer.index_all().await?;
        print_ingestion_summary(&result);
    }

    let mut llm = OllamaClient::new(ollama_config)?;
    llm.connect().await?;
    let model = llm.model_id().to_string();
    let assistant = Assistant::new(llm, rag_engine);

    if let Some(question) = cli.question {
        let answer = assistant.answer(&question).await?;
        print_answer(&answer);
        return Ok(());
    }

    // Interactive mode
    display_banner(&model, vector_store.count().await?);

    let mut history = Vec::new();

    loop {
        let input = handle_input_with_history(&mut history).await?;

        match parse_input(&input) {
            InputCommand::Quit => {
                println!("{}", "👋 Goodbye!".green());
                break;
            }
            InputCommand::Empty => continue,
            InputCommand::Help => print_help(),
            InputCommand::Stats => match assistant.stats().await {
                Ok(stats) => print_stats(&stats),
                Err(e) => println!("{} Failed to read statistics: {}", "❌".red(), e),
            },
            InputCommand::Question(question) => {
                println!("{} Thinking...", "🤖".blue());
                match assistant.answer(&question).await {
                    Ok(answer) => print_answer(&answer),
                    Err(e) => println!("{} Failed to answer: {}", "❌".red(), e),
                }
            }
        }
    }

    Ok(())
}

fn print_ingestion_summary(result: &IndexingResult) {
    println!(
        "{} Indexed {} documents ({} already present, {} failed)",
        "✅".green(),
        result.documents_indexed,
        result.documents_skipped,
        result.documents_failed
    );
    for error in &result.errors {
        println!("  {} {}", "•".yellow(), error);
    }
}
