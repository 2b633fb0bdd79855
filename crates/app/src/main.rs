use anyhow::Context;
use clap::Parser;
use pdf_qa_core::{
    ingest_folder_chunks, Embedder, GeminiEmbedder, GeminiGenerator, QueryEngine, RagConfig,
    Retriever, VectorStore,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa", version)]
struct Cli {
    /// Folder containing the source PDFs.
    #[arg(long, default_value = "./data")]
    pdf_dir: PathBuf,

    /// Directory holding the persisted vector store snapshot.
    #[arg(long, default_value = "./docs")]
    store_dir: PathBuf,

    /// Number of chunks retrieved as context per question.
    #[arg(long, default_value = "4")]
    top_k: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    // Credential check comes first; nothing below runs without it.
    let mut config = RagConfig::from_env().context("missing configuration")?;
    config.top_k = cli.top_k;

    let embedder = GeminiEmbedder::new(&config)?;

    if VectorStore::exists(&cli.store_dir) {
        println!("Using existing vector store at {}.", cli.store_dir.display());
    } else {
        println!("Vector store not found. Running ingestion...");
        let chunks = ingest_folder_chunks(&cli.pdf_dir, config.chunking)
            .context("ingestion failed")?;
        println!("Split corpus into {} chunk(s).", chunks.len());

        VectorStore::create(&cli.store_dir, chunks, &embedder)
            .await
            .context("could not persist vector store")?;
        println!("Ingestion and vector store persistence complete.");
    }

    println!("Loading vector store...");
    let store = VectorStore::load(&cli.store_dir, embedder.dimensions())?;
    info!(chunk_count = store.len(), "vector store loaded");

    let retriever = Retriever::new(store, embedder, config.top_k);
    let generator = GeminiGenerator::new(&config)?;
    let engine = QueryEngine::new(retriever, generator);

    let stdin = io::stdin();
    loop {
        print!("\nAsk a question (or type 'exit'): ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // stdin closed, same as an explicit exit
            println!();
            break;
        }

        let query = line.trim_end_matches(['\r', '\n']);
        if query.eq_ignore_ascii_case("exit") {
            println!("Exiting.");
            break;
        }

        let answer = engine.answer(query).await?;

        println!("\nAnswer:\n{}", answer.text);
        for source in &answer.sources {
            println!(
                "  [source] {} page {} (score {:.4})",
                source.chunk.title, source.chunk.page, source.score
            );
        }
    }

    Ok(())
}
