use anyhow::Context;
use clap::{Parser, Subcommand};
use hybridrag_core::{Document, RagConfig, SearchParams};
use hybridrag_memory::{LocalEmbedding, SimpleTokenizer};
use hybridrag_pipeline::RetrievalService;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hybridrag", about = "Hybrid dense + lexical retrieval over local files")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "hybridrag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file into chunks and print them as JSON
    Chunk {
        file: PathBuf,
        /// Document type (qa, project, experience, text, ...)
        #[arg(long = "type")]
        doc_type: Option<String>,
    },
    /// Index files in memory and run one query
    Search {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(short, long)]
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        threshold: Option<f32>,
        /// Dense weight in [0, 1]
        #[arg(long)]
        weight: Option<f32>,
        /// Document type applied to every file
        #[arg(long = "type")]
        doc_type: Option<String>,
        /// Include dense and lexical sub-scores
        #[arg(long)]
        explain: bool,
    },
    /// Index files in memory and print store statistics
    Stats {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long = "type")]
        doc_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let tokenizer = Arc::new(SimpleTokenizer::from_flag(config.lexical.remove_stopwords));
    let embedder = Arc::new(LocalEmbedding::from_config(&config.embedding).with_tokenizer(tokenizer));
    let service = RetrievalService::from_config(&config, embedder)?;

    match cli.command {
        Commands::Chunk { file, doc_type } => {
            let doc = read_document(&file, doc_type.as_deref())?;
            let chunks = service.chunk_document(&doc, None)?;
            println!("{}", serde_json::to_string_pretty(&chunks)?);
        }
        Commands::Search {
            paths,
            query,
            top_k,
            threshold,
            weight,
            doc_type,
            explain,
        } => {
            ingest_all(&service, &paths, doc_type.as_deref()).await?;

            let defaults = service.default_params();
            let params = SearchParams::new(
                top_k.unwrap_or(defaults.top_k),
                threshold.unwrap_or(defaults.similarity_threshold),
                weight.unwrap_or(defaults.hybrid_weight),
            );
            let (results, stats) = service.search_detailed(&query, &params).await?;

            let hits: Vec<serde_json::Value> = results
                .iter()
                .map(|hit| {
                    let chunk = &hit.result.chunk;
                    let mut value = json!({
                        "rank": hit.result.rank,
                        "score": hit.result.score,
                        "document_id": chunk.document_id,
                        "chunk_index": chunk.index,
                        "chunk_type": chunk.metadata.chunk_type,
                        "content": chunk.content,
                    });
                    if explain {
                        value["dense_score"] = json!(hit.dense_score);
                        value["lexical_score"] = json!(hit.lexical_score);
                    }
                    value
                })
                .collect();
            let output = json!({ "results": hits, "stats": stats });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Stats { paths, doc_type } => {
            ingest_all(&service, &paths, doc_type.as_deref()).await?;
            let stats = service.get_statistics().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

/// Config from `path`, or defaults when the file does not exist.
fn load_config(path: &Path) -> anyhow::Result<RagConfig> {
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return Ok(RagConfig::default());
    }
    RagConfig::load(path).with_context(|| format!("loading {}", path.display()))
}

fn read_document(path: &Path, doc_type: Option<&str>) -> anyhow::Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let doc = Document::new(content, path.display().to_string());
    Ok(match doc_type {
        Some(tag) => doc.with_field("document_type", tag),
        None => doc,
    })
}

async fn ingest_all(
    service: &RetrievalService,
    paths: &[PathBuf],
    doc_type: Option<&str>,
) -> anyhow::Result<()> {
    for path in paths {
        let doc = read_document(path, doc_type)?;
        if doc.content.trim().is_empty() {
            warn!(path = %path.display(), "Skipping empty file");
            continue;
        }
        let report = service.ingest(&doc, None).await?;
        info!(path = %path.display(), chunks = report.added_chunks, "Indexed file");
    }
    Ok(())
}
