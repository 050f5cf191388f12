use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use doc_retrieval_core::{
    extract_text_or_plain, format_context, source_basename, ChromaStore, Embedder, HashEmbedder,
    IngestionOptions, Metadata, RestEmbedder, RestEmbedderConfig, RetrievalPipeline,
    DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_TOP_K,
};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "doc-retrieval", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Chroma base URL
    #[arg(long, default_value = "http://localhost:8000")]
    chroma_url: String,

    /// Chroma collection name
    #[arg(long, default_value = "team_knowledge_base")]
    collection: String,

    /// Embedding backend
    #[arg(long, value_enum, default_value_t = EmbedderKind::Rest)]
    embedder: EmbedderKind,

    /// Hosted embedding endpoint (embedContent-style)
    #[arg(
        long,
        default_value = "https://generativelanguage.googleapis.com/v1beta/models/embedding-001:embedContent"
    )]
    embed_url: String,

    /// API key for the hosted embedding endpoint
    #[arg(long, env = "EMBEDDING_API_KEY")]
    embed_api_key: Option<String>,

    /// Embedding dimensionality
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    dimensions: usize,

    /// Target chunk size in characters
    #[arg(long, default_value_t = 500)]
    chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[arg(long, default_value_t = 100)]
    overlap: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmbedderKind {
    /// Hosted embedding endpoint over HTTP.
    Rest,
    /// Deterministic local hashing embedder, no network required.
    Hash,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a document (or a folder of documents) into the knowledge base.
    Ingest {
        /// Path to a single document (.txt, .md, .pdf).
        #[arg(long, conflicts_with = "folder")]
        file: Option<String>,
        /// Folder to ingest recursively.
        #[arg(long)]
        folder: Option<String>,
        /// Extra metadata stored with every chunk, as KEY=VALUE.
        #[arg(long = "metadata", value_name = "KEY=VALUE")]
        metadata: Vec<String>,
        /// Read files with unrecognised extensions as plain text instead
        /// of rejecting them.
        #[arg(long, default_value_t = false)]
        plain_text_fallback: bool,
    },
    /// Retrieve the most relevant chunks for a question.
    Query {
        /// Question text
        #[arg(long)]
        question: String,
        /// Number of chunks to return.
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Also print the assembled context blocks.
        #[arg(long, default_value_t = false)]
        show_context: bool,
    },
}

fn parse_metadata(entries: &[String]) -> anyhow::Result<Metadata> {
    let mut metadata = Metadata::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("metadata entry '{entry}' is not KEY=VALUE");
        };
        metadata.insert(key.to_string(), Value::from(value));
    }
    Ok(metadata)
}

fn build_embedder(cli: &Cli) -> anyhow::Result<Box<dyn Embedder + Send + Sync>> {
    match cli.embedder {
        EmbedderKind::Rest => {
            let embedder = RestEmbedder::new(RestEmbedderConfig {
                endpoint: cli.embed_url.clone(),
                api_key: cli.embed_api_key.clone(),
                dimensions: cli.dimensions,
            })
            .context("invalid embedding endpoint")?;
            Ok(Box::new(embedder))
        }
        EmbedderKind::Hash => Ok(Box::new(HashEmbedder {
            dimensions: cli.dimensions,
        })),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let embedder = build_embedder(&cli)?;
    let store = ChromaStore::new(&cli.chroma_url, &cli.collection, embedder.dimensions())
        .context("invalid chroma endpoint")?;

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "doc-retrieval boot"
    );

    match &cli.command {
        Command::Ingest {
            file,
            folder,
            metadata,
            plain_text_fallback,
        } => {
            let metadata = parse_metadata(metadata)?;
            store
                .ensure_collection()
                .await
                .context("unable to reach the chroma collection")?;

            let pipeline = RetrievalPipeline::new(
                embedder,
                store,
                IngestionOptions {
                    chunk_size: cli.chunk_size,
                    overlap: cli.overlap,
                },
            )
            .context("invalid chunking parameters")?;

            match (file, folder) {
                (Some(file), None) => {
                    let path = Path::new(file);
                    let count = if *plain_text_fallback {
                        let text =
                            extract_text_or_plain(path).context("unable to read document")?;
                        let source_id = source_basename(path)?;
                        pipeline.ingest_text(&source_id, &text, &metadata).await?
                    } else {
                        pipeline.ingest_file(path, &metadata).await?
                    };
                    println!("{count} chunks ingested from {file}");
                }
                (None, Some(folder)) => {
                    let report = pipeline.ingest_folder(Path::new(folder), &metadata).await?;

                    for skipped in &report.skipped {
                        warn!(
                            path = %skipped.path.display(),
                            reason = %skipped.reason,
                            "skipped document"
                        );
                    }
                    println!(
                        "{} chunks ingested from {folder} ({} files skipped)",
                        report.ingested,
                        report.skipped.len()
                    );
                }
                _ => bail!("exactly one of --file or --folder is required"),
            }
        }
        Command::Query {
            question,
            top_k,
            show_context,
        } => {
            let pipeline = RetrievalPipeline::new(
                embedder,
                store,
                IngestionOptions {
                    chunk_size: cli.chunk_size,
                    overlap: cli.overlap,
                },
            )
            .context("invalid chunking parameters")?;

            let hits = pipeline.retrieve(question, *top_k).await?;

            println!("question: {question}");
            if hits.is_empty() {
                println!("no matching chunks");
            }

            for hit in &hits {
                let source = hit
                    .metadata
                    .get("source")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let chunk_index = hit
                    .metadata
                    .get("chunk_index")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                println!("score={:.4} source={source} chunk_index={chunk_index}", hit.score);
                println!("  {}", hit.text);
            }

            if *show_context {
                println!("\ncontext:\n{}", format_context(&hits));
            }
        }
    }

    Ok(())
}
