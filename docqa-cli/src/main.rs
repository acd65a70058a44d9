use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use docqa_rag::config::{DEFAULT_COLLECTION, DEFAULT_DOCUMENTS_DIR, DEFAULT_VECTOR_DB_PATH};
use docqa_rag::loader::DEFAULT_EXTENSIONS;
use docqa_rag::{Answer, Provider, RagConfig, Settings, setup};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_QUESTION: &str = "Tell me about the SpaceX Starship launch.";

#[derive(Parser, Debug)]
#[command(
    name = "docqa",
    version,
    about = "Ingest a folder of .txt files into a local vector store and answer a question from it"
)]
struct Args {
    /// Hosted model provider (google or openai)
    #[arg(long, env = "RAG_PROVIDER", default_value = "google")]
    provider: Provider,

    /// API key; defaults to GOOGLE_API_KEY or OPENAI_API_KEY for the chosen provider
    #[arg(long)]
    api_key: Option<String>,

    /// Directory holding the documents to ingest
    #[arg(long, env = "DOCUMENTS_DIR", default_value = DEFAULT_DOCUMENTS_DIR)]
    docs_dir: PathBuf,

    /// Directory of the persistent vector store
    #[arg(long, env = "VECTOR_DB_PATH", default_value = DEFAULT_VECTOR_DB_PATH)]
    db_path: PathBuf,

    /// Collection that chunks are stored in and retrieved from
    #[arg(long, env = "RAG_COLLECTION", default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Question to answer
    #[arg(long, default_value = DEFAULT_QUESTION)]
    question: String,

    /// Number of chunks retrieved as context
    #[arg(long, default_value_t = docqa_rag::config::DEFAULT_TOP_K)]
    top_k: usize,

    /// Chunk length in characters
    #[arg(long, default_value_t = docqa_rag::chunking::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, default_value_t = docqa_rag::chunking::DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,

    /// Embedding model; defaults to the provider's
    #[arg(long, env = "RAG_EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Chat model; defaults to the provider's
    #[arg(long, env = "RAG_CHAT_MODEL")]
    chat_model: Option<String>,

    /// Send the question straight to the chat model, without ingestion or retrieval
    #[arg(long, default_value_t = false)]
    direct: bool,

    /// Query the existing store without ingesting the documents again
    #[arg(long, default_value_t = false)]
    skip_ingest: bool,
}

impl Args {
    fn into_settings(self) -> Result<(Settings, RunOptions)> {
        let provider = self.provider;
        let mut settings = Settings::new(provider);
        settings.api_key = self.api_key.or_else(|| std::env::var(provider.api_key_var()).ok());
        if let Some(model) = self.embedding_model {
            settings.embedding_model = model;
        }
        if let Some(model) = self.chat_model {
            settings.chat_model = model;
        }
        settings.documents_dir = self.docs_dir;
        settings.vector_db_path = self.db_path;
        settings.collection = self.collection;
        settings.rag = RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .build()
            .context("invalid chunking options")?;

        let options = RunOptions {
            question: self.question,
            direct: self.direct,
            skip_ingest: self.skip_ingest,
        };
        Ok((settings, options))
    }
}

struct RunOptions {
    question: String,
    direct: bool,
    skip_ingest: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn print_answer(answer: &Answer) {
    println!("\n==== Final Answer ====");
    println!("{}", answer.text);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let (settings, options) = Args::parse().into_settings()?;
    let qa = setup::document_qa(&settings).await?;

    if options.direct {
        let answer = qa.ask_direct(&options.question).await;
        print_answer(&answer);
        return Ok(());
    }

    if options.skip_ingest {
        info!(collection = %settings.collection, "skipping ingestion");
    } else {
        println!(
            "==== Loading documents from directory: {} ====",
            settings.documents_dir.display()
        );
        let chunks = qa
            .ingest_directory(&settings.documents_dir, DEFAULT_EXTENSIONS)
            .await
            .with_context(|| format!("failed to ingest {}", settings.documents_dir.display()))?;
        println!("==== Stored {} chunks in '{}' ====", chunks.len(), settings.collection);
    }

    let relevant_chunks = qa
        .query_documents(&options.question, settings.rag.top_k)
        .await
        .context("failed to retrieve context")?;
    println!("==== Retrieved {} relevant chunks ====", relevant_chunks.len());

    let answer = qa.generate_response(&options.question, &relevant_chunks).await;
    if answer.is_fallback() {
        warn!(outcome = ?answer.outcome, "answer generation failed, printing fallback");
    }
    print_answer(&answer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_reproduces_the_default_run() {
        let args = Args::try_parse_from(["docqa", "--api-key", "k"]).unwrap();
        let (settings, options) = args.into_settings().unwrap();

        assert_eq!(settings.embedding_model, settings.provider.default_embedding_model());
        assert_eq!(settings.rag.chunk_size, 1000);
        assert_eq!(settings.rag.chunk_overlap, 50);
        assert_eq!(settings.rag.top_k, 5);
        assert_eq!(settings.api_key.as_deref(), Some("k"));
        assert_eq!(options.question, DEFAULT_QUESTION);
        assert!(!options.direct && !options.skip_ingest);
    }

    #[test]
    fn openai_provider_switches_default_models() {
        let args =
            Args::try_parse_from(["docqa", "--provider", "openai", "--api-key", "sk"]).unwrap();
        let (settings, _) = args.into_settings().unwrap();
        assert_eq!(settings.provider, Provider::OpenAI);
        assert_eq!(settings.embedding_model, "text-embedding-3-small");
        assert_eq!(settings.chat_model, "gpt-3.5-turbo");
    }

    #[test]
    fn explicit_models_override_provider_defaults() {
        let args = Args::try_parse_from([
            "docqa",
            "--api-key",
            "k",
            "--chat-model",
            "gemini-2.0-flash",
            "--embedding-model",
            "models/text-embedding-004",
        ])
        .unwrap();
        let (settings, _) = args.into_settings().unwrap();
        assert_eq!(settings.chat_model, "gemini-2.0-flash");
        assert_eq!(settings.embedding_model, "models/text-embedding-004");
    }

    #[test]
    fn overlap_not_below_chunk_size_is_rejected() {
        let args = Args::try_parse_from([
            "docqa",
            "--api-key",
            "k",
            "--chunk-size",
            "10",
            "--chunk-overlap",
            "10",
        ])
        .unwrap();
        assert!(args.into_settings().is_err());
    }

    #[test]
    fn unknown_provider_fails_to_parse() {
        assert!(Args::try_parse_from(["docqa", "--provider", "cohere"]).is_err());
    }
}
