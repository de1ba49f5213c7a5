//! Process configuration from the environment and the command line.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use docqa_rag::{RagConfig, RagError};

/// Which embedding provider indexes the document and the questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbeddingBackend {
    /// OpenAI-compatible embeddings API.
    Openai,
    /// Offline feature-hashed bag-of-words.
    Hashing,
}

/// Which language model synthesizes answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChatBackend {
    /// OpenAI-compatible chat completions API.
    Openai,
    /// Offline model quoting the best matching context sentence.
    Extractive,
}

/// Command-line arguments. Every flag can also be set through the environment
/// or a `.env` file.
#[derive(Debug, Clone, Parser)]
#[command(name = "docqa", version, about = "Answer questions about a single document over HTTP")]
pub struct Cli {
    /// Document to index (.pdf, .txt or .md).
    #[arg(long, env = "DOCQA_DOCUMENT")]
    pub document: PathBuf,

    /// Address to bind.
    #[arg(long, env = "DOCQA_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind.
    #[arg(long, env = "DOCQA_PORT", default_value_t = 3099)]
    pub port: u16,

    /// Maximum characters per chunk.
    #[arg(long, env = "DOCQA_CHUNK_SIZE")]
    pub chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks.
    #[arg(long, env = "DOCQA_CHUNK_OVERLAP")]
    pub chunk_overlap: Option<usize>,

    /// Chunks placed in the prompt context.
    #[arg(long, env = "DOCQA_TOP_K")]
    pub top_k: Option<usize>,

    /// Drop retrieved chunks scoring below this cosine similarity.
    #[arg(long, env = "DOCQA_SIMILARITY_THRESHOLD")]
    pub similarity_threshold: Option<f32>,

    /// Answer returned when the document does not cover the question.
    #[arg(long, env = "DOCQA_REFUSAL_PHRASE")]
    pub refusal_phrase: Option<String>,

    /// Per-question time budget in seconds.
    #[arg(long, env = "DOCQA_QUERY_TIMEOUT_SECS")]
    pub query_timeout_secs: Option<u64>,

    /// Questions allowed to call upstream services at once.
    #[arg(long, env = "DOCQA_MAX_CONCURRENT_REQUESTS")]
    pub max_concurrent_requests: Option<usize>,

    /// Embedding backend used for the document and for questions.
    #[arg(long, env = "DOCQA_EMBEDDING_PROVIDER", value_enum, default_value = "openai")]
    pub embedding_provider: EmbeddingBackend,

    /// Embedding model name, for the `openai` backend.
    #[arg(long, env = "DOCQA_EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    /// Language model backend that writes answers.
    #[arg(long, env = "DOCQA_CHAT_PROVIDER", value_enum, default_value = "openai")]
    pub chat_provider: ChatBackend,

    /// Chat model name, for the `openai` backend.
    #[arg(long, env = "DOCQA_CHAT_MODEL")]
    pub chat_model: Option<String>,

    /// API key for the OpenAI-compatible endpoints.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "DOCQA_LOG_JSON")]
    pub log_json: bool,
}

/// Settings for the OpenAI-compatible clients.
#[derive(Debug, Clone, Default)]
pub struct OpenAISettings {
    /// Bearer token; blank keys are treated as missing.
    pub api_key: Option<String>,
    /// Overrides the default `https://api.openai.com/v1`.
    pub base_url: Option<String>,
    /// Overrides the client's default embedding model.
    pub embedding_model: Option<String>,
    /// Overrides the client's default chat model.
    pub chat_model: Option<String>,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host name or address to bind.
    pub host: String,
    /// Port to bind; `0` picks a free one.
    pub port: u16,
    /// Document indexed at startup.
    pub document: PathBuf,
    /// Validated chunking, retrieval and concurrency settings.
    pub rag: RagConfig,
    pub embedding: EmbeddingBackend,
    pub chat: ChatBackend,
    pub openai: OpenAISettings,
    /// Emit logs as JSON lines instead of text.
    pub log_json: bool,
}

impl TryFrom<Cli> for ServerConfig {
    type Error = RagError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let mut rag = RagConfig::default();
        if let Some(size) = cli.chunk_size {
            rag.chunk_size = size;
        }
        if let Some(overlap) = cli.chunk_overlap {
            rag.chunk_overlap = overlap;
        }
        if let Some(k) = cli.top_k {
            rag.top_k = k;
        }
        if let Some(threshold) = cli.similarity_threshold {
            rag.similarity_threshold = Some(threshold);
        }
        if let Some(phrase) = cli.refusal_phrase {
            rag.refusal_phrase = phrase;
        }
        if let Some(secs) = cli.query_timeout_secs {
            rag.query_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = cli.max_concurrent_requests {
            rag.max_concurrent_requests = limit;
        }
        rag.validate()?;

        Ok(Self {
            host: cli.host,
            port: cli.port,
            document: cli.document,
            rag,
            embedding: cli.embedding_provider,
            chat: cli.chat_provider,
            openai: OpenAISettings {
                api_key: cli.openai_api_key.filter(|key| !key.trim().is_empty()),
                base_url: cli.openai_base_url,
                embedding_model: cli.embedding_model,
                chat_model: cli.chat_model,
            },
            log_json: cli.log_json,
        })
    }
}
