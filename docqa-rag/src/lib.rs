//! `docqa-rag` answers questions against a single reference document.
//!
//! The document is loaded, chunked, embedded and indexed once at startup.
//! Each question is then embedded, matched against the index by cosine
//! similarity, and answered by a language model from the top-k chunks using
//! a fixed grounding prompt. Unsupported questions get a refusal phrase.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{HashingEmbeddingProvider, MockLanguageModel, QueryService, RagConfig};
//!
//! let service = QueryService::bootstrap(
//!     RagConfig::default(),
//!     "handbook.pdf",
//!     Arc::new(HashingEmbeddingProvider::default()),
//!     Arc::new(MockLanguageModel::extractive(docqa_rag::DEFAULT_REFUSAL_PHRASE)),
//! )
//! .await?;
//! let answer = service.answer("What does a long rest restore?").await?;
//! println!("{}", answer.result);
//! ```
//!
//! # Features
//!
//! - `openai` (default): OpenAI embedding and chat completion clients.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod inmemory;
pub mod llm;
pub mod loader;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod retry;
pub mod service;
pub mod synthesizer;
pub mod vectorstore;

pub use chunking::{Chunker, FixedSizeChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Answer, Chunk, Document, IndexEntry, Page, RetrievalResult, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use hashing::HashingEmbeddingProvider;
pub use inmemory::InMemoryVectorIndex;
pub use llm::LanguageModel;
pub use loader::{DocumentFormat, load_document};
pub use mock::MockLanguageModel;
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
pub use pipeline::{IndexingPipeline, IndexingPipelineBuilder};
pub use prompt::{DEFAULT_REFUSAL_PHRASE, PromptInput, render_prompt};
pub use retriever::Retriever;
pub use retry::RetryPolicy;
pub use service::{QueryService, ServiceLifecycle, ServiceState};
pub use synthesizer::AnswerSynthesizer;
pub use vectorstore::VectorIndex;
