//! The process-wide query service and its startup lifecycle.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Semaphore, watch};
use tokio::time::{Instant, timeout_at};
use tracing::{error, info, warn};

use crate::config::RagConfig;
use crate::document::{Answer, Document};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::LanguageModel;
use crate::loader::load_document;
use crate::pipeline::IndexingPipeline;
use crate::retriever::Retriever;
use crate::synthesizer::AnswerSynthesizer;
use crate::vectorstore::VectorIndex;

/// Answers questions against one built, read-only vector index.
///
/// Each call to [`answer`](QueryService::answer) is independent. At most
/// [`RagConfig::max_concurrent_requests`] calls talk to the upstream
/// embedding and language model services at once; the rest queue. Every call
/// runs under [`RagConfig::query_timeout`], measured from arrival.
pub struct QueryService {
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    limiter: Arc<Semaphore>,
    query_timeout: Duration,
}

impl QueryService {
    /// Create a service over an already built index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `config` is invalid or the
    /// embedder's dimensionality differs from the index.
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        config.validate()?;
        if let Some(indexed) = index.dimensions() {
            if indexed != embedder.dimensions() {
                return Err(RagError::ConfigError(format!(
                    "embedding provider {} produces {}-dimensional vectors but the index holds {indexed}",
                    embedder.name(),
                    embedder.dimensions()
                )));
            }
        }
        let retriever = Retriever::new(embedder, index, config.top_k)?
            .with_similarity_threshold(config.similarity_threshold);
        Ok(Self {
            retriever,
            synthesizer: AnswerSynthesizer::new(model, config.refusal_phrase.clone()),
            limiter: Arc::new(Semaphore::new(config.max_concurrent_requests)),
            query_timeout: config.query_timeout,
        })
    }

    /// Chunk, embed and index `document`, then create the service.
    pub async fn from_document(
        config: RagConfig,
        document: &Document,
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        let pipeline = IndexingPipeline::builder()
            .config(config.clone())
            .embedding_provider(embedder.clone())
            .build()?;
        let index = pipeline.index(document).await?;
        Self::new(&config, embedder, Arc::new(index), model)
    }

    /// Load the document at `path` and build the service from it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::LoadError`] if the document cannot be loaded, and
    /// any configuration or indexing error from [`from_document`](Self::from_document).
    pub async fn bootstrap(
        config: RagConfig,
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        config.validate()?;
        let document = load_document(path)?;
        Self::from_document(config, &document, embedder, model).await
    }

    /// Number of chunks in the index.
    pub fn chunk_count(&self) -> usize {
        self.retriever.index().len()
    }

    /// The phrase returned when the document does not support an answer.
    pub fn refusal_phrase(&self) -> &str {
        self.synthesizer.refusal_phrase()
    }

    /// Retrieve supporting chunks for `question` and synthesize an answer.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidQuestion`] if the question is blank.
    /// - [`RagError::Timeout`] if the query budget runs out while queued,
    ///   retrieving or synthesizing.
    /// - Embedding, index and synthesis errors from the individual stages.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(RagError::InvalidQuestion("question must not be empty".to_string()));
        }

        let started = Instant::now();
        let deadline = started + self.query_timeout;
        let timed_out = |stage: &'static str| {
            warn!(stage, timeout_ms = self.query_timeout.as_millis() as u64, "query timed out");
            RagError::Timeout { stage, after: self.query_timeout }
        };

        let _permit = timeout_at(deadline, self.limiter.acquire())
            .await
            .map_err(|_| timed_out("queue"))?
            .map_err(|_| RagError::NotReady)?;

        let results = timeout_at(deadline, self.retriever.retrieve(question))
            .await
            .map_err(|_| timed_out("retrieval"))??;

        let answer = timeout_at(deadline, self.synthesizer.synthesize(question, results))
            .await
            .map_err(|_| timed_out("synthesis"))??;

        info!(
            sources = answer.sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "answered question"
        );
        Ok(answer)
    }
}

impl fmt::Debug for QueryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryService")
            .field("chunks", &self.chunk_count())
            .field("top_k", &self.retriever.top_k())
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}

/// Startup state of the query service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// Nothing has started yet.
    Uninitialized,
    /// The document is being loaded and indexed.
    Indexing,
    /// The index is built and questions are accepted.
    Ready,
    /// Indexing failed; the service will never become ready.
    Failed,
}

impl ServiceState {
    /// Lowercase name, as reported by health checks.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Indexing => "indexing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// Owns the single [`QueryService`] and its `Uninitialized → Indexing → Ready`
/// transition.
///
/// The service handle is published before the state flips to
/// [`ServiceState::Ready`], so a caller that observes `Ready` always finds a
/// fully built index. Initialization happens at most once.
pub struct ServiceLifecycle {
    state: watch::Sender<ServiceState>,
    service: OnceLock<Arc<QueryService>>,
}

impl Default for ServiceLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceLifecycle {
    /// A lifecycle in [`ServiceState::Uninitialized`].
    pub fn new() -> Self {
        let (state, _) = watch::channel(ServiceState::Uninitialized);
        Self { state, service: OnceLock::new() }
    }

    /// A lifecycle that is already [`ServiceState::Ready`] with `service`.
    pub fn ready(service: QueryService) -> Self {
        let (state, _) = watch::channel(ServiceState::Ready);
        Self { state, service: OnceLock::from(Arc::new(service)) }
    }

    /// The current state.
    pub fn state(&self) -> ServiceState {
        *self.state.borrow()
    }

    /// Run `init` and publish its service.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::AlreadyInitialized`] if initialization was already
    /// started, or the error from `init`, which leaves the lifecycle in
    /// [`ServiceState::Failed`].
    pub async fn initialize<F>(&self, init: F) -> Result<Arc<QueryService>>
    where
        F: Future<Output = Result<QueryService>>,
    {
        let claimed = self.state.send_if_modified(|state| {
            if *state == ServiceState::Uninitialized {
                *state = ServiceState::Indexing;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(RagError::AlreadyInitialized);
        }
        info!("indexing started");

        match init.await {
            Ok(service) => {
                let service = Arc::new(service);
                if self.service.set(service.clone()).is_err() {
                    return Err(RagError::AlreadyInitialized);
                }
                self.state.send_replace(ServiceState::Ready);
                info!(chunks = service.chunk_count(), "query service ready");
                Ok(service)
            }
            Err(e) => {
                error!(error = %e, "indexing failed");
                self.state.send_replace(ServiceState::Failed);
                Err(e)
            }
        }
    }

    /// The ready service.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotReady`] unless the state is [`ServiceState::Ready`].
    pub fn service(&self) -> Result<Arc<QueryService>> {
        self.service.get().cloned().ok_or(RagError::NotReady)
    }

    /// Answer `question` if the service is ready.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        self.service()?.answer(question).await
    }

    /// Wait until initialization finishes.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotReady`] if initialization failed.
    pub async fn wait_ready(&self) -> Result<Arc<QueryService>> {
        let mut state = self.state.subscribe();
        let settled = *state
            .wait_for(|s| matches!(s, ServiceState::Ready | ServiceState::Failed))
            .await
            .map_err(|_| RagError::NotReady)?;
        match settled {
            ServiceState::Ready => self.service(),
            _ => Err(RagError::NotReady),
        }
    }
}
