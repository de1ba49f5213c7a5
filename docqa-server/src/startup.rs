//! Building the query service from the server configuration.

use std::sync::Arc;

use docqa_rag::{
    EmbeddingProvider, HashingEmbeddingProvider, LanguageModel, MockLanguageModel,
    OpenAIChatModel, OpenAIEmbeddingProvider, QueryService, RagError, Result,
};

use crate::config::{ChatBackend, EmbeddingBackend, OpenAISettings, ServerConfig};

fn api_key(settings: &OpenAISettings) -> Result<String> {
    settings
        .api_key
        .clone()
        .ok_or_else(|| RagError::ConfigError("OPENAI_API_KEY is required for the openai provider".into()))
}

/// The embedding provider selected by `config`.
pub fn embedding_provider(config: &ServerConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.embedding {
        EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbeddingProvider::default())),
        EmbeddingBackend::Openai => {
            let mut provider = OpenAIEmbeddingProvider::new(api_key(&config.openai)?)?;
            if let Some(model) = &config.openai.embedding_model {
                provider = provider.with_model(model.clone());
            }
            if let Some(base_url) = &config.openai.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
    }
}

/// The language model selected by `config`.
pub fn language_model(config: &ServerConfig) -> Result<Arc<dyn LanguageModel>> {
    match config.chat {
        ChatBackend::Extractive => {
            Ok(Arc::new(MockLanguageModel::extractive(config.rag.refusal_phrase.clone())))
        }
        ChatBackend::Openai => {
            let mut model = OpenAIChatModel::new(api_key(&config.openai)?)?;
            if let Some(name) = &config.openai.chat_model {
                model = model.with_model(name.clone());
            }
            if let Some(base_url) = &config.openai.base_url {
                model = model.with_base_url(base_url.clone());
            }
            Ok(Arc::new(model))
        }
    }
}

/// Load, chunk, embed and index the configured document.
///
/// # Errors
///
/// Fails on missing credentials, an unreadable document, or an indexing error.
pub async fn build_service(config: &ServerConfig) -> Result<QueryService> {
    let embedder = embedding_provider(config)?;
    let model = language_model(config)?;
    QueryService::bootstrap(config.rag.clone(), &config.document, embedder, model).await
}
