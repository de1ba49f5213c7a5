//! Answer synthesis: grounding prompt plus one language model call.

use std::sync::Arc;

use tracing::{debug, error};

use crate::document::{Answer, RetrievalResult};
use crate::error::{RagError, Result};
use crate::llm::LanguageModel;
use crate::prompt::{PromptInput, render_prompt};

/// Combines retrieved chunks and a question into an [`Answer`].
///
/// Issues exactly one model call per question and never retries; an empty
/// retrieval result still produces a call with an empty context.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    model: Arc<dyn LanguageModel>,
    refusal_phrase: String,
}

impl AnswerSynthesizer {
    /// Create a synthesizer that instructs `model` to reply with `refusal_phrase`
    /// when the context is insufficient.
    pub fn new(model: Arc<dyn LanguageModel>, refusal_phrase: impl Into<String>) -> Self {
        Self { model, refusal_phrase: refusal_phrase.into() }
    }

    /// The configured refusal phrase.
    pub fn refusal_phrase(&self) -> &str {
        &self.refusal_phrase
    }

    /// Build the grounding prompt, call the model once, and return its raw output.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SynthesisError`] if the model call fails.
    pub async fn synthesize(&self, question: &str, results: RetrievalResult) -> Result<Answer> {
        let input = PromptInput::from_results(question, &results);
        let prompt = render_prompt(&input, &self.refusal_phrase);
        debug!(
            model = self.model.name(),
            context_chunks = results.len(),
            prompt_len = prompt.len(),
            "synthesizing answer"
        );

        let result = self.model.complete(&prompt).await.map_err(|e| {
            error!(model = self.model.name(), error = %e, "language model call failed");
            match e {
                RagError::SynthesisError { .. } => e,
                other => RagError::SynthesisError {
                    model: self.model.name().to_string(),
                    message: other.to_string(),
                },
            }
        })?;

        Ok(Answer { query: question.to_string(), result, sources: results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Chunk, SearchResult};
    use crate::mock::MockLanguageModel;
    use crate::prompt::DEFAULT_REFUSAL_PHRASE;

    fn results(texts: &[&str]) -> RetrievalResult {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| SearchResult {
                chunk: Chunk {
                    index,
                    text: text.to_string(),
                    page: 1,
                    start: 0,
                    end: text.chars().count(),
                    overlap: 0,
                },
                score: 1.0 - index as f32 * 0.1,
            })
            .collect()
    }

    #[tokio::test]
    async fn output_is_returned_verbatim_with_its_sources() {
        let model = Arc::new(MockLanguageModel::fixed("  Hit points, all of them.\n"));
        let synthesizer = AnswerSynthesizer::new(model.clone(), DEFAULT_REFUSAL_PHRASE);

        let answer = synthesizer
            .synthesize("What does a long rest restore?", results(&["A long rest restores all hit points."]))
            .await
            .unwrap();

        assert_eq!(answer.result, "  Hit points, all of them.\n");
        assert_eq!(answer.query, "What does a long rest restore?");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn prompt_carries_context_in_ranked_order() {
        let model = Arc::new(MockLanguageModel::fixed("ok"));
        let synthesizer = AnswerSynthesizer::new(model.clone(), "Nope");
        synthesizer.synthesize("q?", results(&["first chunk", "second chunk"])).await.unwrap();

        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("Say \"Nope\""));
        assert!(prompt.find("first chunk").unwrap() < prompt.find("second chunk").unwrap());
    }

    #[tokio::test]
    async fn empty_retrieval_still_calls_the_model() {
        let model = Arc::new(MockLanguageModel::extractive(DEFAULT_REFUSAL_PHRASE));
        let synthesizer = AnswerSynthesizer::new(model.clone(), DEFAULT_REFUSAL_PHRASE);

        let answer = synthesizer.synthesize("Who won?", Vec::new()).await.unwrap();
        assert_eq!(answer.result, DEFAULT_REFUSAL_PHRASE);
        assert!(answer.sources.is_empty());
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn model_failure_is_a_synthesis_error_and_not_retried() {
        let model = Arc::new(MockLanguageModel::failing("upstream down"));
        let synthesizer = AnswerSynthesizer::new(model.clone(), DEFAULT_REFUSAL_PHRASE);

        let err = synthesizer.synthesize("q?", results(&["ctx"])).await.unwrap_err();
        assert!(matches!(err, RagError::SynthesisError { .. }));
        assert!(err.is_retryable());
        assert_eq!(model.call_count(), 1);
    }
}
