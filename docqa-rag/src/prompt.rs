//! The fixed grounding prompt.
//!
//! The template tells the model to answer from the supplied context only and
//! to reply with the refusal phrase when the context does not hold the answer.

use crate::document::SearchResult;

/// Refusal phrase used when none is configured.
pub const DEFAULT_REFUSAL_PHRASE: &str = "Sorry I don't know the answer";

/// Separator placed between retrieved chunks in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Structured input to [`render_prompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptInput {
    /// Retrieved chunk texts, in ranked order.
    pub context: String,
    /// The user's question.
    pub question: String,
}

impl PromptInput {
    /// Assemble the context block from ranked search results.
    pub fn from_results(question: impl Into<String>, results: &[SearchResult]) -> Self {
        let context = results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);
        Self { context, question: question.into() }
    }
}

/// Render the grounding prompt for `input`.
pub fn render_prompt(input: &PromptInput, refusal_phrase: &str) -> String {
    format!(
        "Use the following context to answer the question.\n\n\
         Say \"{refusal_phrase}\" if you don't know the answer.\n\n\
         {context}\n\n\
         Question: {question}\n",
        context = input.context,
        question = input.question,
    )
}
