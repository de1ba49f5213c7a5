//! Language model seam used by the answer synthesizer.

use async_trait::async_trait;

use crate::error::Result;

/// A text-completion model invoked once per question.
///
/// Implementations send the prompt as-is and return the raw model output.
/// Failures are reported as [`RagError::SynthesisError`](crate::RagError::SynthesisError).
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model name used in logs and errors.
    fn name(&self) -> &str;

    /// Complete a single prompt without streaming.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
