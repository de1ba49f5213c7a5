//! Mock language model for tests and offline runs.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{RagError, Result};
use crate::hashing::tokenize;
use crate::llm::LanguageModel;

const MODEL_NAME: &str = "mock";

/// Shortest question word the extractive mode will match on.
const MIN_KEYWORD_LEN: usize = 4;

#[derive(Debug, Clone)]
enum Behavior {
    Fixed(String),
    Extractive { refusal_phrase: String },
    Failing(String),
}

/// A scripted [`LanguageModel`].
///
/// - [`fixed`](MockLanguageModel::fixed) always returns the same text.
/// - [`extractive`](MockLanguageModel::extractive) answers with the first
///   context sentence sharing a keyword with the question, or the refusal
///   phrase when none does, imitating a model that follows the grounding prompt.
/// - [`failing`](MockLanguageModel::failing) always fails with a synthesis error.
///
/// Every call is counted and the last prompt is kept for inspection.
#[derive(Debug)]
pub struct MockLanguageModel {
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockLanguageModel {
    fn with_behavior(behavior: Behavior) -> Self {
        Self { behavior, delay: None, calls: AtomicUsize::new(0), last_prompt: Mutex::new(None) }
    }

    /// Always answer with `text`.
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fixed(text.into()))
    }

    /// Answer from the prompt context, falling back to `refusal_phrase`.
    pub fn extractive(refusal_phrase: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Extractive { refusal_phrase: refusal_phrase.into() })
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Failing(message.into()))
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completed or attempted calls.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent prompt received.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|guard| guard.clone())
    }
}

fn keywords(question: &str) -> Vec<String> {
    tokenize(question).filter(|t| t.chars().count() >= MIN_KEYWORD_LEN).collect()
}

fn mentions(sentence: &str, keywords: &[String]) -> bool {
    tokenize(sentence).any(|token| {
        token.chars().count() >= MIN_KEYWORD_LEN
            && keywords.iter().any(|k| token.starts_with(k.as_str()) || k.starts_with(token.as_str()))
    })
}

/// The first context sentence mentioning a question keyword.
fn extract_answer(prompt: &str) -> Option<String> {
    let (before, question) = prompt.rsplit_once("Question: ")?;
    let (_, context) = before.split_once("know the answer.\n\n")?;
    let keywords = keywords(question);
    if keywords.is_empty() {
        return None;
    }

    context
        .split_inclusive(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .find(|s| mentions(s, &keywords))
        .map(str::to_string)
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn name(&self) -> &str {
        MODEL_NAME
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_prompt.lock() {
            *guard = Some(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Fixed(text) => Ok(text.clone()),
            Behavior::Extractive { refusal_phrase } => {
                Ok(extract_answer(prompt).unwrap_or_else(|| refusal_phrase.clone()))
            }
            Behavior::Failing(message) => Err(RagError::SynthesisError {
                model: MODEL_NAME.to_string(),
                message: message.clone(),
            }),
        }
    }
}
