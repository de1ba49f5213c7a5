//! End-to-end question answering over a document loaded from disk.

use std::io::Write;
use std::sync::Arc;

use docqa_rag::{
    DEFAULT_REFUSAL_PHRASE, HashingEmbeddingProvider, IndexingPipeline, MockLanguageModel,
    QueryService, RagConfig, Retriever, load_document,
};
use tempfile::NamedTempFile;

const RULES: &str = "A long rest restores all hit points.\n\
\x0cInitiative is rolled at the start of combat. Creatures act in turn order from highest to lowest.\n\
\x0cSpell slots are spent when casting spells above cantrip level. Cantrips can be cast at will.\n";

fn rules_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(RULES.as_bytes()).unwrap();
    file
}

fn config() -> RagConfig {
    RagConfig::builder().chunk_size(200).chunk_overlap(20).top_k(2).build().unwrap()
}

async fn service(file: &NamedTempFile) -> QueryService {
    QueryService::bootstrap(
        config(),
        file.path(),
        Arc::new(HashingEmbeddingProvider::default()),
        Arc::new(MockLanguageModel::extractive(DEFAULT_REFUSAL_PHRASE)),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn grounded_question_is_answered_from_the_top_chunk() {
    let file = rules_file();
    let service = service(&file).await;

    let answer = service.answer("What does a long rest restore?").await.unwrap();

    assert!(answer.result.contains("hit points"), "unexpected answer: {}", answer.result);
    assert!(!answer.sources.is_empty() && answer.sources.len() <= 2);
    assert!(answer.sources[0].chunk.text.contains("A long rest restores all hit points."));
}

#[tokio::test]
async fn unrelated_question_gets_the_refusal_phrase() {
    let file = rules_file();
    let service = service(&file).await;

    let answer = service.answer("Who painted the Mona Lisa?").await.unwrap();

    assert_eq!(answer.result, DEFAULT_REFUSAL_PHRASE);
}

#[tokio::test]
async fn concurrent_questions_both_succeed() {
    let file = rules_file();
    let service = Arc::new(service(&file).await);
    let chunks = service.chunk_count();

    let rest = tokio::spawn({
        let service = service.clone();
        async move { service.answer("What does a long rest restore?").await }
    });
    let spells = tokio::spawn({
        let service = service.clone();
        async move { service.answer("When are spell slots spent?").await }
    });

    let rest = rest.await.unwrap().unwrap();
    let spells = spells.await.unwrap().unwrap();
    assert!(rest.result.contains("hit points"));
    assert!(spells.result.contains("Spell slots"));
    assert_eq!(service.chunk_count(), chunks);
}

#[tokio::test]
async fn pages_keep_their_numbers_through_loading() {
    let file = rules_file();
    let document = load_document(file.path()).unwrap();

    assert_eq!(document.pages.len(), 3);
    assert_eq!(document.pages[0].number, 1);
    assert!(document.pages[2].text.starts_with("Spell slots"));
}

#[tokio::test]
async fn retrieval_is_idempotent() {
    let file = rules_file();
    let document = load_document(file.path()).unwrap();
    let embedder = Arc::new(HashingEmbeddingProvider::default());
    let index = IndexingPipeline::builder()
        .config(config())
        .embedding_provider(embedder.clone())
        .build()
        .unwrap()
        .index(&document)
        .await
        .unwrap();
    let retriever = Retriever::new(embedder, Arc::new(index), 2).unwrap();

    let first = retriever.retrieve("When is initiative rolled?").await.unwrap();
    let second = retriever.retrieve("When is initiative rolled?").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn trailing_blank_lines_do_not_block_startup() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    let text = "A long rest restores all hit points. ".repeat(26);
    write!(file, "{}{}", text, "\n".repeat(1000)).unwrap();

    let service = QueryService::bootstrap(
        RagConfig::default(),
        file.path(),
        Arc::new(HashingEmbeddingProvider::default()),
        Arc::new(MockLanguageModel::extractive(DEFAULT_REFUSAL_PHRASE)),
    )
    .await
    .unwrap();

    assert_eq!(service.chunk_count(), 3);
    let answer = service.answer("What does a long rest restore?").await.unwrap();
    assert!(answer.result.contains("hit points"));
    assert_eq!(answer.sources[0].chunk.index, 0);
}
