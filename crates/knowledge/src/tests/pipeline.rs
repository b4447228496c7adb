//! RAG pipeline scenarios with scripted collaborators.

use super::fakes::{KeywordEmbedder, ScriptedReranker};
use crate::chunker::ChunkConfig;
use crate::embeddings::providers::TrigramProvider;
use crate::rag::RagPipeline;
use crate::rerank::LexicalReranker;
use crate::types::Document;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const VOCABULARY: &[&str] = &["solar", "brine", "membrane", "cost"];

fn corpus() -> Vec<Document> {
    vec![
        Document::new("solar solar solar panels", "https://a.example/solar"),
        Document::new("brine brine disposal", "https://b.example/brine"),
        Document::new("membrane cost", "https://c.example/membrane"),
    ]
}

fn by_length(passage: &str) -> f32 {
    passage.len() as f32
}

fn pipeline(
    embedder: Arc<KeywordEmbedder>,
    reranker: Arc<ScriptedReranker>,
    width: usize,
) -> RagPipeline {
    RagPipeline::new(embedder, reranker, ChunkConfig::new(60, 0).unwrap(), width)
}

#[tokio::test]
async fn test_no_documents_short_circuits() {
    let embedder = Arc::new(KeywordEmbedder::new(VOCABULARY));
    let reranker = Arc::new(ScriptedReranker::new(by_length));
    let rag = pipeline(embedder.clone(), reranker.clone(), 20);

    let result = rag.run(&[], "solar", 5).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(embedder.batches.load(Ordering::SeqCst), 0);
    assert!(reranker.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_documents_yield_nothing() {
    let embedder = Arc::new(KeywordEmbedder::new(VOCABULARY));
    let reranker = Arc::new(ScriptedReranker::new(by_length));
    let rag = pipeline(embedder.clone(), reranker, 20);

    let docs = vec![
        Document::new("", "https://empty.example"),
        Document::new("   \n\n  ", "https://blank.example"),
    ];
    let result = rag.run(&docs, "solar", 5).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(embedder.batches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_selection_follows_reranker_and_keeps_provenance() {
    let embedder = Arc::new(KeywordEmbedder::new(VOCABULARY));
    let reranker = Arc::new(ScriptedReranker::new(by_length));
    let rag = pipeline(embedder, reranker, 20);

    let docs = corpus();
    let origin: HashMap<&str, &str> = docs
        .iter()
        .map(|d| (d.content.as_str(), d.source.as_str()))
        .collect();

    let evidence = rag.run_scored(&docs, "solar", 3).await.unwrap();

    let contents: Vec<&str> = evidence.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["solar solar solar panels", "brine brine disposal", "membrane cost"]
    );
    assert!(evidence.windows(2).all(|w| w[0].score >= w[1].score));
    for e in &evidence {
        assert_eq!(origin[e.content.as_str()], e.source);
    }
}

#[tokio::test]
async fn test_top_k_truncates() {
    let embedder = Arc::new(KeywordEmbedder::new(VOCABULARY));
    let reranker = Arc::new(ScriptedReranker::new(by_length));
    let rag = pipeline(embedder, reranker, 20);

    let chunks = rag.run(&corpus(), "solar", 2).await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].source, "https://a.example/solar");
}

#[tokio::test]
async fn test_retrieval_width_limits_rerank_candidates() {
    let embedder = Arc::new(KeywordEmbedder::new(VOCABULARY));
    let reranker = Arc::new(ScriptedReranker::new(by_length));
    let rag = pipeline(embedder, reranker.clone(), 1);

    let chunks = rag.run(&corpus(), "brine brine", 5).await.unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].source, "https://b.example/brine");

    let seen = reranker.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], vec!["brine brine disposal".to_string()]);
}

#[tokio::test]
async fn test_width_larger_than_chunk_count_is_clamped() {
    let embedder = Arc::new(KeywordEmbedder::new(VOCABULARY));
    let reranker = Arc::new(ScriptedReranker::new(by_length));
    let rag = pipeline(embedder, reranker.clone(), 500);

    rag.run(&corpus(), "cost", 10).await.unwrap();

    assert_eq!(reranker.seen.lock().unwrap()[0].len(), 3);
}

#[tokio::test]
async fn test_short_embedding_batch_is_error() {
    let embedder = Arc::new(KeywordEmbedder::new(VOCABULARY).dropping(1));
    let reranker = Arc::new(ScriptedReranker::new(by_length));
    let rag = pipeline(embedder, reranker, 20);

    assert!(rag.run(&corpus(), "solar", 3).await.is_err());
}

#[tokio::test]
async fn test_offline_providers_pick_relevant_source() {
    let rag = RagPipeline::new(
        Arc::new(TrigramProvider::new(384)),
        Arc::new(LexicalReranker::new()),
        ChunkConfig::new(200, 20).unwrap(),
        20,
    );

    let docs = vec![
        Document::new(
            "Medieval tapestry weaving flourished in Flanders. Guilds controlled the looms \
             and the dye trade. Wool arrived from England by sea.",
            "https://history.example/tapestry",
        ),
        Document::new(
            "Solar desalination costs have fallen sharply. Photovoltaic reverse osmosis \
             plants now produce water at lower cost than diesel units in remote regions.",
            "https://energy.example/solar-desalination",
        ),
        Document::new(
            "Brine disposal remains an environmental concern for coastal desalination plants.",
            "https://ocean.example/brine",
        ),
    ];

    let chunks = rag.run(&docs, "solar desalination cost", 2).await.unwrap();

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].source, "https://energy.example/solar-desalination");
    assert!(chunks.iter().all(|c| c.source != "https://history.example/tapestry"));
}
