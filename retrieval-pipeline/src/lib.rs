pub mod answer;
pub mod relay;
pub mod scoring;

use std::collections::HashSet;

use common::{
    error::AppError,
    storage::types::knowledge_base::KnowledgeBase,
    utils::embedding::EmbeddingProvider,
};
use futures::future::try_join_all;
use tracing::instrument;

// Captures a supporting chunk plus its similarity score for downstream prompts.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub position: usize,
    pub text: String,
    pub score: f32,
}

/// Queries used to pull supporting context for final-artifact generation, one
/// per design concern.
pub const DESIGN_CONCERN_QUERIES: [&str; 4] = [
    "overall system architecture and design approach",
    "components, services, and their responsibilities",
    "data storage, schema, and database design",
    "scaling, performance, and capacity requirements",
];

/// Ranks a knowledge base's chunks against a query: the query is embedded
/// once, scored against every stored vector, and the top `k` come back best
/// first. An empty base yields an empty result, not an error.
#[instrument(skip_all, fields(base_id = %base.id, k))]
pub async fn retrieve(
    base: &KnowledgeBase,
    embedding: &EmbeddingProvider,
    query: &str,
    k: usize,
) -> Result<Vec<RetrievedChunk>, AppError> {
    if base.is_empty() {
        return Ok(Vec::new());
    }

    let query_embedding = embedding.embed(query).await?;
    let ranked = scoring::top_k(&base.entries, &query_embedding, k);

    Ok(ranked
        .into_iter()
        .filter_map(|(position, score)| {
            base.entries.get(position).map(|entry| RetrievedChunk {
                position,
                text: entry.text.clone(),
                score,
            })
        })
        .collect())
}

/// Text-only projection of [`retrieve`].
pub async fn retrieve_texts(
    base: &KnowledgeBase,
    embedding: &EmbeddingProvider,
    query: &str,
    k: usize,
) -> Result<Vec<String>, AppError> {
    Ok(retrieve(base, embedding, query, k)
        .await?
        .into_iter()
        .map(|chunk| chunk.text)
        .collect())
}

/// Runs every design-concern query against the same base and returns the
/// deduplicated union of fragment texts, first-seen order.
#[instrument(skip_all, fields(base_id = %base.id, k))]
pub async fn design_context(
    base: &KnowledgeBase,
    embedding: &EmbeddingProvider,
    k: usize,
) -> Result<Vec<String>, AppError> {
    let per_query = try_join_all(
        DESIGN_CONCERN_QUERIES
            .iter()
            .map(|query| retrieve_texts(base, embedding, query, k)),
    )
    .await?;

    let mut seen = HashSet::new();
    let mut union = Vec::new();
    for text in per_query.into_iter().flatten() {
        if seen.insert(text.clone()) {
            union.push(text);
        }
    }

    Ok(union)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::types::knowledge_base::EmbeddedChunk;

    async fn base_from_texts(provider: &EmbeddingProvider, texts: &[&str]) -> KnowledgeBase {
        let embeddings = provider
            .embed_batch(texts.iter().map(|t| (*t).to_owned()).collect())
            .await
            .expect("embeddings");
        let entries = texts
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, (text, embedding))| EmbeddedChunk {
                position,
                text: (*text).to_owned(),
                embedding,
            })
            .collect();
        KnowledgeBase::new("test.txt".into(), entries)
    }

    #[tokio::test]
    async fn test_exact_match_ranks_first_with_unit_score() {
        let provider = EmbeddingProvider::new_hashed(128).expect("provider");
        let base = base_from_texts(
            &provider,
            &[
                "postgres stores the relational data",
                "redis caches hot lookups",
                "the gateway terminates tls",
            ],
        )
        .await;

        let results = retrieve(&base, &provider, "redis caches hot lookups", 3)
            .await
            .expect("retrieval");

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].text, "redis caches hot lookups");
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_k_beyond_size_returns_all_chunks() {
        let provider = EmbeddingProvider::new_hashed(128).expect("provider");
        let base = base_from_texts(&provider, &["one chunk", "another chunk"]).await;

        let results = retrieve(&base, &provider, "chunk", 10).await.expect("retrieval");

        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_base_returns_empty_not_error() {
        let provider = EmbeddingProvider::new_hashed(128).expect("provider");
        let base = KnowledgeBase::new("empty.txt".into(), Vec::new());

        let results = retrieve(&base, &provider, "anything at all", 4)
            .await
            .expect("retrieval");

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_design_context_is_deduplicated() {
        let provider = EmbeddingProvider::new_hashed(128).expect("provider");
        // Few chunks: every concern query returns the same fragments.
        let base = base_from_texts(
            &provider,
            &["the system uses postgres", "the api scales horizontally"],
        )
        .await;

        let union = design_context(&base, &provider, 4).await.expect("context");

        assert_eq!(union.len(), 2);
        let unique: HashSet<&String> = union.iter().collect();
        assert_eq!(unique.len(), union.len());
    }

    #[tokio::test]
    async fn test_design_context_on_empty_base_is_empty() {
        let provider = EmbeddingProvider::new_hashed(128).expect("provider");
        let base = KnowledgeBase::new("empty.txt".into(), Vec::new());

        let union = design_context(&base, &provider, 4).await.expect("context");

        assert!(union.is_empty());
    }
}
