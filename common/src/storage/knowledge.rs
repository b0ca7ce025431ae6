use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::storage::types::knowledge_base::KnowledgeBase;

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeBaseSummary {
    pub id: String,
    pub chunk_count: usize,
}

/// Process-wide map of knowledge-base id to published index.
///
/// Bases are immutable once published, so readers share them through `Arc`
/// and a publish for an existing id swaps the whole index in one write. A
/// search concurrent with a rebuild sees either the old complete index or the
/// new one, never a partial state.
#[derive(Clone, Default)]
pub struct KnowledgeBaseStore {
    bases: Arc<RwLock<HashMap<String, Arc<KnowledgeBase>>>>,
}

impl KnowledgeBaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, base: KnowledgeBase) -> Arc<KnowledgeBase> {
        let base = Arc::new(base);
        let mut bases = self.bases.write().await;
        bases.insert(base.id.clone(), Arc::clone(&base));
        info!(
            base_id = %base.id,
            chunk_count = base.chunk_count(),
            "knowledge base published"
        );
        base
    }

    pub async fn get(&self, id: &str) -> Option<Arc<KnowledgeBase>> {
        self.bases.read().await.get(id).cloned()
    }

    pub async fn list(&self) -> Vec<KnowledgeBaseSummary> {
        let bases = self.bases.read().await;
        let mut summaries: Vec<(chrono::DateTime<chrono::Utc>, KnowledgeBaseSummary)> = bases
            .values()
            .map(|base| {
                (
                    base.created_at,
                    KnowledgeBaseSummary {
                        id: base.id.clone(),
                        chunk_count: base.chunk_count(),
                    },
                )
            })
            .collect();
        summaries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        summaries.into_iter().map(|(_, summary)| summary).collect()
    }

    pub async fn len(&self) -> usize {
        self.bases.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bases.read().await.is_empty()
    }
}
