mod context;
mod stages;
mod state;

use std::sync::Arc;

use common::{
    error::AppError,
    storage::knowledge::KnowledgeBaseStore,
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};
use tracing::{info, instrument};
use uuid::Uuid;

use self::{
    context::IndexingContext,
    stages::{chunk_text, embed_chunks, publish_base},
    state::ready,
};

/// Outcome of a successful indexing run.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub id: String,
    pub chunk_count: usize,
}

/// Drives one document from extracted text to a published knowledge base:
/// split into overlapping chunks, embed every chunk, then publish the
/// finished index in a single store write. A failure at any stage publishes
/// nothing, so callers never observe a half-built base.
pub struct IndexingPipeline {
    embedding_provider: Arc<EmbeddingProvider>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl IndexingPipeline {
    pub fn new(embedding_provider: Arc<EmbeddingProvider>, config: &AppConfig) -> Self {
        Self {
            embedding_provider,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    pub async fn index_document(
        &self,
        store: &KnowledgeBaseStore,
        source_name: &str,
        text: &str,
    ) -> Result<IndexedDocument, AppError> {
        self.index_document_with_id(store, &Uuid::new_v4().to_string(), source_name, text)
            .await
    }

    #[instrument(skip_all, fields(document_id = %document_id, source_name = %source_name))]
    pub async fn index_document_with_id(
        &self,
        store: &KnowledgeBaseStore,
        document_id: &str,
        source_name: &str,
        text: &str,
    ) -> Result<IndexedDocument, AppError> {
        let mut ctx = IndexingContext::new(
            document_id.to_owned(),
            source_name.to_owned(),
            text.to_owned(),
            self.chunk_size,
            self.chunk_overlap,
        );

        let machine = ready();

        let machine = chunk_text(machine, &mut ctx)?;
        let machine = embed_chunks(machine, &mut ctx, &self.embedding_provider).await?;
        let _machine = publish_base(machine, &mut ctx, store).await?;

        info!(
            document_id = %ctx.document_id,
            chunk_count = ctx.chunk_count,
            "document indexed"
        );

        Ok(IndexedDocument {
            id: ctx.document_id,
            chunk_count: ctx.chunk_count,
        })
    }
}
