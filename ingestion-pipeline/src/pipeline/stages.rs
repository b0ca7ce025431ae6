use common::{
    error::AppError,
    storage::{
        knowledge::KnowledgeBaseStore,
        types::knowledge_base::{EmbeddedChunk, KnowledgeBase},
    },
    utils::embedding::EmbeddingProvider,
};
use state_machines::core::GuardError;
use tracing::{debug, instrument};

use super::{
    context::IndexingContext,
    state::{Chunked, Embedded, IndexingMachine, Published, Ready},
};

#[instrument(level = "trace", skip_all, fields(document_id = %ctx.document_id))]
pub fn chunk_text(
    machine: IndexingMachine<(), Ready>,
    ctx: &mut IndexingContext,
) -> Result<IndexingMachine<(), Chunked>, AppError> {
    if ctx.text.trim().is_empty() {
        return Err(AppError::Validation(
            "document contained no extractable text".into(),
        ));
    }

    let chunks = crate::splitter::split(&ctx.text, ctx.chunk_size, ctx.chunk_overlap)?;

    debug!(
        document_id = %ctx.document_id,
        chunk_count = chunks.len(),
        chunk_size = ctx.chunk_size,
        chunk_overlap = ctx.chunk_overlap,
        "document split into chunks"
    );

    ctx.chunks = chunks;

    machine
        .chunk()
        .map_err(|(_, guard)| map_guard_error("chunk", &guard))
}

#[instrument(level = "trace", skip_all, fields(document_id = %ctx.document_id))]
pub async fn embed_chunks(
    machine: IndexingMachine<(), Chunked>,
    ctx: &mut IndexingContext,
    provider: &EmbeddingProvider,
) -> Result<IndexingMachine<(), Embedded>, AppError> {
    let expected_dimension = provider.dimension();
    let embeddings = provider.embed_batch(ctx.chunks.clone()).await?;

    if embeddings.len() != ctx.chunks.len() {
        return Err(AppError::Embedding(format!(
            "embedded {} of {} chunks",
            embeddings.len(),
            ctx.chunks.len()
        )));
    }

    let mut embedded = Vec::with_capacity(ctx.chunks.len());
    for (position, (text, embedding)) in ctx.chunks.drain(..).zip(embeddings).enumerate() {
        if embedding.len() != expected_dimension {
            return Err(AppError::Embedding(format!(
                "embedding for chunk {position} has dimension {}, expected {expected_dimension}",
                embedding.len()
            )));
        }
        embedded.push(EmbeddedChunk {
            position,
            text,
            embedding,
        });
    }

    debug!(
        document_id = %ctx.document_id,
        embedded_count = embedded.len(),
        dimension = expected_dimension,
        "chunk embeddings ready"
    );

    ctx.embedded = embedded;

    machine
        .embed()
        .map_err(|(_, guard)| map_guard_error("embed", &guard))
}

#[instrument(level = "trace", skip_all, fields(document_id = %ctx.document_id))]
pub async fn publish_base(
    machine: IndexingMachine<(), Embedded>,
    ctx: &mut IndexingContext,
    store: &KnowledgeBaseStore,
) -> Result<IndexingMachine<(), Published>, AppError> {
    let base = KnowledgeBase::with_id(
        ctx.document_id.clone(),
        ctx.source_name.clone(),
        std::mem::take(&mut ctx.embedded),
    );
    let published = store.publish(base).await;

    ctx.chunk_count = published.chunk_count();

    machine
        .publish()
        .map_err(|(_, guard)| map_guard_error("publish", &guard))
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid indexing pipeline transition during {event}: {guard:?}"
    ))
}
