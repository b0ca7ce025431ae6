use common::storage::types::knowledge_base::EmbeddedChunk;

/// Mutable scratch state threaded through the indexing stages. Nothing here
/// is observable outside the pipeline until the publish stage commits the
/// finished base to the store.
pub struct IndexingContext {
    pub document_id: String,
    pub source_name: String,
    pub text: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub chunks: Vec<String>,
    pub embedded: Vec<EmbeddedChunk>,
    pub chunk_count: usize,
}

impl IndexingContext {
    pub fn new(
        document_id: String,
        source_name: String,
        text: String,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            document_id,
            source_name,
            text,
            chunk_size,
            chunk_overlap,
            chunks: Vec::new(),
            embedded: Vec::new(),
            chunk_count: 0,
        }
    }
}
