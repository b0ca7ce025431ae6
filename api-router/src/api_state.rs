use std::{sync::Arc, time::Duration};

use common::{
    storage::{knowledge::KnowledgeBaseStore, session::SessionStore},
    utils::{config::AppConfig, embedding::EmbeddingProvider, generation::Generator},
};
use ingestion_pipeline::IndexingPipeline;
use interview_pipeline::InterviewPipeline;

#[derive(Clone)]
pub struct ApiState {
    pub knowledge: KnowledgeBaseStore,
    pub sessions: SessionStore,
    pub embedding: Arc<EmbeddingProvider>,
    pub generator: Arc<dyn Generator>,
    pub indexing: Arc<IndexingPipeline>,
    pub interviews: Arc<InterviewPipeline>,
    pub config: AppConfig,
}

impl ApiState {
    pub fn new(
        config: AppConfig,
        embedding: Arc<EmbeddingProvider>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let knowledge = KnowledgeBaseStore::new();
        let sessions = SessionStore::new(Duration::from_secs(config.session_ttl_secs));

        let indexing = Arc::new(IndexingPipeline::new(Arc::clone(&embedding), &config));
        let interviews = Arc::new(InterviewPipeline::new(
            sessions.clone(),
            knowledge.clone(),
            Arc::clone(&embedding),
            Arc::clone(&generator),
            config.retrieval_top_k,
        ));

        Self {
            knowledge,
            sessions,
            embedding,
            generator,
            indexing,
            interviews,
            config,
        }
    }
}
