pub mod orchestrator;
pub mod questions;

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use common::{
    error::AppError,
    storage::{
        knowledge::KnowledgeBaseStore,
        session::SessionStore,
        types::{
            artifact::{ArtifactBundle, ArtifactKind, ArtifactSelection},
            interview_session::InterviewSession,
            knowledge_base::GLOBAL_KNOWLEDGE_BASE_ID,
        },
    },
    utils::{embedding::EmbeddingProvider, generation::Generator},
};

use crate::questions::{customized_question, template_for_round, InterviewQuestion};

/// What one interview call hands back: either the next question or, once the
/// final round is answered, the aggregated artifact bundle. A completed step
/// never carries a question.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum InterviewStep {
    Question {
        question: String,
        options: Vec<String>,
        progress: u8,
    },
    Complete {
        #[serde(flatten)]
        bundle: ArtifactBundle,
        progress: u8,
    },
}

/// Drives interview sessions: deterministic progression through the fixed
/// question sequence, per-session isolation, and orchestration of the final
/// artifact generation.
pub struct InterviewPipeline {
    sessions: SessionStore,
    knowledge: KnowledgeBaseStore,
    embedding: Arc<EmbeddingProvider>,
    generator: Arc<dyn Generator>,
    context_top_k: usize,
}

impl InterviewPipeline {
    pub fn new(
        sessions: SessionStore,
        knowledge: KnowledgeBaseStore,
        embedding: Arc<EmbeddingProvider>,
        generator: Arc<dyn Generator>,
        context_top_k: usize,
    ) -> Self {
        Self {
            sessions,
            knowledge,
            embedding,
            generator,
            context_top_k,
        }
    }

    /// Creates the session and synchronously produces the first question.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn start(
        &self,
        session_id: String,
        requirements: String,
        credential: String,
        preferences: Option<Vec<ArtifactKind>>,
    ) -> Result<InterviewStep, AppError> {
        let selection = ArtifactSelection::from_preferences(preferences);
        let mut session =
            InterviewSession::new(session_id, requirements, credential, selection);

        let question = self.next_question(&session).await;
        session.set_pending_question(question.question.clone());
        let progress = session.progress();

        info!(session_id = %session.id, "interview session started");
        self.sessions.insert(session).await;

        Ok(InterviewStep::Question {
            question: question.question,
            options: question.options,
            progress,
        })
    }

    /// Accepts one answer: advances the round and returns either the next
    /// question or, after the final round, the generated artifact bundle.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn answer(&self, session_id: &str, text: &str) -> Result<InterviewStep, AppError> {
        let handle = self
            .sessions
            .get(session_id)
            .await
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_owned()))?;

        let mut session = handle.lock().await;

        if session.is_complete() {
            return Err(AppError::SessionComplete(session_id.to_owned()));
        }

        session.record_answer(text.to_owned());

        if session.rounds_finished() {
            session.mark_complete();
            let context = self.artifact_context().await;
            let bundle =
                orchestrator::generate_artifacts(self.generator.as_ref(), &session, &context)
                    .await;
            info!(
                session_id = %session.id,
                generated = bundle.artifacts.len(),
                failed = bundle.failures.len(),
                "interview complete, artifacts generated"
            );
            return Ok(InterviewStep::Complete {
                bundle,
                progress: session.progress(),
            });
        }

        let question = self.next_question(&session).await;
        session.set_pending_question(question.question.clone());

        Ok(InterviewStep::Question {
            question: question.question,
            options: question.options,
            progress: session.progress(),
        })
    }

    async fn next_question(&self, session: &InterviewSession) -> InterviewQuestion {
        let template = template_for_round(session.round);
        let context = self.question_context(&session.requirements).await;
        customized_question(
            self.generator.as_ref(),
            template,
            &session.requirements,
            &context,
        )
        .await
        .into_question()
    }

    /// Supporting fragments for question customization, drawn from the global
    /// corpus. A missing corpus or failed retrieval degrades to no context;
    /// the interview must still progress.
    async fn question_context(&self, query: &str) -> Vec<String> {
        let Some(base) = self.knowledge.get(GLOBAL_KNOWLEDGE_BASE_ID).await else {
            return Vec::new();
        };
        match retrieval_pipeline::retrieve_texts(&base, &self.embedding, query, self.context_top_k)
            .await
        {
            Ok(texts) => texts,
            Err(e) => {
                warn!("question context retrieval failed: {e}");
                Vec::new()
            }
        }
    }

    async fn artifact_context(&self) -> Vec<String> {
        let Some(base) = self.knowledge.get(GLOBAL_KNOWLEDGE_BASE_ID).await else {
            return Vec::new();
        };
        match retrieval_pipeline::design_context(&base, &self.embedding, self.context_top_k).await
        {
            Ok(texts) => texts,
            Err(e) => {
                warn!("design context retrieval failed: {e}");
                Vec::new()
            }
        }
    }
}
