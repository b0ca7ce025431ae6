use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage,
};
use futures::future::join_all;
use tracing::{error, instrument};

use common::{
    storage::types::{
        artifact::{ArtifactBundle, ArtifactKind},
        interview_session::{InterviewSession, QuestionAnswer},
    },
    utils::generation::Generator,
};

pub const ARTIFACT_SYSTEM_PROMPT: &str = "You are a software architect producing design artifacts from gathered requirements. Follow the structural requirements for the requested artifact exactly.";

/// The structural contract each artifact kind embeds in its prompt.
fn kind_instructions(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::SequenceDiagram => {
            "Produce a Mermaid sequenceDiagram covering the main request flows between actors and services. Return only the Mermaid markup, with no prose and no code fences."
        }
        ArtifactKind::ArchitectureDiagram => {
            "Produce a Mermaid flowchart (graph TD) showing every component and how they interact. Return only the Mermaid markup, with no prose and no code fences."
        }
        ArtifactKind::SchemaDiagram => {
            "Produce a Mermaid erDiagram for the data model, including entities, fields, and relationships. Return only the Mermaid markup, with no prose and no code fences."
        }
        ArtifactKind::ApiDesign => {
            "Produce an API design document with these sections: Endpoints, Request and Response Schemas, Authentication, Error Handling, Rate Limiting, Versioning."
        }
        ArtifactKind::DeploymentDiagram => {
            "Produce a Mermaid flowchart showing the deployment topology: runtime services, networks, data stores, and third-party dependencies. Return only the Mermaid markup, with no prose and no code fences."
        }
        ArtifactKind::DesignDocument => {
            "Produce a design document with exactly these ten sections, in order: 1. Overview, 2. Requirements Summary, 3. Architecture, 4. Component Design, 5. Data Design, 6. API Design, 7. Security, 8. Scalability and Performance, 9. Deployment and Operations, 10. Cost Optimization."
        }
    }
}

fn format_answers(answers: &[QuestionAnswer]) -> String {
    answers
        .iter()
        .enumerate()
        .map(|(index, pair)| {
            format!(
                "{}. Q: {}\n   A: {}",
                index + 1,
                pair.question,
                pair.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the prompt for one artifact kind: requirements, the full ordered
/// interview transcript, and the retrieved design context.
pub fn build_artifact_messages(
    kind: ArtifactKind,
    requirements: &str,
    answers: &[QuestionAnswer],
    context: &[String],
) -> Vec<ChatCompletionRequestMessage> {
    let user_message = format!(
        r"
        Project requirements:
        ==================
        {requirements}

        Interview answers:
        ==================
        {}

        Supporting context:
        ==================
        {}

        Requested artifact: {}
        ==================
        {}
        ",
        format_answers(answers),
        context.join("\n---\n"),
        kind.label(),
        kind_instructions(kind),
    );

    vec![
        ChatCompletionRequestSystemMessage::from(ARTIFACT_SYSTEM_PROMPT).into(),
        ChatCompletionRequestUserMessage::from(user_message).into(),
    ]
}

/// Generates every requested artifact concurrently. One generation call per
/// kind, no retries; a failed kind is recorded in the bundle and never stops
/// its siblings.
#[instrument(skip_all, fields(session_id = %session.id, kinds = session.artifacts.len()))]
pub async fn generate_artifacts(
    generator: &dyn Generator,
    session: &InterviewSession,
    context: &[String],
) -> ArtifactBundle {
    let kinds: Vec<ArtifactKind> = session.artifacts.iter().collect();

    let outcomes = join_all(kinds.into_iter().map(|kind| async move {
        let messages =
            build_artifact_messages(kind, &session.requirements, &session.answers, context);
        (kind, generator.complete(messages).await)
    }))
    .await;

    let mut bundle = ArtifactBundle::default();
    for (kind, outcome) in outcomes {
        match outcome {
            Ok(content) => bundle.record_success(kind, content),
            Err(e) => {
                error!(kind = kind.label(), "artifact generation failed: {e}");
                bundle.record_failure(kind, e.to_string());
            }
        }
    }

    bundle
}
