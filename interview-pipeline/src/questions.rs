use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage,
};
use serde::Serialize;
use tracing::warn;

use common::utils::generation::Generator;

/// Fixed question sequence; the round number indexes into this list, capped
/// at the final entry.
pub static QUESTION_TEMPLATES: [QuestionTemplate; 5] = [
    QuestionTemplate {
        question: "How many users do you expect the system to serve?",
        options: [
            "Under 1,000 users",
            "1,000 to 100,000 users",
            "100,000 to 1 million users",
            "More than 1 million users",
        ],
    },
    QuestionTemplate {
        question: "What kind of data will the system primarily manage?",
        options: [
            "Structured relational records",
            "Documents and semi-structured content",
            "Media files such as images or video",
            "Event streams and time-series data",
        ],
    },
    QuestionTemplate {
        question: "Which interaction pattern matters most to your users?",
        options: [
            "Classic request/response pages and forms",
            "Real-time updates and live collaboration",
            "Scheduled batch processing and reports",
            "Offline-first usage with background sync",
        ],
    },
    QuestionTemplate {
        question: "What are your security and compliance constraints?",
        options: [
            "Basic account authentication is enough",
            "Enterprise single sign-on integration",
            "Regulated data such as health or payment records",
            "Mostly public data with minimal restrictions",
        ],
    },
    QuestionTemplate {
        question: "How do you plan to deploy and operate the system?",
        options: [
            "A single cloud virtual machine",
            "Managed containers or Kubernetes",
            "Serverless functions and managed services",
            "On-premise infrastructure",
        ],
    },
];

pub const CUSTOMIZE_SYSTEM_PROMPT: &str = "You adapt multiple-choice interview questions for a software design session. Rewrite the given question and its four options so they speak to the stated project, keeping the same topic. Respond in exactly this format with no other lines:\nQuestion: <the question>\nA) <first option>\nB) <second option>\nC) <third option>\nD) <fourth option>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionTemplate {
    pub question: &'static str,
    pub options: [&'static str; 4],
}

/// A question as presented to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterviewQuestion {
    pub question: String,
    pub options: Vec<String>,
}

impl From<&QuestionTemplate> for InterviewQuestion {
    fn from(template: &QuestionTemplate) -> Self {
        Self {
            question: template.question.to_owned(),
            options: template.options.iter().map(|o| (*o).to_owned()).collect(),
        }
    }
}

/// Whether the presented question came from the model or fell back to the
/// verbatim template. The validation predicate decides; malformed model
/// output is not an error path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionOutcome {
    Customized(InterviewQuestion),
    Fallback(InterviewQuestion),
}

impl QuestionOutcome {
    pub fn into_question(self) -> InterviewQuestion {
        match self {
            Self::Customized(question) | Self::Fallback(question) => question,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

pub fn template_for_round(round: usize) -> &'static QuestionTemplate {
    let index = round.min(QUESTION_TEMPLATES.len().saturating_sub(1));
    QUESTION_TEMPLATES
        .get(index)
        .unwrap_or(&QUESTION_TEMPLATES[0])
}

/// Accepts model output only when it carries a labelled question and all four
/// labelled options, in order.
pub fn validate_customization(raw: &str) -> Option<InterviewQuestion> {
    const OPTION_LABELS: [&str; 4] = ["A)", "B)", "C)", "D)"];

    let mut question: Option<String> = None;
    let mut options: Vec<String> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Question:") {
            let rest = rest.trim();
            if question.is_none() && !rest.is_empty() {
                question = Some(rest.to_owned());
            }
            continue;
        }
        if let Some(label) = OPTION_LABELS.get(options.len()) {
            if let Some(rest) = line.strip_prefix(label) {
                let rest = rest.trim();
                if rest.is_empty() {
                    return None;
                }
                options.push(rest.to_owned());
            }
        }
    }

    let question = question?;
    if options.len() != OPTION_LABELS.len() {
        return None;
    }

    Some(InterviewQuestion { question, options })
}

pub fn build_customize_messages(
    template: &QuestionTemplate,
    requirements: &str,
    context: &[String],
) -> Vec<ChatCompletionRequestMessage> {
    let options = template
        .options
        .iter()
        .zip(["A)", "B)", "C)", "D)"])
        .map(|(option, label)| format!("{label} {option}"))
        .collect::<Vec<_>>()
        .join("\n");

    let user_message = format!(
        r"
        Project requirements:
        ==================
        {requirements}

        Supporting context:
        ==================
        {}

        Question to adapt:
        ==================
        Question: {}
        {options}
        ",
        context.join("\n---\n"),
        template.question,
    );

    vec![
        ChatCompletionRequestSystemMessage::from(CUSTOMIZE_SYSTEM_PROMPT).into(),
        ChatCompletionRequestUserMessage::from(user_message).into(),
    ]
}

/// Asks the Generator to tailor the template; any malformed or failed
/// customization falls back to the verbatim template and its options.
pub async fn customized_question(
    generator: &dyn Generator,
    template: &QuestionTemplate,
    requirements: &str,
    context: &[String],
) -> QuestionOutcome {
    let messages = build_customize_messages(template, requirements, context);

    match generator.complete(messages).await {
        Ok(raw) => match validate_customization(&raw) {
            Some(question) => QuestionOutcome::Customized(question),
            None => QuestionOutcome::Fallback(template.into()),
        },
        Err(e) => {
            warn!("question customization failed, using template: {e}");
            QuestionOutcome::Fallback(template.into())
        }
    }
}
