use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage,
};
use serde_json::Value;

use crate::RetrievedChunk;

pub const QUERY_SYSTEM_PROMPT: &str = "You are a document assistant. Answer the user's question using only the provided context fragments. If the context does not contain the answer, say that the document does not cover it. Do not use outside knowledge.";

/// Serializes retrieved chunks into the JSON block embedded in the prompt.
pub fn chunks_to_context(chunks: &[RetrievedChunk]) -> Value {
    fn round_score(value: f32) -> f64 {
        (f64::from(value) * 1000.0).round() / 1000.0
    }

    serde_json::json!(chunks
        .iter()
        .map(|chunk| {
            serde_json::json!({
                "position": chunk.position,
                "content": chunk.text,
                "score": round_score(chunk.score),
            })
        })
        .collect::<Vec<_>>())
}

pub fn create_user_message(context_json: &Value, query: &str) -> String {
    format!(
        r"
        Context Information:
        ==================
        {context_json}

        User Question:
        ==================
        {query}
        "
    )
}

/// Builds the role-tagged message sequence for a document query.
pub fn create_query_messages(
    chunks: &[RetrievedChunk],
    query: &str,
) -> Vec<ChatCompletionRequestMessage> {
    let context_json = chunks_to_context(chunks);
    let user_message = create_user_message(&context_json, query);

    vec![
        ChatCompletionRequestSystemMessage::from(QUERY_SYSTEM_PROMPT).into(),
        ChatCompletionRequestUserMessage::from(user_message).into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(position: usize, text: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            position,
            text: text.into(),
            score,
        }
    }

    #[test]
    fn test_context_json_carries_content_and_rounded_score() {
        let context = chunks_to_context(&[chunk(0, "alpha beta", 0.98765)]);

        let first = context.get(0).expect("entry");
        assert_eq!(first.get("content").and_then(Value::as_str), Some("alpha beta"));
        assert_eq!(first.get("score").and_then(Value::as_f64), Some(0.988));
    }

    #[test]
    fn test_user_message_contains_context_and_question() {
        let context = chunks_to_context(&[chunk(0, "the cache is redis", 0.9)]);
        let message = create_user_message(&context, "what cache is used?");

        assert!(message.contains("the cache is redis"));
        assert!(message.contains("what cache is used?"));
        assert!(message.contains("Context Information"));
    }

    #[test]
    fn test_query_messages_are_system_then_user() {
        let messages = create_query_messages(&[chunk(0, "ctx", 1.0)], "question?");

        assert_eq!(messages.len(), 2);
        assert!(matches!(
            messages.first(),
            Some(ChatCompletionRequestMessage::System(_))
        ));
        assert!(matches!(
            messages.get(1),
            Some(ChatCompletionRequestMessage::User(_))
        ));
    }
}
