use std::{pin::Pin, sync::Arc, time::Duration};

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageContent,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_stream::stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::time::timeout;
use tracing::debug;

use crate::error::AppError;

/// A lazy sequence of generated text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, AppError>> + Send>>;

/// The language-model collaborator: takes a role-tagged message sequence and
/// returns either the complete text or a lazy fragment stream.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<String, AppError>;

    async fn stream_completion(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<FragmentStream, AppError>;
}

/// Generator backed by the OpenAI chat API, with an explicit call timeout so a
/// stalled collaborator surfaces as a fault instead of a hung request.
pub struct OpenAiGenerator {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    timeout_secs: u64,
}

impl OpenAiGenerator {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String, timeout_secs: u64) -> Self {
        Self {
            client,
            model,
            timeout_secs,
        }
    }

    fn build_request(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<CreateChatCompletionRequest, AppError> {
        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(AppError::from)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<String, AppError> {
        let request = self.build_request(messages)?;

        let response = timeout(
            Duration::from_secs(self.timeout_secs),
            self.client.chat().create(request),
        )
        .await
        .map_err(|_| AppError::GenerationTimeout(self.timeout_secs))??;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AppError::LLMParsing(
                "No content found in LLM response".into(),
            ))
    }

    async fn stream_completion(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<FragmentStream, AppError> {
        let request = self.build_request(messages)?;

        let mut upstream = timeout(
            Duration::from_secs(self.timeout_secs),
            self.client.chat().create_stream(request),
        )
        .await
        .map_err(|_| AppError::GenerationTimeout(self.timeout_secs))??;

        debug!("chat completion stream created");

        let fragments = stream! {
            while let Some(result) = upstream.next().await {
                match result {
                    Ok(response) => {
                        let content = response
                            .choices
                            .first()
                            .and_then(|choice| choice.delta.content.clone())
                            .unwrap_or_default();
                        if !content.is_empty() {
                            yield Ok(content);
                        }
                    }
                    Err(e) => {
                        yield Err(AppError::from(e));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(fragments))
    }
}

/// Deterministic generator for smoke mode: echoes the request back in small
/// fragments without touching the network.
pub struct SmokeGenerator;

pub const SMOKE_FRAGMENT_CHARS: usize = 10;

impl SmokeGenerator {
    fn canned_response(messages: &[ChatCompletionRequestMessage]) -> String {
        let user_message = messages
            .iter()
            .rev()
            .find_map(|message| match message {
                ChatCompletionRequestMessage::User(user) => match &user.content {
                    ChatCompletionRequestUserMessageContent::Text(text) => Some(text.clone()),
                    ChatCompletionRequestUserMessageContent::Array(_) => None,
                },
                _ => None,
            })
            .unwrap_or_default();

        format!("Smoke response: you said '{user_message}'. No model was called.")
    }
}

#[async_trait]
impl Generator for SmokeGenerator {
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<String, AppError> {
        Ok(Self::canned_response(&messages))
    }

    async fn stream_completion(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<FragmentStream, AppError> {
        let response = Self::canned_response(&messages);
        let fragments: Vec<Result<String, AppError>> = split_fragments(&response)
            .into_iter()
            .map(Ok)
            .collect();

        Ok(Box::pin(futures::stream::iter(fragments)))
    }
}

fn split_fragments(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(SMOKE_FRAGMENT_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::ChatCompletionRequestUserMessage;

    fn user_message(text: &str) -> Vec<ChatCompletionRequestMessage> {
        vec![ChatCompletionRequestUserMessage::from(text).into()]
    }

    #[tokio::test]
    async fn test_smoke_complete_echoes_user_message() {
        let generator = SmokeGenerator;

        let output = generator
            .complete(user_message("what is the schema?"))
            .await
            .expect("completion");

        assert!(output.contains("what is the schema?"));
        assert!(output.contains("No model was called"));
    }

    #[tokio::test]
    async fn test_smoke_stream_fragments_reassemble() {
        let generator = SmokeGenerator;

        let mut stream = generator
            .stream_completion(user_message("ping"))
            .await
            .expect("stream");

        let mut collected = String::new();
        let mut fragment_count = 0usize;
        while let Some(fragment) = stream.next().await {
            let fragment = fragment.expect("fragment");
            assert!(fragment.chars().count() <= SMOKE_FRAGMENT_CHARS);
            collected.push_str(&fragment);
            fragment_count += 1;
        }

        let expected = generator
            .complete(user_message("ping"))
            .await
            .expect("completion");
        assert_eq!(collected, expected);
        assert!(fragment_count > 1);
    }
}
