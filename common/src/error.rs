use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Authorization error: {0}")]
    Auth(String),
    #[error("Invalid chunk configuration: {0}")]
    ChunkConfig(String),
    #[error("Embedding failure: {0}")]
    Embedding(String),
    #[error("Generation timed out after {0}s")]
    GenerationTimeout(u64),
    #[error("LLM parsing error: {0}")]
    LLMParsing(String),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Session already complete: {0}")]
    SessionComplete(String),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Internal service error: {0}")]
    InternalError(String),
}
