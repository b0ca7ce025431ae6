use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
    time::Duration,
};

use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use tokio::time::timeout;
use tracing::debug;

use crate::{
    error::AppError,
    utils::config::{AppConfig, EmbeddingBackend},
};

/// Produces embedding vectors for chunk and query text.
///
/// The OpenAI backend delegates to the embeddings API; the hashed backend is a
/// deterministic bag-of-tokens projection used in tests and smoke mode, where
/// no network may be touched. Both backends return unit-norm vectors of the
/// configured dimension, and batch output order always equals input order.
#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: EmbeddingInner,
}

#[derive(Clone)]
enum EmbeddingInner {
    OpenAi {
        client: Arc<Client<OpenAIConfig>>,
        model: String,
        dimensions: u32,
        timeout_secs: u64,
    },
    Hashed {
        dimension: usize,
    },
}

impl EmbeddingProvider {
    pub fn from_config(
        config: &AppConfig,
        client: Option<Arc<Client<OpenAIConfig>>>,
    ) -> Result<Self, AppError> {
        match config.embedding_backend {
            EmbeddingBackend::Hashed => {
                Self::new_hashed(usize::try_from(config.embedding_dimensions).unwrap_or(384))
            }
            EmbeddingBackend::OpenAi => {
                let client = client.ok_or_else(|| {
                    AppError::InternalError(
                        "OpenAI embedding backend requires a configured client".into(),
                    )
                })?;
                Ok(Self::new_openai(
                    client,
                    config.embedding_model.clone(),
                    config.embedding_dimensions,
                    config.generation_timeout_secs,
                ))
            }
        }
    }

    pub fn new_openai(
        client: Arc<Client<OpenAIConfig>>,
        model: String,
        dimensions: u32,
        timeout_secs: u64,
    ) -> Self {
        EmbeddingProvider {
            inner: EmbeddingInner::OpenAi {
                client,
                model,
                dimensions,
                timeout_secs,
            },
        }
    }

    pub fn new_hashed(dimension: usize) -> Result<Self, AppError> {
        Ok(EmbeddingProvider {
            inner: EmbeddingInner::Hashed {
                dimension: dimension.max(1),
            },
        })
    }

    pub fn backend_label(&self) -> &'static str {
        match self.inner {
            EmbeddingInner::Hashed { .. } => "hashed",
            EmbeddingInner::OpenAi { .. } => "openai",
        }
    }

    pub fn dimension(&self) -> usize {
        match &self.inner {
            EmbeddingInner::Hashed { dimension } => *dimension,
            EmbeddingInner::OpenAi { dimensions, .. } => *dimensions as usize,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        match &self.inner {
            EmbeddingInner::Hashed { dimension } => Ok(hashed_embedding(text, *dimension)),
            EmbeddingInner::OpenAi {
                client,
                model,
                dimensions,
                timeout_secs,
            } => {
                let request = CreateEmbeddingRequestArgs::default()
                    .model(model.clone())
                    .input([text])
                    .dimensions(*dimensions)
                    .build()
                    .map_err(|e| AppError::Embedding(e.to_string()))?;

                let response = timeout(
                    Duration::from_secs(*timeout_secs),
                    client.embeddings().create(request),
                )
                .await
                .map_err(|_| {
                    AppError::Embedding(format!("embedding call timed out after {timeout_secs}s"))
                })?
                .map_err(|e| AppError::Embedding(e.to_string()))?;

                let embedding = response
                    .data
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        AppError::Embedding("no embedding data received for input".into())
                    })?
                    .embedding;

                debug!(dimensions = embedding.len(), "embedding created");

                Ok(embedding)
            }
        }
    }

    pub async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        match &self.inner {
            EmbeddingInner::Hashed { dimension } => Ok(texts
                .into_iter()
                .map(|text| hashed_embedding(&text, *dimension))
                .collect()),
            EmbeddingInner::OpenAi {
                client,
                model,
                dimensions,
                timeout_secs,
            } => {
                let expected = texts.len();
                let request = CreateEmbeddingRequestArgs::default()
                    .model(model.clone())
                    .input(texts)
                    .dimensions(*dimensions)
                    .build()
                    .map_err(|e| AppError::Embedding(e.to_string()))?;

                let response = timeout(
                    Duration::from_secs(*timeout_secs),
                    client.embeddings().create(request),
                )
                .await
                .map_err(|_| {
                    AppError::Embedding(format!("embedding call timed out after {timeout_secs}s"))
                })?
                .map_err(|e| AppError::Embedding(e.to_string()))?;

                let embeddings: Vec<Vec<f32>> = response
                    .data
                    .into_iter()
                    .map(|item| item.embedding)
                    .collect();

                if embeddings.len() != expected {
                    return Err(AppError::Embedding(format!(
                        "expected {expected} embeddings, received {}",
                        embeddings.len()
                    )));
                }

                Ok(embeddings)
            }
        }
    }
}

// Helper functions for hashed embeddings
fn hashed_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let dim = dimension.max(1);
    let mut vector = vec![0.0f32; dim];
    if text.is_empty() {
        return vector;
    }

    let mut token_count = 0f32;
    for token in tokens(text) {
        token_count += 1.0;
        let idx = bucket(&token, dim);
        if let Some(value) = vector.get_mut(idx) {
            *value += 1.0;
        }
    }

    if token_count == 0.0 {
        return vector;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }

    vector
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
}

fn bucket(token: &str, dimension: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % dimension
}
