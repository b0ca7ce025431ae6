use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id of the knowledge base built from the bundled corpus at startup.
pub const GLOBAL_KNOWLEDGE_BASE_ID: &str = "global";

/// One document fragment together with its embedding vector. The pairing is
/// one-to-one and the position records insertion order for search tie-breaks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedChunk {
    pub position: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// An insertion-ordered embedding index over one document's chunks.
///
/// A base is assembled fully in memory and published into the store in one
/// step; after publication it is never mutated, so concurrent searches always
/// observe a complete index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: String,
    pub source_name: String,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<EmbeddedChunk>,
}

impl KnowledgeBase {
    pub fn new(source_name: String, entries: Vec<EmbeddedChunk>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), source_name, entries)
    }

    pub fn with_id(id: String, source_name: String, entries: Vec<EmbeddedChunk>) -> Self {
        Self {
            id,
            source_name,
            created_at: Utc::now(),
            entries,
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_follow_insertion_order() {
        let entries = vec![
            EmbeddedChunk {
                position: 0,
                text: "first".into(),
                embedding: vec![1.0, 0.0],
            },
            EmbeddedChunk {
                position: 1,
                text: "second".into(),
                embedding: vec![0.0, 1.0],
            },
        ];

        let base = KnowledgeBase::new("notes.txt".into(), entries);

        assert_eq!(base.chunk_count(), 2);
        for (index, entry) in base.entries.iter().enumerate() {
            assert_eq!(entry.position, index);
        }
    }
}
