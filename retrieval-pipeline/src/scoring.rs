use std::cmp::Ordering;

use common::storage::types::knowledge_base::EmbeddedChunk;

/// Cosine similarity with defensive normalization: vectors are not assumed to
/// be unit length, mismatched or zero-norm vectors score 0 instead of NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator <= f32::EPSILON || !denominator.is_finite() {
        return 0.0;
    }

    dot / denominator
}

/// Scores every entry against the query vector and returns the `k` best as
/// `(position, score)` pairs, best first. The sort is stable, so equal scores
/// keep insertion order — the earlier chunk wins a tie.
pub fn top_k(entries: &[EmbeddedChunk], query: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = entries
        .iter()
        .map(|entry| (entry.position, cosine_similarity(&entry.embedding, query)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}
