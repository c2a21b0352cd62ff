use crate::config::SimilarityMetric;
use crate::error::{RagError, Result};
use crate::models::{ScoredChunk, TextChunk};

/// Flat in-memory index over one document's chunks.
///
/// Built per request and dropped with it. Search is a linear scan, which is
/// fine for a single uploaded document and nothing larger.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<(TextChunk, Vec<f32>)>,
    dimensions: usize,
    metric: SimilarityMetric,
}

impl VectorIndex {
    /// Pairs chunks with their vectors. Counts must match and every vector
    /// must share one non-zero dimension.
    pub fn build(chunks: Vec<TextChunk>, embeddings: Vec<Vec<f32>>, metric: SimilarityMetric) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::Index(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = embeddings.iter().position(|e| e.len() != dimensions || e.is_empty()) {
            return Err(RagError::Index(format!(
                "embedding {} has {} dimensions, expected {}",
                bad,
                embeddings[bad].len(),
                dimensions
            )));
        }

        log::info!("Indexed {} chunks ({} dimensions)", chunks.len(), dimensions);
        Ok(Self {
            entries: chunks.into_iter().zip(embeddings).collect(),
            dimensions,
            metric,
        })
    }

    /// Returns up to `top_k` chunks, most similar first. Equal scores keep the
    /// chunks' original order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if !self.entries.is_empty() && query.len() != self.dimensions {
            return Err(RagError::Index(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| ScoredChunk {
                chunk: chunk.clone(),
                score: self.score(query, embedding),
            })
            .collect();

        // Stable sort: ties stay in chunk order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);

        log::info!("Found {} relevant chunks", scored.len());
        Ok(scored)
    }

    fn score(&self, query: &[f32], embedding: &[f32]) -> f32 {
        match self.metric {
            SimilarityMetric::Cosine => cosine_similarity(query, embedding),
            SimilarityMetric::Euclidean => -euclidean_distance(query, embedding),
        }
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}
