use super::chunker::split_into_chunks;
use super::model::{LanguageModel, ModelError};
use crate::constants::{CHUNK_OVERLAP, CHUNK_SIZE};

/// Cosine similarity with a small epsilon so zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt() + 1e-8)
}

#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Embedded knowledge base chunks
#[derive(Debug)]
pub struct KnowledgeIndex {
    chunks: Vec<IndexedChunk>,
}

impl KnowledgeIndex {
    /// Chunk the text and embed each chunk, one request at a time
    pub async fn build(text: &str, model: &dyn LanguageModel) -> Result<Self, ModelError> {
        let raw = split_into_chunks(text, CHUNK_SIZE, CHUNK_OVERLAP);
        if raw.is_empty() {
            return Err(ModelError::EmptyKnowledgeBase);
        }

        let mut chunks = Vec::with_capacity(raw.len());
        for (i, text) in raw.into_iter().enumerate() {
            let embedding = model.embed(&text).await?;
            chunks.push(IndexedChunk {
                id: format!("chunk-{}", i),
                text,
                embedding,
            });
        }

        tracing::info!("Knowledge index built with {} chunks", chunks.len());

        Ok(Self { chunks })
    }

    /// Top `k` chunks by similarity to an already embedded query
    pub fn rank(&self, query_embedding: &[f32], k: usize) -> Vec<&IndexedChunk> {
        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(query_embedding, &chunk.embedding), chunk))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().take(k).map(|(_, chunk)| chunk).collect()
    }

    /// Embed the query and return the `k` closest chunks
    pub async fn retrieve(
        &self,
        model: &dyn LanguageModel,
        query: &str,
        k: usize,
    ) -> Result<Vec<&IndexedChunk>, ModelError> {
        let query_embedding = model.embed(query).await?;
        Ok(self.rank(&query_embedding, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(embeddings: Vec<Vec<f32>>) -> KnowledgeIndex {
        KnowledgeIndex {
            chunks: embeddings
                .into_iter()
                .enumerate()
                .map(|(i, embedding)| IndexedChunk {
                    id: format!("chunk-{}", i),
                    text: format!("text {}", i),
                    embedding,
                })
                .collect(),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-5);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-5);
        // Zero vector does not divide by zero
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_rank_orders_by_similarity() {
        let idx = index(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.7, 0.7],
        ]);

        let top: Vec<&str> = idx
            .rank(&[1.0, 0.1], 2)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(top, vec!["chunk-1", "chunk-2"]);
    }

    #[test]
    fn test_rank_caps_at_available_chunks() {
        let idx = index(vec![vec![1.0], vec![0.5]]);
        assert_eq!(idx.rank(&[1.0], 5).len(), 2);
        assert!(idx.rank(&[1.0], 0).is_empty());
    }
}
