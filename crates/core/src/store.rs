use crate::embeddings::Embedder;
use crate::error::QaError;
use crate::models::{DocumentChunk, ScoredChunk};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

const SNAPSHOT_FILE: &str = "index.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    chunk: DocumentChunk,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    dimensions: usize,
    created_at: DateTime<Utc>,
    entries: Vec<StoredEntry>,
}

/// On-disk collection of (chunk, embedding) pairs with cosine
/// nearest-neighbor search. A snapshot is written once by ingestion and
/// loaded read-only for querying; there are no update or delete paths.
pub struct VectorStore {
    dimensions: usize,
    entries: Vec<StoredEntry>,
}

impl VectorStore {
    pub fn exists(dir: &Path) -> bool {
        dir.join(SNAPSHOT_FILE).is_file()
    }

    /// Embeds `chunks` and persists the snapshot under `dir`, replacing any
    /// existing snapshot at that path. No merge semantics.
    pub async fn create(
        dir: &Path,
        chunks: Vec<DocumentChunk>,
        embedder: &dyn Embedder,
    ) -> Result<Self, QaError> {
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        let dimensions = embedder.dimensions();
        for embedding in &embeddings {
            if embedding.len() != dimensions {
                return Err(QaError::DimensionMismatch {
                    expected: dimensions,
                    actual: embedding.len(),
                });
            }
        }

        let entries: Vec<StoredEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| StoredEntry { chunk, embedding })
            .collect();

        let snapshot = Snapshot {
            dimensions,
            created_at: Utc::now(),
            entries,
        };

        fs::create_dir_all(dir)?;
        fs::write(dir.join(SNAPSHOT_FILE), serde_json::to_vec(&snapshot)?)?;

        info!(
            dir = %dir.display(),
            chunk_count = snapshot.entries.len(),
            dimensions,
            "persisted vector store snapshot"
        );

        Ok(Self {
            dimensions,
            entries: snapshot.entries,
        })
    }

    /// Opens an existing snapshot for querying. The snapshot's
    /// dimensionality must match the embedder that will produce query
    /// vectors against it.
    pub fn load(dir: &Path, expected_dimensions: usize) -> Result<Self, QaError> {
        let path = dir.join(SNAPSHOT_FILE);
        if !path.is_file() {
            return Err(QaError::StoreNotFound(dir.display().to_string()));
        }

        let snapshot: Snapshot = serde_json::from_slice(&fs::read(&path)?)?;

        if snapshot.dimensions != expected_dimensions {
            return Err(QaError::DimensionMismatch {
                expected: expected_dimensions,
                actual: snapshot.dimensions,
            });
        }

        Ok(Self {
            dimensions: snapshot.dimensions,
            entries: snapshot.entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the `top_k` stored chunks nearest to `query_vector` by
    /// cosine similarity, nearest first.
    pub fn similarity_search(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, QaError> {
        if query_vector.len() != self.dimensions {
            return Err(QaError::DimensionMismatch {
                expected: self.dimensions,
                actual: query_vector.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_vector, &entry.embedding),
            })
            .collect();

        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(top_k);

        Ok(scored)
    }
}

fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    let mut dot = 0f32;
    let mut left_norm = 0f32;
    let mut right_norm = 0f32;

    for (a, b) in left.iter().zip(right.iter()) {
        dot += a * b;
        left_norm += a * a;
        right_norm += b * b;
    }

    let denominator = left_norm.sqrt() * right_norm.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    dot / denominator
}
