use crate::embeddings::Embedder;
use crate::error::QaError;
use crate::models::ScoredChunk;
use crate::store::VectorStore;
use tracing::debug;

/// Uniform query interface over the vector store: embed the query, run the
/// similarity search with a fixed result count.
pub struct Retriever<E>
where
    E: Embedder,
{
    store: VectorStore,
    embedder: E,
    top_k: usize,
}

impl<E> Retriever<E>
where
    E: Embedder,
{
    pub fn new(store: VectorStore, embedder: E, top_k: usize) -> Self {
        Self {
            store,
            embedder,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>, QaError> {
        let query_vector = self.embedder.embed_query(query).await?;
        let hits = self.store.similarity_search(&query_vector, self.top_k)?;
        debug!(query, hit_count = hits.len(), "retrieved chunks");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::Retriever;
    use crate::embeddings::{Embedder, HashedNgramEmbedder};
    use crate::models::DocumentChunk;
    use crate::store::VectorStore;
    use tempfile::tempdir;

    fn chunk(index: u64, text: &str) -> DocumentChunk {
        DocumentChunk {
            chunk_id: format!("chunk-{index}"),
            document_id: "doc-1".to_string(),
            source_path: "/tmp/doc.pdf".to_string(),
            title: "doc.pdf".to_string(),
            page: 1,
            chunk_index: index,
            text: text.to_string(),
        }
    }

    async fn store_with_corpus(dir: &std::path::Path) -> VectorStore {
        let embedder = HashedNgramEmbedder::default();
        VectorStore::create(
            dir,
            vec![
                chunk(0, "The capital of France is Paris."),
                chunk(1, "Gear pumps are positive displacement pumps."),
                chunk(2, "Borrow checking enforces aliasing rules."),
            ],
            &embedder,
        )
        .await
        .unwrap();
        VectorStore::load(dir, embedder.dimensions()).unwrap()
    }

    #[tokio::test]
    async fn retrieval_is_capped_at_top_k_and_ordered() {
        let dir = tempdir().unwrap();
        let store = store_with_corpus(dir.path()).await;
        let retriever = Retriever::new(store, HashedNgramEmbedder::default(), 2);

        let hits = retriever.retrieve("What is the capital of France?").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
        assert!(hits[0].chunk.text.contains("Paris"));
    }

    #[tokio::test]
    async fn whitespace_query_still_runs_the_search() {
        let dir = tempdir().unwrap();
        let store = store_with_corpus(dir.path()).await;
        let retriever = Retriever::new(store, HashedNgramEmbedder::default(), 3);

        let hits = retriever.retrieve("   ").await.unwrap();
        assert_eq!(hits.len(), 3);
    }
}
