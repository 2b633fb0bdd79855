use crate::embeddings::Embedder;
use crate::error::QaError;
use crate::generation::TextGenerator;
use crate::models::{Answer, ScoredChunk};
use crate::retriever::Retriever;
use tracing::debug;

/// Answers a question by retrieving relevant chunks and prompting the
/// generator with them as grounding context.
pub struct QueryEngine<E, G>
where
    E: Embedder,
    G: TextGenerator,
{
    retriever: Retriever<E>,
    generator: G,
}

impl<E, G> QueryEngine<E, G>
where
    E: Embedder,
    G: TextGenerator,
{
    pub fn new(retriever: Retriever<E>, generator: G) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<Answer, QaError> {
        let sources = self.retriever.retrieve(query).await?;
        let prompt = build_prompt(query, &sources);
        debug!(source_count = sources.len(), "generating answer");

        let text = self.generator.generate(&prompt).await?;

        Ok(Answer { text, sources })
    }
}

fn build_prompt(query: &str, sources: &[ScoredChunk]) -> String {
    let mut prompt = String::from(
        "Answer the question using only the context below. \
         If the context does not contain the answer, say so.\n\n",
    );

    for (position, source) in sources.iter().enumerate() {
        prompt.push_str(&format!(
            "Context {} (from {}, page {}):\n{}\n\n",
            position + 1,
            source.chunk.title,
            source.chunk.page,
            source.chunk.text.trim()
        ));
    }

    prompt.push_str(&format!("Question: {query}\nAnswer:"));
    prompt
}
