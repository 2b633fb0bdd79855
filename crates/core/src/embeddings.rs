use crate::config::RagConfig;
use crate::error::QaError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// The batchEmbedContents endpoint rejects larger request batches.
const MAX_BATCH_SIZE: usize = 100;

/// Turns text into fixed-dimensionality vectors. Callers may rely on every
/// returned vector having exactly `dimensions()` entries.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, QaError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, QaError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| QaError::BackendResponse {
            backend: "embedder".to_string(),
            details: "no embedding returned for query".to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: RequestContent<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Remote embedder backed by the Gemini batchEmbedContents API. No retry
/// or backoff, transient failures propagate to the caller.
pub struct GeminiEmbedder {
    endpoint: Url,
    api_key: String,
    model: String,
    dimensions: usize,
    client: Client,
}

impl GeminiEmbedder {
    pub fn new(config: &RagConfig) -> Result<Self, QaError> {
        if config.api_key.trim().is_empty() {
            return Err(QaError::MissingCredential(
                "embedding api key is empty".to_string(),
            ));
        }

        let endpoint = Url::parse(&format!(
            "{}/v1beta/{}:batchEmbedContents",
            config.api_base_url.trim_end_matches('/'),
            config.embedding_model
        ))?;

        Ok(Self {
            endpoint,
            api_key: config.api_key.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
            client: Client::new(),
        })
    }

    async fn embed_one_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, QaError> {
        let payload = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: &self.model,
                    content: RequestContent {
                        parts: vec![RequestPart { text }],
                    },
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QaError::BackendResponse {
                backend: "gemini-embeddings".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: BatchEmbedResponse = response.json().await?;

        if parsed.embeddings.len() != texts.len() {
            return Err(QaError::BackendResponse {
                backend: "gemini-embeddings".to_string(),
                details: format!(
                    "requested {} embeddings, received {}",
                    texts.len(),
                    parsed.embeddings.len()
                ),
            });
        }

        let mut vectors = Vec::with_capacity(parsed.embeddings.len());
        for embedding in parsed.embeddings {
            if embedding.values.len() != self.dimensions {
                return Err(QaError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: embedding.values.len(),
                });
            }
            vectors.push(embedding.values);
        }

        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, QaError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH_SIZE) {
            debug!(batch_size = batch.len(), "embedding batch");
            vectors.extend(self.embed_one_batch(batch).await?);
        }

        Ok(vectors)
    }
}

/// Deterministic local embedder hashing character trigrams into a fixed
/// number of buckets, L2-normalized. No credential and no network; useful
/// for offline tests and smoke runs of the store.
#[derive(Debug, Clone, Copy)]
pub struct HashedNgramEmbedder {
    pub dimensions: usize,
}

impl Default for HashedNgramEmbedder {
    fn default() -> Self {
        Self { dimensions: 128 }
    }
}

impl HashedNgramEmbedder {
    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl Embedder for HashedNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, QaError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{Embedder, GeminiEmbedder, HashedNgramEmbedder};
    use crate::config::RagConfig;
    use crate::error::QaError;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> RagConfig {
        let mut config = RagConfig::new("test-key");
        config.api_base_url = base_url.to_string();
        config.embedding_dimensions = 3;
        config
    }

    #[tokio::test]
    async fn hashed_embedder_is_deterministic_and_sized() {
        let embedder = HashedNgramEmbedder { dimensions: 32 };
        let first = embedder.embed_query("hydraulic pressure and flow").await.unwrap();
        let second = embedder.embed_query("hydraulic pressure and flow").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn empty_credential_is_rejected_before_any_request() {
        let config = RagConfig::new("  ");
        let result = GeminiEmbedder::new(&config);
        assert!(matches!(result, Err(QaError::MissingCredential(_))));
    }

    #[tokio::test]
    async fn batch_embedding_parses_vectors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/embedding-001:batchEmbedContents"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [
                    { "values": [0.1, 0.2, 0.3] },
                    { "values": [0.4, 0.5, 0.6] }
                ]
            })))
            .mount(&server)
            .await;

        let embedder = GeminiEmbedder::new(&test_config(&server.uri())).unwrap();
        let vectors = embedder
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn wrong_dimensionality_fails_fast() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [ { "values": [0.1, 0.2] } ]
            })))
            .mount(&server)
            .await;

        let embedder = GeminiEmbedder::new(&test_config(&server.uri())).unwrap();
        let result = embedder.embed_query("query").await;

        assert!(matches!(
            result,
            Err(QaError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn remote_failure_propagates_as_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let embedder = GeminiEmbedder::new(&test_config(&server.uri())).unwrap();
        let result = embedder.embed_query("query").await;

        assert!(matches!(result, Err(QaError::BackendResponse { .. })));
    }
}
