use crate::config::RagConfig;
use crate::error::QaError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

/// Generative language-model call: prompt in, answer text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, QaError>;
}

/// Remote generator backed by the Gemini generateContent API, sampling at
/// the configured low temperature. Failures propagate, no retry.
pub struct GeminiGenerator {
    endpoint: Url,
    api_key: String,
    temperature: f32,
    client: Client,
}

impl GeminiGenerator {
    pub fn new(config: &RagConfig) -> Result<Self, QaError> {
        if config.api_key.trim().is_empty() {
            return Err(QaError::MissingCredential(
                "generation api key is empty".to_string(),
            ));
        }

        let endpoint = Url::parse(&format!(
            "{}/v1beta/{}:generateContent",
            config.api_base_url.trim_end_matches('/'),
            config.generation_model
        ))?;

        Ok(Self {
            endpoint,
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, QaError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": prompt }],
                }],
                "generationConfig": {
                    "temperature": self.temperature,
                },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QaError::BackendResponse {
                backend: "gemini-generation".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        let parts = parsed
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let text = parts
            .iter()
            .filter_map(|part| part.pointer("/text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(QaError::BackendResponse {
                backend: "gemini-generation".to_string(),
                details: "response contained no candidate text".to_string(),
            });
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::{GeminiGenerator, TextGenerator};
    use crate::config::RagConfig;
    use crate::error::QaError;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> RagConfig {
        let mut config = RagConfig::new("test-key");
        config.api_base_url = base_url.to_string();
        config
    }

    #[tokio::test]
    async fn candidate_parts_are_joined_into_one_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/v1beta/models/gemini-1.5-flash-latest:generateContent",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            { "text": "The capital of France " },
                            { "text": "is Paris." }
                        ]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(&test_config(&server.uri())).unwrap();
        let answer = generator.generate("What is the capital of France?").await.unwrap();
        assert_eq!(answer, "The capital of France is Paris.");
    }

    #[tokio::test]
    async fn empty_candidates_are_a_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(&test_config(&server.uri())).unwrap();
        let result = generator.generate("question").await;
        assert!(matches!(result, Err(QaError::BackendResponse { .. })));
    }

    #[tokio::test]
    async fn quota_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(&test_config(&server.uri())).unwrap();
        let result = generator.generate("question").await;
        assert!(matches!(result, Err(QaError::BackendResponse { .. })));
    }
}
