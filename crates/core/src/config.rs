use crate::chunking::ChunkingConfig;
use crate::error::QaError;

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;
pub const DEFAULT_GENERATION_MODEL: &str = "models/gemini-1.5-flash-latest";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_TOP_K: usize = 4;

/// Single source of truth for credentials, model names, and chunking
/// parameters. Built once at startup and passed to each component.
#[derive(Debug, Clone)]
pub struct RagConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub generation_model: String,
    pub temperature: f32,
    pub chunking: ChunkingConfig,
    pub top_k: usize,
}

impl RagConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Reads the credential from the environment. Fails before any network
    /// call is attempted if the key is absent or blank.
    pub fn from_env() -> Result<Self, QaError> {
        let api_key = std::env::var(GEMINI_API_KEY_VAR)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                QaError::MissingCredential(format!(
                    "{GEMINI_API_KEY_VAR} environment variable is not set"
                ))
            })?;

        Ok(Self::new(api_key))
    }
}

#[cfg(test)]
mod tests {
    use super::{RagConfig, GEMINI_API_KEY_VAR};
    use crate::error::QaError;

    #[test]
    fn missing_credential_is_a_configuration_error() {
        std::env::remove_var(GEMINI_API_KEY_VAR);
        let result = RagConfig::from_env();
        assert!(matches!(result, Err(QaError::MissingCredential(_))));
    }

    #[test]
    fn defaults_match_the_canonical_configuration() {
        let config = RagConfig::new("test-key");
        assert_eq!(config.embedding_dimensions, 768);
        assert_eq!(config.chunking.max_chars, 1_000);
        assert_eq!(config.chunking.overlap_chars, 200);
        assert_eq!(config.top_k, 4);
        assert!(config.temperature < 1.0);
    }
}
