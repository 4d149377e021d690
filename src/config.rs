use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub llm: LlmConfig,
    pub embeddings: EmbeddingsConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub vector_store: VectorStoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    pub max_attempts: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingsConfig {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Message(
                "chunking.chunk_size must be greater than zero".into(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Message(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Chunks returned for a search query.
    pub top_k: usize,
    /// Leading chunks used as context when no search text is given.
    pub fallback_chunks: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Memory,
    Qdrant,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VectorStoreConfig {
    pub backend: VectorBackend,
    pub qdrant_url: String,
    #[serde(default)]
    pub qdrant_api_key: String,
    pub collection_prefix: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let mut config: AppConfig = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        // Provider credentials may come from the conventional variables instead.
        if config.llm.api_key.is_empty() {
            config.llm.api_key = std::env::var("GROQ_API_KEY").unwrap_or_default();
        }
        if config.vector_store.qdrant_api_key.is_empty() {
            config.vector_store.qdrant_api_key =
                std::env::var("QDRANT_API_KEY").unwrap_or_default();
        }

        config.chunking.validate()?;
        if config.llm.max_attempts == 0 {
            return Err(ConfigError::Message(
                "llm.max_attempts must be at least 1".into(),
            ));
        }

        Ok(config)
    }
}
