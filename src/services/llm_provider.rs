use anyhow::{Context, Result};
use futures::future::BoxFuture;
use rig::client::completion::CompletionClientDyn;
use rig::client::embeddings::EmbeddingsClientDyn;
use rig::client::{ProviderClient, ProviderValue};
use rig::completion::Prompt;
use rig::embeddings::EmbeddingModelDyn;
use rig::providers::{cohere, gemini, groq, mistral, ollama, openai, together};

use crate::config::{EmbeddingsConfig, LlmConfig};

/// Turns a prompt into free text. The quiz generator only needs this one call.
pub trait CompletionBackend: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Sentence embedding used for both indexing and querying.
pub trait Embedder: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f64>>>;

    /// One vector per input, in input order.
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f64>>>> {
        Box::pin(async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed(text).await?);
            }
            Ok(vectors)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
    OpenAi,
    Ollama,
    Mistral,
    Cohere,
    Gemini,
    Together,
}

impl std::str::FromStr for Provider {
    type Err = anyhow::Error;
    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "groq" => Ok(Provider::Groq),
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            "mistral" => Ok(Provider::Mistral),
            "cohere" => Ok(Provider::Cohere),
            "gemini" | "google" => Ok(Provider::Gemini),
            "together" => Ok(Provider::Together),
            other => Err(anyhow::anyhow!("Unsupported provider: {other}")),
        }
    }
}

impl Provider {
    fn boxed_client(self, api_key: &str) -> Box<dyn ProviderClient> {
        let value = ProviderValue::Simple(api_key.to_string());

        match self {
            Provider::Groq => {
                let c: groq::Client<reqwest::Client> = groq::Client::from_val(value);
                c.boxed()
            }
            Provider::OpenAi => {
                let c: openai::Client<reqwest::Client> = openai::Client::from_val(value);
                c.boxed()
            }
            Provider::Ollama => {
                let c: ollama::Client<reqwest::Client> = ollama::Client::from_val(value);
                c.boxed()
            }
            Provider::Mistral => {
                let c: mistral::Client<reqwest::Client> = mistral::Client::from_val(value);
                c.boxed()
            }
            Provider::Cohere => {
                let c: cohere::Client<reqwest::Client> = cohere::Client::from_val(value);
                c.boxed()
            }
            Provider::Gemini => {
                let c: gemini::Client<reqwest::Client> = gemini::Client::from_val(value);
                c.boxed()
            }
            Provider::Together => {
                let c: together::Client<reqwest::Client> = together::Client::from_val(value);
                c.boxed()
            }
        }
    }

    pub fn supports_embeddings(self) -> bool {
        !matches!(self, Provider::Groq)
    }
}

fn create_completion_client(provider: Provider, api_key: &str) -> Result<Box<dyn CompletionClientDyn>> {
    provider
        .boxed_client(api_key)
        .as_completion()
        .context(format!("Provider '{provider:?}' does not support completions"))
}

fn create_embeddings_client(provider: Provider, api_key: &str) -> Result<Box<dyn EmbeddingsClientDyn>> {
    provider
        .boxed_client(api_key)
        .as_embeddings()
        .context(format!("Provider '{provider:?}' does not support embeddings"))
}

/// Completion through a rig provider client, one user message per call.
pub struct RigCompletion {
    provider: Provider,
    api_key: String,
    model: String,
}

impl RigCompletion {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider: Provider = config.provider.parse()?;
        if config.api_key.is_empty() && provider != Provider::Ollama {
            tracing::warn!("No API key configured for LLM provider {provider:?}; set GROQ_API_KEY");
        }
        Ok(Self {
            provider,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

impl CompletionBackend for RigCompletion {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let client = create_completion_client(self.provider, &self.api_key)?;
            let agent = client.agent(&self.model).build();

            tracing::debug!("Sending {} char prompt to {}", prompt.len(), self.model);
            agent
                .prompt(prompt)
                .await
                .map_err(|e| anyhow::anyhow!("LLM error: {e}"))
        })
    }
}

/// Embeddings through a rig provider client. The model handle is built once
/// and reused for every request.
pub struct RigEmbedder {
    model: Box<dyn EmbeddingModelDyn>,
    name: String,
}

impl RigEmbedder {
    pub fn from_config(config: &EmbeddingsConfig) -> Result<Self> {
        let provider: Provider = config.provider.parse()?;
        if !provider.supports_embeddings() {
            anyhow::bail!("Provider '{}' does not support embeddings", config.provider);
        }
        let model = create_embeddings_client(provider, &config.api_key)?.embedding_model(&config.model);
        Ok(Self {
            model,
            name: config.model.clone(),
        })
    }
}

impl Embedder for RigEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f64>>> {
        Box::pin(async move {
            let embedding = self
                .model
                .embed_text(text)
                .await
                .map_err(|e| anyhow::anyhow!("Embedding error: {e}"))?;
            Ok(embedding.vec)
        })
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f64>>>> {
        Box::pin(async move {
            let batch_size = self.model.max_documents().max(1);
            let mut vectors = Vec::with_capacity(texts.len());

            for batch in texts.chunks(batch_size) {
                tracing::debug!("Embedding batch of {} texts with {}", batch.len(), self.name);
                let embeddings = self
                    .model
                    .embed_texts(batch.to_vec())
                    .await
                    .map_err(|e| anyhow::anyhow!("Embedding error: {e}"))?;
                vectors.extend(embeddings.into_iter().map(|e| e.vec));
            }

            Ok(vectors)
        })
    }
}
