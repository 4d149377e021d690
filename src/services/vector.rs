use anyhow::Result;
use std::future::Future;
use std::sync::Arc;

use crate::config::{VectorBackend, VectorStoreConfig};
use crate::services::llm_provider::Embedder;
use crate::services::qdrant::QdrantStore;

pub struct SearchResult {
    pub chunk_index: usize,
    pub score: f32,
    pub content: String,
}

struct IndexedChunk {
    content: String,
    embedding: Vec<f64>,
}

enum Store {
    Memory(Vec<IndexedChunk>),
    Qdrant(QdrantStore),
}

/// Embedded chunks of one document, queried by semantic similarity.
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    store: Store,
    len: usize,
}

impl VectorIndex {
    pub async fn build(
        embedder: Arc<dyn Embedder>,
        config: &VectorStoreConfig,
        document_id: &str,
        chunks: &[String],
    ) -> Result<Self> {
        let embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            embedder.embed_batch(chunks).await?
        };
        if embeddings.len() != chunks.len() {
            anyhow::bail!(
                "Embedding model returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            );
        }

        let embedded: Vec<IndexedChunk> = chunks
            .iter()
            .zip(embeddings)
            .map(|(content, embedding)| IndexedChunk {
                content: content.clone(),
                embedding,
            })
            .collect();

        let store = match config.backend {
            VectorBackend::Qdrant if !embedded.is_empty() => {
                let vector_size = embedded.first().map_or(0, |c| c.embedding.len()) as u64;
                let qdrant = QdrantStore::create(config, document_id, vector_size).await?;
                let upserted = qdrant
                    .upsert_chunks(
                        embedded
                            .into_iter()
                            .enumerate()
                            .map(|(i, c)| (i, c.embedding, c.content))
                            .collect(),
                    )
                    .await;
                or_teardown(upserted, || qdrant.teardown()).await?;
                Store::Qdrant(qdrant)
            }
            _ => Store::Memory(embedded),
        };

        tracing::info!("Built {:?} vector index with {} chunks", config.backend, chunks.len());

        Ok(Self {
            embedder,
            store,
            len: chunks.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if self.len == 0 || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        match &self.store {
            Store::Memory(chunks) => {
                let mut scored: Vec<SearchResult> = chunks
                    .iter()
                    .enumerate()
                    .map(|(i, chunk)| SearchResult {
                        chunk_index: i,
                        score: cosine_similarity(&query_embedding, &chunk.embedding),
                        content: chunk.content.clone(),
                    })
                    .collect();

                // Stable sort: equal scores keep document order.
                scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
                scored.truncate(top_k);
                Ok(scored)
            }
            Store::Qdrant(qdrant) => Ok(qdrant
                .search(&query_embedding, top_k as u64)
                .await?
                .into_iter()
                .map(|hit| SearchResult {
                    chunk_index: hit.chunk_index,
                    score: hit.score,
                    content: hit.content,
                })
                .collect()),
        }
    }

    /// The `top_k` most similar chunks, best first, joined by single spaces.
    pub async fn query(&self, query: &str, top_k: usize) -> Result<String> {
        let results = self.search(query, top_k).await?;
        Ok(results
            .iter()
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }

    pub async fn teardown(self) -> Result<()> {
        if let Store::Qdrant(qdrant) = &self.store {
            qdrant.teardown().await?;
        }
        Ok(())
    }
}

/// Pass `result` through, running `teardown` first when it is an error.
/// A failed teardown is logged and the original error is kept.
async fn or_teardown<T, F, Fut>(result: Result<T>, teardown: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if result.is_err() {
        if let Err(e) = teardown().await {
            tracing::warn!("Failed to drop partially built vector store: {e:#}");
        }
    }
    result
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (dot / denom) as f32
    }
}
