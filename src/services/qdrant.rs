use anyhow::{Context, Result};
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeleteCollectionBuilder, Distance, PointStruct, QueryPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::VectorStoreConfig;

/// A per-document Qdrant collection. Dropped again by [`QdrantStore::teardown`].
pub struct QdrantStore {
    client: Qdrant,
    collection_name: String,
}

pub struct ScoredContent {
    pub chunk_index: usize,
    pub score: f32,
    pub content: String,
}

impl QdrantStore {
    pub async fn create(config: &VectorStoreConfig, document_id: &str, vector_size: u64) -> Result<Self> {
        let api_key = (!config.qdrant_api_key.is_empty()).then(|| config.qdrant_api_key.clone());
        let client = Qdrant::from_url(&config.qdrant_url)
            .api_key(api_key)
            .build()
            .context("Failed to connect to Qdrant")?;

        let collection_name = format!("{}-{document_id}", config.collection_prefix);

        if !client
            .collection_exists(&collection_name)
            .await
            .context("Failed to check Qdrant collection")?
        {
            client
                .create_collection(
                    CreateCollectionBuilder::new(&collection_name)
                        .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
                )
                .await
                .context("Failed to create Qdrant collection")?;

            tracing::info!("Created Qdrant collection '{collection_name}' (vector_size={vector_size})");
        }

        Ok(Self {
            client,
            collection_name,
        })
    }

    pub async fn upsert_chunks(&self, chunks: Vec<(usize, Vec<f64>, String)>) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = chunks
            .into_iter()
            .map(|(index, embedding, content)| {
                let payload: HashMap<String, qdrant_client::qdrant::Value> = [
                    ("content".to_string(), content.into()),
                    ("chunk_index".to_string(), (index as i64).into()),
                ]
                .into();

                let embedding_f32: Vec<f32> = embedding.iter().map(|&v| v as f32).collect();
                PointStruct::new(Uuid::new_v4().to_string(), embedding_f32, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, points).wait(true))
            .await
            .context("Failed to upsert points to Qdrant")?;

        Ok(())
    }

    /// Results come back best match first.
    pub async fn search(&self, query_embedding: &[f64], top_k: u64) -> Result<Vec<ScoredContent>> {
        let query_f32: Vec<f32> = query_embedding.iter().map(|&v| v as f32).collect();
        let response = self
            .client
            .query(
                QueryPointsBuilder::new(&self.collection_name)
                    .query(query_f32)
                    .limit(top_k)
                    .with_payload(true),
            )
            .await
            .context("Failed to search Qdrant")?;

        use qdrant_client::qdrant::value::Kind;

        let results = response
            .result
            .into_iter()
            .map(|point| {
                let content = match point.payload.get("content").and_then(|v| v.kind.as_ref()) {
                    Some(Kind::StringValue(s)) => s.clone(),
                    _ => String::new(),
                };
                let chunk_index = match point.payload.get("chunk_index").and_then(|v| v.kind.as_ref()) {
                    Some(Kind::IntegerValue(i)) => *i as usize,
                    _ => 0,
                };

                ScoredContent {
                    chunk_index,
                    score: point.score,
                    content,
                }
            })
            .collect();

        Ok(results)
    }

    pub async fn teardown(&self) -> Result<()> {
        self.client
            .delete_collection(DeleteCollectionBuilder::new(&self.collection_name))
            .await
            .context("Failed to delete Qdrant collection")?;
        tracing::info!("Deleted Qdrant collection '{}'", self.collection_name);
        Ok(())
    }
}
