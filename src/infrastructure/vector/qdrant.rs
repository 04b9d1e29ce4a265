//! Qdrant-backed vector store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_config, CountPointsBuilder,
    CreateCollectionBuilder, Distance, PointId, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::domain::vector::{CollectionSpec, ScoredRecord, VectorPayload, VectorQuery, VectorRecord, VectorStore};
use crate::domain::DomainError;

const FIELD_RECORD_ID: &str = "record_id";
const FIELD_CONTENT: &str = "content";
const FIELD_QUERY: &str = "query";
const FIELD_METADATA: &str = "metadata";
const FIELD_CREATED_AT: &str = "created_at";

/// Connection settings for Qdrant
#[derive(Debug, Clone)]
pub struct QdrantStoreConfig {
    /// gRPC URL, e.g. `http://localhost:6334`
    pub url: String,
    pub api_key: Option<String>,
}

impl QdrantStoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Vector store backed by a Qdrant server; collections use cosine distance
pub struct QdrantVectorStore {
    client: Qdrant,
    config: QdrantStoreConfig,
}

impl std::fmt::Debug for QdrantVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantVectorStore")
            .field("url", &self.config.url)
            .finish()
    }
}

impl QdrantVectorStore {
    /// Builds the client; no connection is made until the first call
    pub fn new(config: QdrantStoreConfig) -> Result<Self, DomainError> {
        let mut builder = Qdrant::from_url(&config.url);
        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }
        let client = builder.build().map_err(|e| {
            DomainError::configuration(format!("Failed to build Qdrant client: {}", e))
        })?;

        Ok(Self { client, config })
    }

    async fn existing_dimension(&self, collection: &str) -> Result<Option<usize>, DomainError> {
        let info = self
            .client
            .collection_info(collection)
            .await
            .map_err(|e| unavailable("collection_info", e))?;

        let size = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|config| match config {
                vectors_config::Config::Params(params) => Some(params.size as usize),
                vectors_config::Config::ParamsMap(_) => None,
            });

        Ok(size)
    }
}

fn unavailable(operation: &str, error: impl std::fmt::Display) -> DomainError {
    DomainError::layer_unavailable("vector", format!("Qdrant {} failed: {}", operation, error))
}

/// Like [`unavailable`], but a dropped collection is reported as `NotFound`
fn collection_error(operation: &str, collection: &str, error: impl std::fmt::Display) -> DomainError {
    let message = error.to_string();
    let lowered = message.to_lowercase();

    if lowered.contains("not found") && lowered.contains("collection") {
        DomainError::not_found(format!("Collection '{}' does not exist", collection))
    } else {
        unavailable(operation, message)
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), DomainError> {
        let exists = self
            .client
            .collection_exists(&spec.name)
            .await
            .map_err(|e| unavailable("collection_exists", e))?;

        if exists {
            return match self.existing_dimension(&spec.name).await? {
                Some(actual) if actual != spec.dimension => Err(DomainError::dimension_mismatch(
                    &spec.name,
                    actual,
                    spec.dimension,
                )),
                _ => Ok(()),
            };
        }

        debug!(collection = %spec.name, dimension = spec.dimension, "Creating Qdrant collection");
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&spec.name)
                    .vectors_config(VectorParamsBuilder::new(spec.dimension as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| unavailable("create_collection", e))?;

        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<(), DomainError> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = records.into_iter().map(record_to_point).collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| collection_error("upsert", collection, e))?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: &VectorQuery,
    ) -> Result<Vec<ScoredRecord>, DomainError> {
        let mut request =
            SearchPointsBuilder::new(collection, query.vector.clone(), query.top_k as u64)
                .with_payload(true);
        if let Some(min_score) = query.min_score {
            request = request.score_threshold(min_score);
        }

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| collection_error("search", collection, e))?;

        Ok(response.result.into_iter().map(scored_point_to_record).collect())
    }

    async fn drop_collection(&self, collection: &str) -> Result<(), DomainError> {
        let exists = self
            .client
            .collection_exists(collection)
            .await
            .map_err(|e| unavailable("collection_exists", e))?;
        if !exists {
            return Ok(());
        }

        self.client
            .delete_collection(collection)
            .await
            .map_err(|e| unavailable("delete_collection", e))?;

        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize, DomainError> {
        let exists = self
            .client
            .collection_exists(collection)
            .await
            .map_err(|e| unavailable("collection_exists", e))?;
        if !exists {
            return Ok(0);
        }

        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| unavailable("count", e))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        self.client
            .health_check()
            .await
            .map_err(|e| unavailable("health_check", e))?;
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "qdrant"
    }
}

fn record_to_point(record: VectorRecord) -> PointStruct {
    let VectorRecord {
        id,
        embedding,
        payload,
    } = record;

    let mut fields: HashMap<String, QdrantValue> = HashMap::from([
        (FIELD_RECORD_ID.to_string(), json_to_qdrant(&JsonValue::String(id.clone()))),
        (FIELD_CONTENT.to_string(), json_to_qdrant(&JsonValue::String(payload.content))),
        (
            FIELD_METADATA.to_string(),
            json_to_qdrant(&JsonValue::Object(payload.metadata.into_iter().collect())),
        ),
        (
            FIELD_CREATED_AT.to_string(),
            json_to_qdrant(&JsonValue::String(payload.created_at.to_rfc3339())),
        ),
    ]);
    if let Some(query) = payload.query {
        fields.insert(FIELD_QUERY.to_string(), json_to_qdrant(&JsonValue::String(query)));
    }

    PointStruct::new(point_uuid(&id), embedding, fields)
}

fn scored_point_to_record(point: ScoredPoint) -> ScoredRecord {
    let text = |field: &str| -> Option<String> {
        point.payload.get(field).and_then(|v| match &v.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        })
    };

    let id = text(FIELD_RECORD_ID)
        .or_else(|| point.id.as_ref().and_then(point_id_to_string))
        .unwrap_or_default();

    let metadata: HashMap<String, JsonValue> = point
        .payload
        .get(FIELD_METADATA)
        .map(|v| match qdrant_to_json(v) {
            JsonValue::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        })
        .unwrap_or_default();

    let created_at = text(FIELD_CREATED_AT)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let payload = VectorPayload {
        content: text(FIELD_CONTENT).unwrap_or_default(),
        query: text(FIELD_QUERY),
        metadata,
        created_at,
    };

    ScoredRecord::new(id, payload, point.score)
}

/// Qdrant only accepts UUIDs or integers as point ids; other strings map to a stable v5 UUID
fn point_uuid(id: &str) -> String {
    match uuid::Uuid::parse_str(id) {
        Ok(_) => id.to_string(),
        Err(_) => uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, id.as_bytes()).to_string(),
    }
}

fn point_id_to_string(id: &PointId) -> Option<String> {
    match id.point_id_options.as_ref()? {
        PointIdOptions::Uuid(uuid) => Some(uuid.clone()),
        PointIdOptions::Num(num) => Some(num.to_string()),
    }
}

fn json_to_qdrant(json: &JsonValue) -> QdrantValue {
    let kind = match json {
        JsonValue::Null => Kind::NullValue(0),
        JsonValue::Bool(b) => Kind::BoolValue(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or(0.0)),
        },
        JsonValue::String(s) => Kind::StringValue(s.clone()),
        JsonValue::Array(items) => Kind::ListValue(qdrant_client::qdrant::ListValue {
            values: items.iter().map(json_to_qdrant).collect(),
        }),
        JsonValue::Object(map) => Kind::StructValue(qdrant_client::qdrant::Struct {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_qdrant(v)))
                .collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

fn qdrant_to_json(value: &QdrantValue) -> JsonValue {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => JsonValue::Null,
        Some(Kind::BoolValue(b)) => JsonValue::Bool(*b),
        Some(Kind::IntegerValue(i)) => JsonValue::Number((*i).into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(*d)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Some(Kind::StringValue(s)) => JsonValue::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            JsonValue::Array(list.values.iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(st)) => JsonValue::Object(
            st.fields
                .iter()
                .map(|(k, v)| (k.clone(), qdrant_to_json(v)))
                .collect(),
        ),
    }
}
