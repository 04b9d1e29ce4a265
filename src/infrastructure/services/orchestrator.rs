//! Tiered lookup: exact, semantic and document layers in front of the LLM

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use super::document_cache_service::build_context;
use super::{DocumentCacheService, EmbeddingService, ExactCacheService, SemanticCacheService};
use crate::domain::ingestion::{BatchIngestionReport, DocumentInput, IngestionOutcome};
use crate::domain::llm::CompletionRequest;
use crate::domain::tiering::{
    CacheLayer, CacheSettings, ClearReport, HealthReport, LayerLookup, Query, QueryResult,
    ResolvedLayer,
};
use crate::domain::DomainError;
use crate::infrastructure::llm::{ProviderAnswer, ProviderRegistry};
use crate::infrastructure::observability::{
    record_llm_call, record_lookup, record_query, LlmCallMetricParams,
};

/// Composes the cache layers and the provider registry.
///
/// Holds no per-query state, so one instance serves concurrent queries.
/// Identical queries running at the same time are not deduplicated; each
/// may call the LLM and backfill on its own.
#[derive(Debug)]
pub struct CacheOrchestrator {
    exact: ExactCacheService,
    semantic: SemanticCacheService,
    documents: DocumentCacheService,
    embeddings: Arc<EmbeddingService>,
    providers: Arc<ProviderRegistry>,
    settings: CacheSettings,
}

impl CacheOrchestrator {
    pub fn new(
        exact: ExactCacheService,
        semantic: SemanticCacheService,
        documents: DocumentCacheService,
        embeddings: Arc<EmbeddingService>,
        providers: Arc<ProviderRegistry>,
        settings: CacheSettings,
    ) -> Result<Self, DomainError> {
        let settings = settings.validated()?;

        if semantic.dimension() != embeddings.dimension() {
            return Err(DomainError::dimension_mismatch(
                semantic.collection(),
                semantic.dimension(),
                embeddings.dimension(),
            ));
        }

        if let Some(ref name) = settings.default_provider {
            if let Err(e) = providers.set_default(name) {
                warn!(
                    provider = %name,
                    fallback = ?providers.default_provider(),
                    error = %e,
                    "Default provider is not registered"
                );
            }
        }

        info!(
            exact_backend = exact.backend_name(),
            semantic_collection = semantic.collection(),
            document_collection = documents.collection(),
            embedding_model = embeddings.model(),
            dimension = embeddings.dimension(),
            "Cache orchestrator initialized"
        );

        Ok(Self {
            exact,
            semantic,
            documents,
            embeddings,
            providers,
            settings,
        })
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Answers a query from the cheapest layer that can, falling back to the LLM
    #[instrument(skip_all, fields(provider = query.provider.as_deref()))]
    pub async fn query(&self, query: Query) -> Result<QueryResult, DomainError> {
        let start = Instant::now();

        if query.text.trim().is_empty() {
            return Err(DomainError::validation("Query text cannot be empty"));
        }

        let exact = self.exact.get(&query.text).await?;
        record_lookup(CacheLayer::Exact, &exact);
        match exact {
            LayerLookup::Hit(record) => {
                let result = QueryResult::new(&query.text, record.response, ResolvedLayer::Exact);
                return Ok(self.finish(result, start));
            }
            LayerLookup::Miss => debug!(elapsed_ms = ms(start), "Layer 0 miss"),
            LayerLookup::Unavailable(reason) => skip(CacheLayer::Exact, &reason),
        }

        let embedding = self.embeddings.embed(&query.text).await?;

        let semantic = self
            .semantic
            .search(&embedding, self.settings.semantic_threshold)
            .await?;
        record_lookup(CacheLayer::Semantic, &semantic);
        match semantic {
            LayerLookup::Hit(hit) => {
                debug!(similarity = hit.similarity, "Layer 1 hit");
                self.backfill_exact(&query.text, &hit.response).await;

                let result = QueryResult::new(&query.text, hit.response, ResolvedLayer::Semantic)
                    .with_similarity(hit.similarity);
                return Ok(self.finish(result, start));
            }
            LayerLookup::Miss => debug!(elapsed_ms = ms(start), "Layer 1 miss"),
            LayerLookup::Unavailable(reason) => skip(CacheLayer::Semantic, &reason),
        }

        let documents = self
            .documents
            .search(
                &embedding,
                self.settings.document_threshold,
                self.settings.document_top_k,
            )
            .await?;
        record_lookup(CacheLayer::Document, &documents);
        let retrieved = match documents {
            LayerLookup::Hit(hits) => {
                debug!(documents = hits.len(), "Layer 2 hit");
                Some((build_context(&hits), hits.len()))
            }
            LayerLookup::Miss => {
                debug!(elapsed_ms = ms(start), "Layer 2 miss");
                None
            }
            LayerLookup::Unavailable(reason) => {
                skip(CacheLayer::Document, &reason);
                None
            }
        };

        let mut request = CompletionRequest::new(&query.text);
        let mut resolved = ResolvedLayer::Llm;
        let mut document_count = None;
        if let Some((context, count)) = retrieved {
            request = request.with_context(context);
            resolved = ResolvedLayer::Document;
            document_count = Some(count);
        }

        let answer = self.call_llm(query.provider.as_deref(), &request).await?;

        self.backfill_semantic(&query, embedding, &answer, resolved).await;
        self.backfill_exact(&query.text, &answer.response).await;

        let mut result = QueryResult::new(&query.text, answer.response, resolved)
            .with_provider(answer.provider);
        if let Some(count) = document_count {
            result = result.with_document_count(count);
        }

        Ok(self.finish(result, start))
    }

    /// Empties one layer, or all three when `layer` is `None`
    ///
    /// Every targeted layer is attempted; failures are reported per layer.
    pub async fn clear(&self, layer: Option<CacheLayer>) -> ClearReport {
        let targets = match layer {
            Some(layer) => vec![layer],
            None => CacheLayer::ALL.to_vec(),
        };

        let mut report = ClearReport::default();
        for target in targets {
            let outcome = match target {
                CacheLayer::Exact => self.exact.clear().await.map(|_| ()),
                CacheLayer::Semantic => self.semantic.clear().await,
                CacheLayer::Document => self.documents.clear().await,
            };

            match outcome {
                Ok(()) => {
                    info!(layer = target.index(), "Cleared cache layer");
                    report.record(target, None);
                }
                Err(e) => {
                    warn!(layer = target.index(), error = %e, "Failed to clear cache layer");
                    report.record(target, Some(e.public_message()));
                }
            }
        }

        report
    }

    /// Reachability of every layer plus the registered providers
    pub async fn health(&self) -> HealthReport {
        let (exact, semantic, documents) = tokio::join!(
            self.exact.health(),
            self.semantic.health(),
            self.documents.health()
        );

        HealthReport::new(
            vec![exact, semantic, documents],
            self.providers.list(),
            self.providers.default_provider(),
        )
    }

    pub async fn add_document(&self, document: DocumentInput) -> Result<IngestionOutcome, DomainError> {
        self.documents.add_document(document).await
    }

    pub async fn add_documents_batch(&self, documents: Vec<DocumentInput>) -> BatchIngestionReport {
        self.documents.add_documents_batch(documents).await
    }

    async fn call_llm(
        &self,
        provider: Option<&str>,
        request: &CompletionRequest,
    ) -> Result<ProviderAnswer, DomainError> {
        let start = Instant::now();
        let result = self.providers.invoke(provider, request).await;

        let label = match (&result, provider) {
            (Ok(answer), _) => answer.provider.clone(),
            (Err(_), Some(name)) => name.to_string(),
            (Err(_), None) => self.providers.default_provider().unwrap_or_default(),
        };
        record_llm_call(LlmCallMetricParams {
            provider: &label,
            with_context: request.context.is_some(),
            duration: start.elapsed(),
            success: result.is_ok(),
        });

        if let Err(ref e) = result {
            warn!(provider = %label, stage = %e.stage(), "LLM call failed: {}", e);
        }
        result
    }

    async fn backfill_exact(&self, query: &str, response: &str) {
        if let Err(e) = self.exact.put(query, response, self.settings.ttl_seconds).await {
            warn!(layer = CacheLayer::Exact.index(), "Backfill failed: {}", e);
        }
    }

    async fn backfill_semantic(
        &self,
        query: &Query,
        embedding: Vec<f32>,
        answer: &ProviderAnswer,
        resolved: ResolvedLayer,
    ) {
        let mut metadata: HashMap<String, serde_json::Value> = query.metadata.clone();
        metadata.insert("provider".to_string(), serde_json::json!(answer.provider));
        metadata.insert(
            "provider_label".to_string(),
            serde_json::json!(answer.provider_label),
        );
        metadata.insert(
            "resolved_layer".to_string(),
            serde_json::json!(resolved.as_str()),
        );

        if let Err(e) = self
            .semantic
            .put(&query.text, embedding, &answer.response, metadata)
            .await
        {
            warn!(layer = CacheLayer::Semantic.index(), "Backfill failed: {}", e);
        }
    }

    fn finish(&self, result: QueryResult, start: Instant) -> QueryResult {
        let elapsed = start.elapsed();
        record_query(result.resolved_layer, elapsed);

        info!(
            resolved_layer = %result.resolved_layer,
            llm_invoked = result.llm_invoked,
            elapsed_ms = elapsed.as_millis() as u64,
            "Query resolved"
        );

        result.with_elapsed(elapsed)
    }
}

fn skip(layer: CacheLayer, reason: &str) {
    warn!(layer = layer.index(), reason, "Cache layer unavailable, skipping");
}

fn ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
