//! Thin adapter around `qdrant-client` implementing [`VectorIndex`].
//!
//! All Qdrant interactions live here, hiding the builder API from the rest
//! of the crate. Point ids are UUIDv5 values derived from the chunk id; the
//! chunk id itself is kept in the payload.

use std::collections::HashMap;

use futures::future::BoxFuture;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointId, PointStruct,
    SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value as QValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use services::uuid::stable_uuid;
use tracing::{debug, info};

use crate::config::{DistanceKind, RagConfig, VectorSpace};
use crate::errors::RagError;
use crate::index::VectorIndex;
use crate::record::{DeleteOutcome, PassageMetadata, RetrievalHit, VectorPoint};

/// Qdrant-backed [`VectorIndex`].
pub struct QdrantIndex {
    client: Qdrant,
    exact: bool,
}

impl QdrantIndex {
    /// Creates the client; no network call is made until first use.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(store_err)?;

        info!(url = %cfg.qdrant_url, exact = cfg.exact_search, "Qdrant client ready");
        Ok(Self {
            client,
            exact: cfg.exact_search,
        })
    }
}

fn store_err(e: impl std::fmt::Display) -> RagError {
    RagError::StoreUnavailable(e.to_string())
}

fn to_distance(d: DistanceKind) -> Distance {
    match d {
        DistanceKind::Cosine => Distance::Cosine,
        DistanceKind::Dot => Distance::Dot,
        DistanceKind::Euclid => Distance::Euclid,
    }
}

impl VectorIndex for QdrantIndex {
    fn exists<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<bool, RagError>> {
        Box::pin(async move {
            self.client
                .collection_exists(collection)
                .await
                .map_err(store_err)
        })
    }

    fn count<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<u64, RagError>> {
        Box::pin(async move {
            let res = self
                .client
                .count(CountPointsBuilder::new(collection).exact(true))
                .await
                .map_err(store_err)?;
            Ok(res.result.map(|r| r.count).unwrap_or(0))
        })
    }

    fn create<'a>(
        &'a self,
        collection: &'a str,
        space: VectorSpace,
    ) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            if self.exists(collection).await? {
                debug!(collection, "collection already exists");
                return Ok(());
            }
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(collection).vectors_config(
                        VectorParamsBuilder::new(space.size as u64, to_distance(space.distance)),
                    ),
                )
                .await
                .map_err(store_err)?;
            info!(collection, size = space.size, distance = ?space.distance, "collection created");
            Ok(())
        })
    }

    fn delete<'a>(
        &'a self,
        collection: &'a str,
    ) -> BoxFuture<'a, Result<DeleteOutcome, RagError>> {
        Box::pin(async move {
            if !self.exists(collection).await? {
                return Ok(DeleteOutcome::Absent);
            }
            self.client
                .delete_collection(collection)
                .await
                .map_err(store_err)?;
            info!(collection, "collection deleted");
            Ok(DeleteOutcome::Deleted)
        })
    }

    fn upsert<'a>(
        &'a self,
        collection: &'a str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'a, Result<usize, RagError>> {
        Box::pin(async move {
            if points.is_empty() {
                return Ok(0);
            }
            let n = points.len();
            let points = points
                .into_iter()
                .map(to_point)
                .collect::<Result<Vec<_>, _>>()?;

            self.client
                .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
                .await
                .map_err(store_err)?;
            debug!(collection, points = n, "upserted");
            Ok(n)
        })
    }

    fn search<'a>(
        &'a self,
        collection: &'a str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'a, Result<Vec<RetrievalHit>, RagError>> {
        Box::pin(async move {
            let mut builder =
                SearchPointsBuilder::new(collection, vector, top_k).with_payload(true);
            if self.exact {
                builder = builder.params(SearchParamsBuilder::default().exact(true));
            }

            let res = self.client.search_points(builder).await.map_err(store_err)?;

            let mut out = Vec::with_capacity(res.result.len());
            for r in res.result {
                let point = point_id_text(r.id.as_ref());
                out.push(hit_from_payload(&point, r.score, qpayload_to_json(r.payload))?);
            }
            debug!(collection, hits = out.len(), "search completed");
            Ok(out)
        })
    }
}

fn to_point(p: VectorPoint) -> Result<PointStruct, RagError> {
    let VectorPoint { item, vector } = p;
    let id = stable_uuid(&item.id).to_string();
    let payload: Payload = json!({
        "chunk_id": item.id,
        "text": item.text,
        "source": item.metadata.source,
        "path": item.metadata.path,
        "page": item.metadata.page,
    })
    .try_into()
    .map_err(store_err)?;
    Ok(PointStruct::new(id, vector, payload))
}

/// UUID or numeric point id as plain text; empty when absent.
fn point_id_text(id: Option<&PointId>) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;
    match id.and_then(|p| p.point_id_options.as_ref()) {
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

fn hit_from_payload(
    point: &str,
    score: f32,
    payload: serde_json::Value,
) -> Result<RetrievalHit, RagError> {
    let bad = |reason: &str| RagError::MalformedPayload {
        point: point.to_string(),
        reason: reason.to_string(),
    };
    let str_field = |k: &str| {
        payload
            .get(k)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| bad(&format!("missing string field `{k}`")))
    };

    let page = payload
        .get("page")
        .and_then(|v| v.as_u64())
        .and_then(|p| u32::try_from(p).ok())
        .ok_or_else(|| bad("missing integer field `page`"))?;

    Ok(RetrievalHit {
        chunk_id: str_field("chunk_id")?,
        text: str_field("text")?,
        metadata: PassageMetadata {
            source: str_field("source")?,
            path: str_field("path")?,
            page,
        },
        score,
    })
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into JSON.
///
/// Nested objects/arrays are mapped to `Null`; passages only store scalars.
fn qpayload_to_json(p: HashMap<String, QValue>) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind as K;
    let mut m = serde_json::Map::new();
    for (k, v) in p {
        let j = match v.kind {
            Some(K::StringValue(s)) => serde_json::Value::String(s),
            Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
            Some(K::DoubleValue(f)) => json!(f),
            Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
            _ => serde_json::Value::Null,
        };
        m.insert(k, j);
    }
    serde_json::Value::Object(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::IndexItem;

    fn vp() -> VectorPoint {
        VectorPoint {
            item: IndexItem {
                id: "Leave.pdf:p3:c1".into(),
                text: "Employees accrue leave monthly.".into(),
                metadata: PassageMetadata {
                    source: "Leave.pdf".into(),
                    path: "docs/Leave.pdf".into(),
                    page: 3,
                },
            },
            vector: vec![0.1, 0.2],
        }
    }

    #[test]
    fn point_payload_round_trips_into_hit() {
        let p = to_point(vp()).unwrap();
        let json = qpayload_to_json(p.payload);
        let hit = hit_from_payload("x", 0.9, json).unwrap();
        assert_eq!(hit.chunk_id, "Leave.pdf:p3:c1");
        assert_eq!(hit.metadata.page, 3);
        assert_eq!(hit.metadata.source, "Leave.pdf");
    }

    #[test]
    fn point_id_is_stable_uuid_of_chunk_id() {
        let a = to_point(vp()).unwrap();
        let b = to_point(vp()).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(
            point_id_text(a.id.as_ref()),
            stable_uuid("Leave.pdf:p3:c1").to_string()
        );
    }

    #[test]
    fn numeric_and_missing_point_ids_render_plainly() {
        assert_eq!(point_id_text(Some(&PointId::from(42u64))), "42");
        assert_eq!(point_id_text(None), "");
    }

    #[test]
    fn payload_without_page_is_malformed() {
        let err = hit_from_payload(
            "p",
            0.5,
            json!({"chunk_id": "a", "text": "t", "source": "s", "path": "p"}),
        )
        .unwrap_err();
        assert!(matches!(err, RagError::MalformedPayload { .. }));
    }
}
