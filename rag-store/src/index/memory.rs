//! In-process brute-force index.
//!
//! Used for tests and `RAG_STORE=memory` dry runs. Scores follow the
//! collection's distance: cosine similarity, raw dot product, or negated
//! euclidean distance, so "higher is closer" holds for all three.

use std::collections::{BTreeMap, HashMap};

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::{DistanceKind, VectorSpace};
use crate::errors::RagError;
use crate::index::VectorIndex;
use crate::record::{DeleteOutcome, RetrievalHit, VectorPoint};

struct Collection {
    space: VectorSpace,
    points: BTreeMap<String, VectorPoint>,
}

#[derive(Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(collection: &str) -> RagError {
    RagError::StoreUnavailable(format!("collection `{collection}` does not exist"))
}

fn score(distance: DistanceKind, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match distance {
        DistanceKind::Dot => dot,
        DistanceKind::Cosine => {
            let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if na == 0.0 || nb == 0.0 {
                0.0
            } else {
                dot / (na * nb)
            }
        }
        DistanceKind::Euclid => {
            let d2: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
            -d2.sqrt()
        }
    }
}

impl VectorIndex for MemoryIndex {
    fn exists<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<bool, RagError>> {
        Box::pin(async move { Ok(self.collections.read().await.contains_key(collection)) })
    }

    fn count<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<u64, RagError>> {
        Box::pin(async move {
            let guard = self.collections.read().await;
            let c = guard.get(collection).ok_or_else(|| missing(collection))?;
            Ok(c.points.len() as u64)
        })
    }

    fn create<'a>(
        &'a self,
        collection: &'a str,
        space: VectorSpace,
    ) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            let mut guard = self.collections.write().await;
            guard.entry(collection.to_string()).or_insert_with(|| {
                debug!(collection, size = space.size, "memory collection created");
                Collection {
                    space,
                    points: BTreeMap::new(),
                }
            });
            Ok(())
        })
    }

    fn delete<'a>(
        &'a self,
        collection: &'a str,
    ) -> BoxFuture<'a, Result<DeleteOutcome, RagError>> {
        Box::pin(async move {
            let removed = self.collections.write().await.remove(collection);
            Ok(if removed.is_some() {
                DeleteOutcome::Deleted
            } else {
                DeleteOutcome::Absent
            })
        })
    }

    fn upsert<'a>(
        &'a self,
        collection: &'a str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'a, Result<usize, RagError>> {
        Box::pin(async move {
            let mut guard = self.collections.write().await;
            let c = guard.get_mut(collection).ok_or_else(|| missing(collection))?;

            if let Some(bad) = points.iter().find(|p| p.vector.len() != c.space.size) {
                return Err(RagError::VectorSizeMismatch {
                    got: bad.vector.len(),
                    want: c.space.size,
                });
            }

            let n = points.len();
            for p in points {
                c.points.insert(p.item.id.clone(), p);
            }
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
            let guard = self.collections.read().await;
            let c = guard.get(collection).ok_or_else(|| missing(collection))?;
            if vector.len() != c.space.size {
                return Err(RagError::VectorSizeMismatch {
                    got: vector.len(),
                    want: c.space.size,
                });
            }

            let mut scored: Vec<(f32, &VectorPoint)> = c
                .points
                .values()
                .map(|p| (score(c.space.distance, &vector, &p.vector), p))
                .collect();

            // Descending score; ties keep id order (BTreeMap iteration).
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            scored.truncate(usize::try_from(top_k).unwrap_or(usize::MAX));

            Ok(scored
                .into_iter()
                .map(|(score, p)| RetrievalHit {
                    chunk_id: p.item.id.clone(),
                    text: p.item.text.clone(),
                    metadata: p.item.metadata.clone(),
                    score,
                })
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{IndexItem, PassageMetadata};

    fn point(id: &str, v: Vec<f32>) -> VectorPoint {
        VectorPoint {
            item: IndexItem {
                id: id.into(),
                text: format!("text of {id}"),
                metadata: PassageMetadata {
                    source: "a.pdf".into(),
                    path: "docs/a.pdf".into(),
                    page: 1,
                },
            },
            vector: v,
        }
    }

    const SPACE: VectorSpace = VectorSpace {
        size: 2,
        distance: DistanceKind::Cosine,
    };

    #[tokio::test]
    async fn lifecycle() {
        let idx = MemoryIndex::new();
        assert!(!idx.exists("c").await.unwrap());
        assert_eq!(idx.delete("c").await.unwrap(), DeleteOutcome::Absent);

        idx.create("c", SPACE).await.unwrap();
        assert!(idx.exists("c").await.unwrap());
        assert_eq!(idx.count("c").await.unwrap(), 0);

        idx.upsert("c", vec![point("a", vec![1.0, 0.0])]).await.unwrap();
        idx.upsert("c", vec![point("a", vec![0.0, 1.0])]).await.unwrap();
        assert_eq!(idx.count("c").await.unwrap(), 1);

        assert_eq!(idx.delete("c").await.unwrap(), DeleteOutcome::Deleted);
        assert!(!idx.exists("c").await.unwrap());
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let idx = MemoryIndex::new();
        idx.create("c", SPACE).await.unwrap();
        idx.upsert(
            "c",
            vec![
                point("far", vec![0.0, 1.0]),
                point("near", vec![1.0, 0.1]),
                point("mid", vec![1.0, 1.0]),
            ],
        )
        .await
        .unwrap();

        let hits = idx.search("c", vec![1.0, 0.0], 2).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert!(hits[0].score >= hits[1].score);

        let all = idx.search("c", vec![1.0, 0.0], 10).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn wrong_dimension_rejected() {
        let idx = MemoryIndex::new();
        idx.create("c", SPACE).await.unwrap();
        let err = idx
            .upsert("c", vec![point("a", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 3, want: 2 }));
    }

    #[tokio::test]
    async fn missing_collection_is_store_error() {
        let idx = MemoryIndex::new();
        assert!(matches!(
            idx.count("nope").await,
            Err(RagError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn euclid_scores_closer_higher() {
        let near = score(DistanceKind::Euclid, &[0.0, 0.0], &[0.1, 0.0]);
        let far = score(DistanceKind::Euclid, &[0.0, 0.0], &[3.0, 4.0]);
        assert!(near > far);
        assert_eq!(far, -5.0);
    }
}
