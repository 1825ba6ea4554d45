//! Embedding abstraction and the batching client.
//!
//! Providers return **index-tagged** vectors for each request batch; the
//! [`EmbeddingClient`] places them by index and refuses anything that does
//! not pair one-to-one with the inputs.

pub mod llm;

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, trace};

use crate::errors::RagError;

pub use ai_llm_service::IndexedEmbedding;

/// Asynchronous, batched embedding provider.
///
/// Implement this trait to plug in your own embedding backend. One call
/// corresponds to one upstream request; `index` in each returned item refers
/// to the position in `texts`.
pub trait EmbeddingsProvider: Send + Sync {
    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<IndexedEmbedding>, RagError>>;

    /// Identifier of the embedding model (recorded alongside an index).
    fn model_id(&self) -> &str;
}

/// Splits inputs into contiguous batches and pairs provider output by index.
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingsProvider>,
    batch_size: usize,
    expected_dim: Option<usize>,
}

impl EmbeddingClient {
    /// # Errors
    /// [`RagError::Config`] if `batch_size == 0`.
    pub fn new(provider: Arc<dyn EmbeddingsProvider>, batch_size: usize) -> Result<Self, RagError> {
        if batch_size == 0 {
            return Err(RagError::Config("embedding batch size must be > 0".into()));
        }
        Ok(Self {
            provider,
            batch_size,
            expected_dim: None,
        })
    }

    /// Enforces a fixed vector size on every returned embedding.
    pub fn with_expected_dim(mut self, dim: Option<usize>) -> Self {
        self.expected_dim = dim;
        self
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embeds `texts`, returning one vector per input in input order.
    ///
    /// Batches are sent one after another; any failing batch fails the
    /// whole call and nothing is returned.
    ///
    /// # Errors
    /// - [`RagError::EmbeddingProvider`] when the provider fails
    /// - [`RagError::EmbeddingPairing`] on missing, duplicate or out-of-range indexes
    /// - [`RagError::VectorSizeMismatch`] on inconsistent dimensions
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut dim = self.expected_dim;
        let mut out: Vec<Vec<f32>> = Vec::with_capacity(texts.len());

        for (batch_no, batch) in texts.chunks(self.batch_size).enumerate() {
            trace!(batch_no, size = batch.len(), "embedding batch");
            let tagged = self.provider.embed_batch(batch).await?;
            let placed = place_by_index(tagged, batch.len())?;

            for v in &placed {
                match dim {
                    Some(want) if v.len() != want => {
                        return Err(RagError::VectorSizeMismatch { got: v.len(), want });
                    }
                    None => dim = Some(v.len()),
                    _ => {}
                }
            }
            out.extend(placed);
        }

        debug!(
            texts = texts.len(),
            batches = texts.len().div_ceil(self.batch_size),
            dim = dim.unwrap_or(0),
            model = self.model_id(),
            "embedded texts"
        );
        Ok(out)
    }

    /// Embeds a single text (query path).
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let input = [text.to_string()];
        let mut v = self.embed_all(&input).await?;
        v.pop()
            .ok_or_else(|| RagError::EmbeddingPairing("provider returned no vector".into()))
    }
}

/// Places tagged vectors into `n` slots.
fn place_by_index(tagged: Vec<IndexedEmbedding>, n: usize) -> Result<Vec<Vec<f32>>, RagError> {
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; n];
    for e in tagged {
        let slot = slots.get_mut(e.index).ok_or_else(|| {
            RagError::EmbeddingPairing(format!("index {} out of range for batch of {n}", e.index))
        })?;
        if slot.is_some() {
            return Err(RagError::EmbeddingPairing(format!(
                "duplicate index {}",
                e.index
            )));
        }
        *slot = Some(e.vector);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, s)| s.ok_or_else(|| RagError::EmbeddingPairing(format!("missing index {i}"))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns `[len, index]` vectors, optionally reversed or corrupted.
    struct Scripted {
        reverse: bool,
        drop_last: bool,
        /// 1-based call that returns an error.
        fail_on_call: Option<usize>,
        calls: Mutex<Vec<usize>>,
    }

    impl Scripted {
        fn new() -> Self {
            Self {
                reverse: false,
                drop_last: false,
                fail_on_call: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl EmbeddingsProvider for Scripted {
        fn embed_batch<'a>(
            &'a self,
            texts: &'a [String],
        ) -> BoxFuture<'a, Result<Vec<IndexedEmbedding>, RagError>> {
            Box::pin(async move {
                let call = {
                    let mut calls = self.calls.lock().unwrap();
                    calls.push(texts.len());
                    calls.len()
                };
                if self.fail_on_call == Some(call) {
                    return Err(RagError::EmbeddingProvider("rate limited".into()));
                }
                let mut v: Vec<_> = texts
                    .iter()
                    .enumerate()
                    .map(|(index, t)| IndexedEmbedding {
                        index,
                        vector: vec![t.len() as f32, index as f32],
                    })
                    .collect();
                if self.reverse {
                    v.reverse();
                }
                if self.drop_last {
                    v.pop();
                }
                Ok(v)
            })
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| "x".repeat(i + 1)).collect()
    }

    #[tokio::test]
    async fn batches_are_contiguous_and_ordered() {
        let p = Arc::new(Scripted::new());
        let client = EmbeddingClient::new(p.clone(), 4).unwrap();
        let out = client.embed_all(&texts(10)).await.unwrap();

        assert_eq!(*p.calls.lock().unwrap(), vec![4, 4, 2]);
        assert_eq!(out.len(), 10);
        for (i, v) in out.iter().enumerate() {
            assert_eq!(v[0], (i + 1) as f32);
        }
    }

    #[tokio::test]
    async fn out_of_order_tags_are_placed_by_index() {
        let p = Arc::new(Scripted {
            reverse: true,
            ..Scripted::new()
        });
        let client = EmbeddingClient::new(p, 64).unwrap();
        let out = client.embed_all(&texts(3)).await.unwrap();
        assert_eq!(out[0], vec![1.0, 0.0]);
        assert_eq!(out[2], vec![3.0, 2.0]);
    }

    #[tokio::test]
    async fn missing_vector_fails_whole_call() {
        let p = Arc::new(Scripted {
            drop_last: true,
            ..Scripted::new()
        });
        let client = EmbeddingClient::new(p, 2).unwrap();
        let err = client.embed_all(&texts(3)).await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingPairing(_)));
    }

    #[tokio::test]
    async fn later_batch_failure_discards_earlier_vectors() {
        let p = Arc::new(Scripted {
            fail_on_call: Some(2),
            ..Scripted::new()
        });
        let client = EmbeddingClient::new(p.clone(), 2).unwrap();
        let err = client.embed_all(&texts(5)).await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingProvider(_)));
        // the third batch is never sent
        assert_eq!(*p.calls.lock().unwrap(), vec![2, 2]);
    }

    #[tokio::test]
    async fn expected_dim_is_enforced() {
        let client = EmbeddingClient::new(Arc::new(Scripted::new()), 8)
            .unwrap()
            .with_expected_dim(Some(3));
        let err = client.embed_one("q").await.unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 2, want: 3 }));
    }

    #[tokio::test]
    async fn empty_input_makes_no_call() {
        let p = Arc::new(Scripted::new());
        let client = EmbeddingClient::new(p.clone(), 8).unwrap();
        assert!(client.embed_all(&[]).await.unwrap().is_empty());
        assert!(p.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_batch_rejected() {
        assert!(EmbeddingClient::new(Arc::new(Scripted::new()), 0).is_err());
    }

    #[test]
    fn duplicate_and_out_of_range_tags() {
        let tagged = |index, x| IndexedEmbedding {
            index,
            vector: vec![x],
        };
        let dup = vec![tagged(0, 1.0), tagged(0, 2.0)];
        assert!(place_by_index(dup, 2).is_err());

        let oob = vec![tagged(3, 1.0)];
        assert!(place_by_index(oob, 1).is_err());
    }
}
