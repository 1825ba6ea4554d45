//! Route-level tests over the in-memory store with fake providers.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use api::core::app_state::AppState;
use api::router;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use contextor::{
    Answerer, Contextor, ContextorError, Indexer, IndexerSettings, TextGenerator,
};
use futures::future::BoxFuture;
use passage_prep::{ChunkingConfig, FsDocumentLoader, PrepError, TokenCodec};
use rag_store::{EmbeddingsProvider, IndexedEmbedding, RagConfig, RagError, RagStore, StoreKind};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

struct CharCodec;

impl TokenCodec for CharCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>, PrepError> {
        Ok(text.chars().map(u32::from).collect())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, PrepError> {
        Ok(ids.iter().filter_map(|&i| char::from_u32(i)).collect())
    }

    fn encoding_id(&self) -> &str {
        "chars"
    }
}

struct LetterEmbedder;

impl EmbeddingsProvider for LetterEmbedder {
    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<IndexedEmbedding>, RagError>> {
        Box::pin(async move {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(index, t)| {
                    let mut v = vec![0.01f32; 26];
                    for b in t.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                        v[(b - b'a') as usize] += 1.0;
                    }
                    IndexedEmbedding { index, vector: v }
                })
                .collect())
        })
    }

    fn model_id(&self) -> &str {
        "letters"
    }
}

/// Cites the first excerpt label, or fails when `fail` is set.
struct Generator {
    fail: bool,
}

impl TextGenerator for Generator {
    fn generate<'a>(
        &'a self,
        _system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<String, ContextorError>> {
        Box::pin(async move {
            if self.fail {
                return Err(ContextorError::GenerationProvider("upstream timeout".into()));
            }
            let label = user
                .lines()
                .find(|l| l.starts_with('['))
                .and_then(|l| l.split_once("] "))
                .map(|(_, cite)| cite.to_string())
                .unwrap_or_default();
            Ok(format!("Twenty four days per year. {label}"))
        })
    }

    fn model_id(&self) -> &str {
        "fake"
    }
}

fn app(tmp: &TempDir, docs: &Path, fail_generation: bool) -> Router {
    let cfg = RagConfig {
        store: StoreKind::Memory,
        ..RagConfig::default()
    };
    let store = RagStore::new(&cfg, Arc::new(LetterEmbedder)).unwrap();
    let indexer = Indexer::new(
        store,
        Arc::new(CharCodec),
        Arc::new(FsDocumentLoader::new()),
        IndexerSettings {
            docs_dir: docs.to_path_buf(),
            chunking: ChunkingConfig {
                chunk_tokens: 40,
                overlap: 10,
            },
            store_batch: 4,
            collection: "api_test".into(),
            manifest_dir: tmp.path().join("manifests"),
        },
    );
    let answerer = Answerer::new(Arc::new(Generator {
        fail: fail_generation,
    }));
    router(Arc::new(AppState::new(Contextor::new(indexer, answerer, 5))))
}

fn corpus(tmp: &TempDir) -> std::path::PathBuf {
    let docs = tmp.path().join("documents");
    fs::create_dir_all(&docs).unwrap();
    fs::write(
        docs.join("leave.txt"),
        "Leave policy: employees receive twenty four days of annual leave each year. \
         Unused leave may be carried over up to five days. Requests need manager approval.",
    )
    .unwrap();
    docs
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn status_and_ask_before_indexing() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, &corpus(&tmp), false);

    let (status, body) = send(&app, Request::get("/status").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ready"], false);
    assert_eq!(body["data"]["collection"], "api_test");

    let (status, body) = send(&app, post("/ask", json!({"question": "leave policy"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "INDEX_NOT_READY");
}

#[tokio::test]
async fn index_then_ask_returns_cited_answer() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, &corpus(&tmp), false);

    let (status, body) = send(&app, post("/index", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["action"], "populated");
    assert_eq!(body["data"]["state_before"], "uninitialized");
    let passages = body["data"]["passages"].as_u64().unwrap();
    assert!(passages >= 3);

    let (_, body) = send(&app, Request::get("/status").body(Body::empty()).unwrap()).await;
    assert_eq!(body["data"]["ready"], true);
    assert_eq!(body["data"]["passages"], passages);

    let (status, body) = send(
        &app,
        post("/ask", json!({"question": "leave policy", "top_k": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["sources"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"]["citations"][0]["source"], "leave.txt");
    assert!(
        body["data"]["answer"]
            .as_str()
            .unwrap()
            .ends_with("(leave.txt, page 1)")
    );

    let (_, again) = send(&app, post("/index", json!({"rebuild": false}))).await;
    assert_eq!(again["data"]["action"], "reused");
    assert_eq!(again["data"]["passages"], passages);
}

#[tokio::test]
async fn generation_failure_still_returns_sources() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, &corpus(&tmp), true);
    send(&app, post("/index", json!({}))).await;

    let (status, body) = send(&app, post("/ask", json!({"question": "leave policy"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "GENERATION_PROVIDER");
    assert!(!body["data"]["sources"].as_array().unwrap().is_empty());
    assert!(body["data"].get("answer").is_none());
}

#[tokio::test]
async fn empty_corpus_is_unprocessable() {
    let tmp = TempDir::new().unwrap();
    let empty = tmp.path().join("documents");
    fs::create_dir_all(&empty).unwrap();
    let app = app(&tmp, &empty, false);

    let (status, body) = send(&app, post("/index", json!({"rebuild": true}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "CORPUS_EMPTY");
}

#[tokio::test]
async fn body_rejections_use_the_envelope() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, &corpus(&tmp), false);

    let (status, body) = send(&app, post("/ask", json!({"top_k": 3}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    assert_eq!(body["error"]["details"][0]["path"], "question");

    let (status, body) = send(&app, post("/ask", json!({"question": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "EMPTY_QUERY");
}

#[tokio::test]
async fn zero_top_k_is_a_bad_request() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp, &corpus(&tmp), false);
    send(&app, post("/index", json!({}))).await;

    let (status, body) = send(
        &app,
        post("/ask", json!({"question": "leave policy", "top_k": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_TOP_K");
}
