//! Fakes for the backend, the LLM and the embedding model.

use anyhow::Result;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::{
    AppConfig, BackendConfig, ChunkingConfig, EmbeddingsConfig, LlmConfig, RetrievalConfig,
    VectorBackend, VectorStoreConfig,
};
use crate::services::gateway::GatewayClient;
use crate::services::llm_provider::{CompletionBackend, Embedder};
use crate::state::AppState;

const EMBEDDING_DIMS: usize = 256;

/// A minimal PDF with one page per entry, each showing its text in
/// Helvetica. An empty entry gives a page with no text.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let page_refs: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", 4 + 2 * i)).collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", page_refs.join(" "), pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
    ];
    for (i, text) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + 2 * i
        ));
        let content = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 24 Tf 72 720 Td ({text}) Tj ET")
        };
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ));
    }

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{object}\nendobj\n", i + 1).as_bytes());
    }

    let xref_offset = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}

/// Hashed bag-of-words: texts sharing words get similar vectors.
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    fn bucket(word: &str) -> usize {
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in word.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x100000001b3);
        }
        (hash % EMBEDDING_DIMS as u64) as usize
    }
}

impl Embedder for KeywordEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f64>>> {
        Box::pin(async move {
            let mut vector = vec![0.0; EMBEDDING_DIMS];
            let lower = text.to_lowercase();
            for word in lower.split(|c: char| !c.is_ascii_alphanumeric()).filter(|w| !w.is_empty()) {
                vector[Self::bucket(word)] += 1.0;
            }
            Ok(vector)
        })
    }
}

/// Replays canned completions in order and records what it was asked.
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new<I: IntoIterator<Item = &'static str>>(responses: I) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(str::to_string).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl CompletionBackend for ScriptedCompletion {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no scripted completion left"))
        })
    }
}

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<AtomicUsize>,
    groups: Arc<Mutex<Vec<Value>>>,
    assignments: Arc<Mutex<Vec<Value>>>,
}

/// In-process stand-in for the quiz backend on an ephemeral port.
///
/// Accepts `a@b.com` / `secret`; `a@b.com` is already registered.
pub struct MockBackend {
    addr: SocketAddr,
    recorded: Recorded,
}

impl MockBackend {
    pub const TOKEN: &'static str = "token-123";

    pub async fn start() -> Self {
        let recorded = Recorded::default();
        let app = Router::new()
            .route("/t-login", post(login))
            .route("/t-signup", post(signup))
            .route("/t-addgroup", post(add_group))
            .route("/find_groups", post(find_groups))
            .route("/assign_tests", post(assign_tests))
            .with_state(recorded.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, recorded }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn gateway(&self) -> GatewayClient {
        GatewayClient::new(&BackendConfig {
            base_url: self.base_url(),
        })
        .unwrap()
    }

    pub fn request_count(&self) -> usize {
        self.recorded.requests.load(Ordering::SeqCst)
    }

    pub fn created_groups(&self) -> Vec<Value> {
        self.recorded.groups.lock().unwrap().clone()
    }

    pub fn assignments(&self) -> Vec<Value> {
        self.recorded.assignments.lock().unwrap().clone()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", MockBackend::TOKEN))
}

async fn login(State(rec): State<Recorded>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    rec.requests.fetch_add(1, Ordering::SeqCst);
    if body["email"] == "a@b.com" && body["password"] == "secret" {
        (StatusCode::OK, Json(json!({"success": "1", "token": MockBackend::TOKEN})))
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({"success": "-1"})))
    }
}

async fn signup(State(rec): State<Recorded>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    rec.requests.fetch_add(1, Ordering::SeqCst);
    if body["email"] == "a@b.com" {
        (StatusCode::BAD_REQUEST, Json(json!({"success": "-1"})))
    } else {
        (StatusCode::OK, Json(json!({"success": "1"})))
    }
}

async fn add_group(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    rec.requests.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "invalid token".to_string());
    }
    rec.groups.lock().unwrap().push(body);
    (StatusCode::OK, "created".to_string())
}

async fn find_groups(State(rec): State<Recorded>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    rec.requests.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "invalid token"})));
    }
    (StatusCode::OK, Json(json!({"mailId": "a@b.com", "groups": ["G1"]})))
}

async fn assign_tests(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    rec.requests.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "invalid token"})));
    }
    rec.assignments.lock().unwrap().push(body);
    (StatusCode::OK, Json(json!({"quiz_id": "quiz-1"})))
}

pub fn memory_store_config() -> VectorStoreConfig {
    VectorStoreConfig {
        backend: VectorBackend::Memory,
        qdrant_url: "http://localhost:6334".into(),
        qdrant_api_key: String::new(),
        collection_prefix: "test".into(),
    }
}

pub fn test_config(base_url: String) -> AppConfig {
    AppConfig {
        backend: BackendConfig { base_url },
        llm: LlmConfig {
            provider: "groq".into(),
            model: "llama3-8b-8192".into(),
            api_key: String::new(),
            max_attempts: 2,
        },
        embeddings: EmbeddingsConfig {
            provider: "ollama".into(),
            model: "all-minilm".into(),
            api_key: String::new(),
        },
        chunking: ChunkingConfig {
            chunk_size: 10_000,
            chunk_overlap: 1_000,
        },
        retrieval: RetrievalConfig {
            top_k: 3,
            fallback_chunks: 3,
        },
        vector_store: memory_store_config(),
    }
}

pub fn app_state(backend: &MockBackend, llm: Arc<ScriptedCompletion>) -> AppState {
    AppState::new(
        test_config(backend.base_url()),
        backend.gateway(),
        Arc::new(KeywordEmbedder),
        llm,
    )
}
