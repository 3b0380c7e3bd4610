//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint against scripted
//! client doubles, covering cache behavior, batch ordering, and
//! partial-failure degradation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio::sync::RwLock;
use tower::ServiceExt;

use soma_tutor::api::create_router;
use soma_tutor::cache::QueryCache;
use soma_tutor::clients::{ClientError, PassageFilter, PassageType, RetrievedPassage};
use soma_tutor::clients::{AnswerGenerator, PassageRetriever};
use soma_tutor::engine::ANSWER_UNAVAILABLE;
use soma_tutor::prompt::SWAHILI_FALLBACK;
use soma_tutor::{AppState, Orchestrator};

// == Client Doubles ==

/// Serves canned passages by passage type and counts calls.
struct ScriptedRetriever {
    content: Vec<RetrievedPassage>,
    revision: Vec<RetrievedPassage>,
    calls: AtomicUsize,
}

impl ScriptedRetriever {
    fn new(content: Vec<RetrievedPassage>, revision: Vec<RetrievedPassage>) -> Self {
        Self {
            content,
            revision,
            calls: AtomicUsize::new(0),
        }
    }

    fn empty() -> Self {
        Self::new(vec![], vec![])
    }
}

#[async_trait]
impl PassageRetriever for ScriptedRetriever {
    async fn search(
        &self,
        _query: &str,
        filter: &PassageFilter,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let source = match filter.passage_type {
            PassageType::Content => &self.content,
            PassageType::Revision => &self.revision,
        };
        Ok(source.iter().take(top_k).cloned().collect())
    }
}

/// Bilingual replies by default; translation prompts get a translation
/// reply. Optional per-marker delays (staggered latency) and failures
/// (simulated outages), plus a monolingual mode.
struct ScriptedGenerator {
    calls: AtomicUsize,
    fail_marker: Option<String>,
    delays: Vec<(String, u64)>,
    monolingual: bool,
}

impl ScriptedGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_marker: None,
            delays: Vec::new(),
            monolingual: false,
        }
    }

    fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::new()
        }
    }

    fn with_delays(delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(m, d)| (m.to_string(), *d))
                .collect(),
            ..Self::new()
        }
    }

    fn monolingual() -> Self {
        Self {
            monolingual: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl AnswerGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        for (marker, delay_ms) in &self.delays {
            if prompt.contains(marker.as_str()) {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
            }
        }
        if let Some(marker) = &self.fail_marker {
            if prompt.contains(marker.as_str()) {
                return Err(ClientError::BadResponse("simulated outage".to_string()));
            }
        }
        if prompt.starts_with("You are a translator") {
            return Ok("Swali kwa Kiswahili".to_string());
        }
        if self.monolingual {
            return Ok("An English-only reply.".to_string());
        }
        Ok("ENGLISH:\nA generated answer.\n\nSWAHILI:\nJibu lililotengenezwa.".to_string())
    }
}

// == Helper Functions ==

fn content_passages() -> Vec<RetrievedPassage> {
    vec![RetrievedPassage {
        text: "Osmosis is the movement of water molecules across a semi-permeable membrane \
               from a region of high water concentration to a region of low concentration."
            .to_string(),
        chapter_tag: "2.1".to_string(),
        type_tag: "content".to_string(),
    }]
}

fn revision_passages() -> Vec<RetrievedPassage> {
    [
        "What is the function of the alpha membrane?",
        "Explain how the beta process moves water.",
        "Describe the role of the gamma organ in digestion.",
        "Why does the delta tissue expand in heat?",
        "How does the epsilon system transport nutrients?",
    ]
    .iter()
    .map(|q| RetrievedPassage {
        text: q.to_string(),
        chapter_tag: "1.5".to_string(),
        type_tag: "revision".to_string(),
    })
    .collect()
}

fn build_app(
    retriever: Arc<ScriptedRetriever>,
    generator: Arc<ScriptedGenerator>,
    ttl: Duration,
) -> Router {
    let cache = Arc::new(RwLock::new(QueryCache::new(ttl)));
    let orchestrator = Arc::new(Orchestrator::new(cache.clone(), retriever, generator, 3));
    create_router(AppState::new(cache, orchestrator))
}

fn default_app() -> Router {
    build_app(
        Arc::new(ScriptedRetriever::new(content_passages(), revision_passages())),
        Arc::new(ScriptedGenerator::new()),
        Duration::from_secs(300),
    )
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX).await.unwrap().to_vec()
}

async fn body_to_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}

// == Summarize Endpoint Tests ==

#[tokio::test]
async fn test_summarize_cold_cache() {
    let retriever = Arc::new(ScriptedRetriever::new(content_passages(), vec![]));
    let generator = Arc::new(ScriptedGenerator::new());
    let app = build_app(retriever.clone(), generator.clone(), Duration::from_secs(300));

    let response = app
        .clone()
        .oneshot(post_json("/summarize", r#"{"chapter":"2"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["mode"], "summarize");
    assert_eq!(json["chapter"], "2");
    assert_eq!(json["response"]["english"], "A generated answer.");
    assert_eq!(json["response"]["swahili"], "Jibu lililotengenezwa.");

    // Cold cache: exactly one retrieval and one generation
    assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    // Stats now report the cached query
    let stats = app.oneshot(get("/cache/stats")).await.unwrap();
    let stats_json = body_to_json(stats.into_body()).await;
    assert!(stats_json["cached_queries"].as_u64().unwrap() >= 1);
    assert_eq!(stats_json["ttl_seconds"].as_u64().unwrap(), 300);
}

#[tokio::test]
async fn test_summarize_repeat_is_byte_identical_with_no_new_calls() {
    let retriever = Arc::new(ScriptedRetriever::new(content_passages(), vec![]));
    let generator = Arc::new(ScriptedGenerator::new());
    let app = build_app(retriever.clone(), generator.clone(), Duration::from_secs(300));

    let first = app
        .clone()
        .oneshot(post_json("/summarize", r#"{"chapter":"2"}"#))
        .await
        .unwrap();
    let first_body = body_bytes(first.into_body()).await;
    let calls_after_first =
        retriever.calls.load(Ordering::SeqCst) + generator.calls.load(Ordering::SeqCst);

    let second = app
        .oneshot(post_json("/summarize", r#"{"chapter":"2"}"#))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = body_bytes(second.into_body()).await;

    assert_eq!(first_body, second_body);
    assert_eq!(
        retriever.calls.load(Ordering::SeqCst) + generator.calls.load(Ordering::SeqCst),
        calls_after_first,
        "warm hit must make zero external calls"
    );
}

#[tokio::test]
async fn test_summarize_ttl_expiry_triggers_regeneration() {
    let retriever = Arc::new(ScriptedRetriever::new(content_passages(), vec![]));
    let generator = Arc::new(ScriptedGenerator::new());
    let app = build_app(retriever.clone(), generator.clone(), Duration::from_millis(100));

    app.clone()
        .oneshot(post_json("/summarize", r#"{"chapter":"2"}"#))
        .await
        .unwrap();
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = app
        .oneshot(post_json("/summarize", r#"{"chapter":"2"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        generator.calls.load(Ordering::SeqCst),
        2,
        "expired entry must be regenerated"
    );
}

#[tokio::test]
async fn test_summarize_empty_retrieval_still_succeeds() {
    let app = build_app(
        Arc::new(ScriptedRetriever::empty()),
        Arc::new(ScriptedGenerator::new()),
        Duration::from_secs(300),
    );

    let response = app
        .oneshot(post_json("/summarize", r#"{"chapter":"9"}"#))
        .await
        .unwrap();

    // Content absence is a quality degradation, never a request failure
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["response"]["english"].as_str().is_some());
}

#[tokio::test]
async fn test_summarize_upstream_failure_is_generic_server_error() {
    let app = build_app(
        Arc::new(ScriptedRetriever::new(content_passages(), vec![])),
        Arc::new(ScriptedGenerator::failing_on("ENGLISH")),
        Duration::from_secs(300),
    );

    let response = app
        .oneshot(post_json("/summarize", r#"{"chapter":"2"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_to_json(response.into_body()).await;
    // Generic message only; internals must not leak
    let message = json["error"].as_str().unwrap();
    assert!(!message.contains("simulated outage"));
}

// == Ask Endpoint Tests ==

#[tokio::test]
async fn test_ask_returns_bilingual_answer() {
    let app = default_app();

    let response = app
        .oneshot(post_json("/ask", r#"{"question":"What is osmosis?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["mode"], "ask");
    assert_eq!(json["question_text"], "What is osmosis?");
    assert_eq!(json["response"]["swahili"], "Jibu lililotengenezwa.");
}

#[tokio::test]
async fn test_ask_swahili_fallback_on_monolingual_generation() {
    let app = build_app(
        Arc::new(ScriptedRetriever::new(content_passages(), vec![])),
        Arc::new(ScriptedGenerator::monolingual()),
        Duration::from_secs(300),
    );

    let response = app
        .oneshot(post_json("/ask", r#"{"question":"What is osmosis?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["response"]["english"], "An English-only reply.");
    assert_eq!(json["response"]["swahili"], SWAHILI_FALLBACK);
}

#[tokio::test]
async fn test_ask_normalized_questions_share_cache_entry() {
    let retriever = Arc::new(ScriptedRetriever::new(content_passages(), vec![]));
    let generator = Arc::new(ScriptedGenerator::new());
    let app = build_app(retriever, generator.clone(), Duration::from_secs(300));

    app.clone()
        .oneshot(post_json("/ask", r#"{"question":"What is osmosis?"}"#))
        .await
        .unwrap();
    let calls_after_first = generator.calls.load(Ordering::SeqCst);

    // Same question with different surrounding whitespace
    app.oneshot(post_json(
        "/ask",
        r#"{"question":"  What   is osmosis? "}"#,
    ))
    .await
    .unwrap();
    assert_eq!(generator.calls.load(Ordering::SeqCst), calls_after_first);
}

// == Revision Endpoint Tests ==

#[tokio::test]
async fn test_revision_returns_all_items_in_input_order() {
    // Stagger completions so earlier questions finish last
    let generator = Arc::new(ScriptedGenerator::with_delays(&[
        ("alpha", 120),
        ("beta", 60),
        ("delta", 90),
    ]));
    let app = build_app(
        Arc::new(ScriptedRetriever::new(content_passages(), revision_passages())),
        generator,
        Duration::from_secs(300),
    );

    let response = app
        .oneshot(post_json("/revision", r#"{"chapter":"1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["mode"], "revision");
    let questions = json["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 5);

    let order: Vec<&str> = questions
        .iter()
        .map(|q| q["question_text"].as_str().unwrap())
        .collect();
    assert!(order[0].contains("alpha"));
    assert!(order[1].contains("beta"));
    assert!(order[2].contains("gamma"));
    assert!(order[3].contains("delta"));
    assert!(order[4].contains("epsilon"));

    // Every item carries the translated question and a bilingual answer
    for item in questions {
        assert_eq!(item["swahili_question"], "Swali kwa Kiswahili");
        assert!(item["answer"]["english"].as_str().is_some());
        assert!(item["answer"]["swahili"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_revision_partial_failure_degrades_one_item_only() {
    let app = build_app(
        Arc::new(ScriptedRetriever::new(content_passages(), revision_passages())),
        Arc::new(ScriptedGenerator::failing_on("beta")),
        Duration::from_secs(300),
    );

    let response = app
        .oneshot(post_json("/revision", r#"{"chapter":"1"}"#))
        .await
        .unwrap();

    // Partial failure is still a well-formed 200
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let questions = json["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 5);

    assert_eq!(questions[1]["answer"]["english"], ANSWER_UNAVAILABLE);
    assert_eq!(questions[1]["answer"]["swahili"], SWAHILI_FALLBACK);
    for index in [0usize, 2, 3, 4] {
        assert_eq!(
            questions[index]["answer"]["english"], "A generated answer.",
            "sibling item {index} must be unaffected"
        );
    }
}

#[tokio::test]
async fn test_revision_no_questions_is_empty_200() {
    let app = build_app(
        Arc::new(ScriptedRetriever::new(content_passages(), vec![])),
        Arc::new(ScriptedGenerator::new()),
        Duration::from_secs(300),
    );

    let response = app
        .oneshot(post_json("/revision", r#"{"chapter":"8"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["questions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_revision_repeat_served_from_cache() {
    let retriever = Arc::new(ScriptedRetriever::new(content_passages(), revision_passages()));
    let generator = Arc::new(ScriptedGenerator::new());
    let app = build_app(retriever.clone(), generator.clone(), Duration::from_secs(300));

    let first = app
        .clone()
        .oneshot(post_json("/revision", r#"{"chapter":"1"}"#))
        .await
        .unwrap();
    let first_body = body_bytes(first.into_body()).await;
    let calls_after_first =
        retriever.calls.load(Ordering::SeqCst) + generator.calls.load(Ordering::SeqCst);

    let second = app
        .oneshot(post_json("/revision", r#"{"chapter":"1"}"#))
        .await
        .unwrap();
    let second_body = body_bytes(second.into_body()).await;

    assert_eq!(first_body, second_body);
    assert_eq!(
        retriever.calls.load(Ordering::SeqCst) + generator.calls.load(Ordering::SeqCst),
        calls_after_first
    );
}

// == Cache Management Tests ==

#[tokio::test]
async fn test_cache_clear_forces_fresh_generation() {
    let retriever = Arc::new(ScriptedRetriever::new(content_passages(), vec![]));
    let generator = Arc::new(ScriptedGenerator::new());
    let app = build_app(retriever, generator.clone(), Duration::from_secs(300));

    app.clone()
        .oneshot(post_json("/summarize", r#"{"chapter":"2"}"#))
        .await
        .unwrap();
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    let clear = app
        .clone()
        .oneshot(post_json("/cache/clear", "{}"))
        .await
        .unwrap();
    assert_eq!(clear.status(), StatusCode::OK);
    let clear_json = body_to_json(clear.into_body()).await;
    assert_eq!(clear_json["status"], "cache cleared");

    let stats = app.clone().oneshot(get("/cache/stats")).await.unwrap();
    let stats_json = body_to_json(stats.into_body()).await;
    assert_eq!(stats_json["cached_queries"].as_u64().unwrap(), 0);

    app.oneshot(post_json("/summarize", r#"{"chapter":"2"}"#))
        .await
        .unwrap();
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}

// == Validation and Error Response Tests ==

#[tokio::test]
async fn test_blank_chapter_is_bad_request() {
    let app = default_app();

    let response = app
        .oneshot(post_json("/summarize", r#"{"chapter":"  "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("chapter"));
}

#[tokio::test]
async fn test_missing_field_is_client_error() {
    let app = default_app();

    let response = app
        .oneshot(post_json("/ask", r#"{}"#))
        .await
        .unwrap();

    // Axum rejects bodies missing required fields before the handler runs
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_invalid_json_request() {
    let app = default_app();

    let response = app
        .oneshot(post_json("/summarize", r#"{"chapter""#))
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = default_app();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json.get("timestamp").is_some());
}
