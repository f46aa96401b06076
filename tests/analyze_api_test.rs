use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bytes::Bytes;
use tower::ServiceExt;

use debrief::application::ports::{
    LlmClient, LlmClientError, StagingStore, StagingStoreError, TranscriptionEngine,
    TranscriptionError,
};
use debrief::application::services::{AnalysisService, FeedbackGenerator};
use debrief::domain::StoragePath;
use debrief::infrastructure::text::PlainTextResumeLoader;
use debrief::presentation::{create_router, AppState};

const BOUNDARY: &str = "test-boundary";
const TEST_TRANSCRIPT: &str = "I led the migration of our billing system to Rust.";
const JSON_REPLY: &str = r#"{"strengths": "Clear articulation", "weaknesses": "Rambling answers", "recommendations": "Use the STAR method"}"#;
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

struct MockTranscriptionEngine {
    transcript: String,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl TranscriptionEngine for MockTranscriptionEngine {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TranscriptionError::DecodingFailed(
                "corrupt audio".to_string(),
            ));
        }
        Ok(self.transcript.clone())
    }
}

enum LlmBehavior {
    Reply(String),
    Unauthorized,
}

struct MockLlmClient {
    behavior: LlmBehavior,
    calls: Arc<AtomicUsize>,
    last_system_prompt: Arc<Mutex<Option<String>>>,
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        system_prompt: &str,
        _user_message: &str,
    ) -> Result<String, LlmClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_system_prompt.lock().unwrap() = Some(system_prompt.to_string());
        match &self.behavior {
            LlmBehavior::Reply(reply) => Ok(reply.clone()),
            LlmBehavior::Unauthorized => Err(LlmClientError::Unauthorized),
        }
    }
}

#[derive(Default)]
struct InMemoryStagingStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl InMemoryStagingStore {
    fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }
}

#[async_trait::async_trait]
impl StagingStore for InMemoryStagingStore {
    async fn store(&self, path: &StoragePath, data: Bytes) -> Result<u64, StagingStoreError> {
        let size = data.len() as u64;
        self.objects
            .lock()
            .unwrap()
            .insert(path.as_str().to_string(), data);
        Ok(size)
    }

    async fn fetch(&self, path: &StoragePath) -> Result<Vec<u8>, StagingStoreError> {
        self.objects
            .lock()
            .unwrap()
            .get(path.as_str())
            .map(|b| b.to_vec())
            .ok_or_else(|| StagingStoreError::NotFound(path.as_str().to_string()))
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError> {
        self.objects.lock().unwrap().remove(path.as_str());
        Ok(())
    }
}

struct TestContext {
    app: axum::Router,
    engine_calls: Arc<AtomicUsize>,
    llm_calls: Arc<AtomicUsize>,
    last_system_prompt: Arc<Mutex<Option<String>>>,
    store: Arc<InMemoryStagingStore>,
}

fn create_test_app(engine_fails: bool, behavior: LlmBehavior) -> TestContext {
    let engine_calls = Arc::new(AtomicUsize::new(0));
    let llm_calls = Arc::new(AtomicUsize::new(0));
    let last_system_prompt = Arc::new(Mutex::new(None));
    let store = Arc::new(InMemoryStagingStore::default());

    let engine = MockTranscriptionEngine {
        transcript: TEST_TRANSCRIPT.to_string(),
        fail: engine_fails,
        calls: Arc::clone(&engine_calls),
    };
    let llm = MockLlmClient {
        behavior,
        calls: Arc::clone(&llm_calls),
        last_system_prompt: Arc::clone(&last_system_prompt),
    };

    let analysis_service = Arc::new(AnalysisService::new(
        Arc::clone(&store) as Arc<dyn StagingStore>,
        Arc::new(engine),
        FeedbackGenerator::new(Arc::new(llm)),
        Arc::new(PlainTextResumeLoader::new()),
    ));

    let app = create_router(AppState { analysis_service }, MAX_UPLOAD_BYTES);

    TestContext {
        app,
        engine_calls,
        llm_calls,
        last_system_prompt,
        store,
    }
}

fn multipart_body(parts: &[(&str, &str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content_type, data) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn analyze_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/analyze")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn audio_part<'a>(data: &'a [u8]) -> (&'a str, &'a str, &'a str, &'a [u8]) {
    ("file", "interview.wav", "audio/wav", data)
}

#[tokio::test]
async fn given_running_server_when_health_check_then_returns_ok() {
    let ctx = create_test_app(false, LlmBehavior::Reply(JSON_REPLY.to_string()));

    let response = ctx
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn given_audio_upload_when_analyzing_then_returns_full_report() {
    let ctx = create_test_app(false, LlmBehavior::Reply(JSON_REPLY.to_string()));

    let body = multipart_body(&[audio_part(b"fake-wav-bytes")]);
    let response = ctx.app.oneshot(analyze_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["transcript"], TEST_TRANSCRIPT);
    assert_eq!(json["strengths"], "Clear articulation");
    assert_eq!(json["weaknesses"], "Rambling answers");
    assert_eq!(json["recommendations"], "Use the STAR method");
}

#[tokio::test]
async fn given_missing_audio_field_when_analyzing_then_returns_bad_request_without_model_calls() {
    let ctx = create_test_app(false, LlmBehavior::Reply(JSON_REPLY.to_string()));

    let body = multipart_body(&[("resume", "resume.txt", "text/plain", b"text" as &[u8])]);
    let response = ctx.app.oneshot(analyze_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("No audio file"));
    assert_eq!(ctx.engine_calls.load(Ordering::SeqCst), 0);
    assert_eq!(ctx.llm_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn given_empty_audio_payload_when_analyzing_then_returns_bad_request() {
    let ctx = create_test_app(false, LlmBehavior::Reply(JSON_REPLY.to_string()));

    let body = multipart_body(&[audio_part(b"")]);
    let response = ctx.app.oneshot(analyze_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.engine_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn given_non_audio_media_type_when_analyzing_then_returns_bad_request() {
    let ctx = create_test_app(false, LlmBehavior::Reply(JSON_REPLY.to_string()));

    let body = multipart_body(&[("file", "notes.txt", "text/plain", b"hello" as &[u8])]);
    let response = ctx.app.oneshot(analyze_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("Invalid file type"));
    assert_eq!(ctx.engine_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn given_unlabeled_reply_when_analyzing_then_sections_fall_back_to_placeholder() {
    let ctx = create_test_app(
        false,
        LlmBehavior::Reply("The candidate did fine overall.".to_string()),
    );

    let body = multipart_body(&[audio_part(b"fake-wav-bytes")]);
    let response = ctx.app.oneshot(analyze_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["transcript"], TEST_TRANSCRIPT);
    assert_eq!(json["strengths"], "N/A");
    assert_eq!(json["weaknesses"], "N/A");
    assert_eq!(json["recommendations"], "N/A");
}

#[tokio::test]
async fn given_unauthorized_completion_endpoint_when_analyzing_then_returns_bad_gateway_and_cleans_spool(
) {
    let ctx = create_test_app(false, LlmBehavior::Unauthorized);

    let body = multipart_body(&[audio_part(b"fake-wav-bytes")]);
    let response = ctx.app.oneshot(analyze_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = response_json(response).await;
    assert!(!json["detail"].as_str().unwrap().is_empty());
    assert!(ctx.store.is_empty());
}

#[tokio::test]
async fn given_transcription_failure_when_analyzing_then_returns_server_error_and_cleans_spool() {
    let ctx = create_test_app(true, LlmBehavior::Reply(JSON_REPLY.to_string()));

    let body = multipart_body(&[audio_part(b"fake-wav-bytes")]);
    let response = ctx.app.oneshot(analyze_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ctx.store.is_empty());
    assert_eq!(ctx.llm_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn given_successful_analysis_when_request_completes_then_spool_is_empty() {
    let ctx = create_test_app(false, LlmBehavior::Reply(JSON_REPLY.to_string()));

    let body = multipart_body(&[audio_part(b"fake-wav-bytes")]);
    let response = ctx.app.oneshot(analyze_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(ctx.store.is_empty());
}

#[tokio::test]
async fn given_text_resume_when_analyzing_then_prompt_includes_resume() {
    let ctx = create_test_app(false, LlmBehavior::Reply(JSON_REPLY.to_string()));

    let body = multipart_body(&[
        audio_part(b"fake-wav-bytes"),
        (
            "resume",
            "resume.txt",
            "text/plain",
            b"Senior Rust engineer, five years of systems work." as &[u8],
        ),
    ]);
    let response = ctx.app.oneshot(analyze_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let prompt = ctx.last_system_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("Senior Rust engineer"));
    assert!(prompt.contains("--- RESUME ---"));
}

#[tokio::test]
async fn given_unsupported_resume_format_when_analyzing_then_returns_unsupported_media_type() {
    let ctx = create_test_app(false, LlmBehavior::Reply(JSON_REPLY.to_string()));

    let body = multipart_body(&[
        audio_part(b"fake-wav-bytes"),
        ("resume", "resume.pdf", "application/pdf", b"%PDF-1.4" as &[u8]),
    ]);
    let response = ctx.app.oneshot(analyze_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(ctx.engine_calls.load(Ordering::SeqCst), 0);
    assert!(ctx.store.is_empty());
}
