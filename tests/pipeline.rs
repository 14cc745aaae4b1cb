//! Integration tests for the full submission pipeline.
//!
//! The extraction endpoint and the credits dataset are both served by a
//! local `wiremock` server, so these run offline and in CI.

use edgequake_sgpa::{
    calculate, calculate_image, load_credits, AggregationResult, CreditsLoadError, CreditsSource,
    CreditsTable, GeminiExtractor, ImageInput, NoopObserver, RecordValidation, ScoreExtractor,
    Session, SessionObserver, SessionState, SgpaConfig, SgpaError, SgpaWarning,
};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

// ── Fixtures ─────────────────────────────────────────────────────────────────

const GENERATE_PATH: &str = "/v1/models/gemini-1.5-flash:generateContent";
const CREDITS_PATH: &str = "/datasets/courseCredits";
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

const TWO_SUBJECTS: &str = r#"```json
{
  "BCS501": {"subject_name": "Software Engineering", "total_marks": 80},
  "BCS502": {"subject_name": "Computer Networks", "total_marks": 60}
}
```"#;

fn png() -> ImageInput {
    ImageInput::from_bytes(PNG_MAGIC.to_vec())
}

fn gemini_answer(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}

async fn mount_credits(server: &MockServer, body: serde_json::Value) {
    Mock::given(matchers::method("GET"))
        .and(matchers::path(CREDITS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_answer(server: &MockServer, text: &str) {
    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .and(matchers::query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_answer(text)))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> SgpaConfig {
    SgpaConfig::builder()
        .api_key("test-key")
        .api_base_url(server.uri())
        .credits_source(CreditsSource::Url(format!("{}{}", server.uri(), CREDITS_PATH)))
        .api_timeout_secs(5)
        .credits_timeout_secs(5)
        .build()
        .unwrap()
}

/// Records every observer callback in order.
#[derive(Default)]
struct Recorder {
    states: Mutex<Vec<SessionState>>,
    warnings: Mutex<Vec<SgpaWarning>>,
    failures: Mutex<Vec<String>>,
    successes: Mutex<Vec<AggregationResult>>,
}

impl SessionObserver for Recorder {
    fn on_state_change(&self, state: SessionState) {
        self.states.lock().unwrap().push(state);
    }
    fn on_warning(&self, warning: &SgpaWarning) {
        self.warnings.lock().unwrap().push(warning.clone());
    }
    fn on_success(&self, result: &AggregationResult) {
        self.successes.lock().unwrap().push(result.clone());
    }
    fn on_failure(&self, error: &SgpaError) {
        self.failures.lock().unwrap().push(error.to_string());
    }
}

// ── End-to-end against the mock server ──────────────────────────────────────

#[tokio::test]
async fn test_calculate_from_file() {
    let server = MockServer::start().await;
    mount_credits(&server, serde_json::json!({"BCS501": 4, "BCS502": 3})).await;
    mount_answer(&server, TWO_SUBJECTS).await;

    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(PNG_MAGIC).unwrap();

    let report = calculate(file.path(), &config_for(&server)).await.unwrap();

    assert_eq!(report.sgpa_display, "8.14");
    assert_eq!(report.total_credits, 7);
    assert!(report.unmatched.is_empty());
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0].code, "BCS501");
    assert_eq!(report.rows[0].credits, Some(4));
    assert_eq!(report.rows[0].grade_point, 9);
    assert_eq!(report.rows[1].grade_point, 7);

    let table = report.render_table();
    assert!(table.starts_with("SGPA : 8.14\n"));
    assert!(table.contains("Computer Networks"));
}

#[tokio::test]
async fn test_request_carries_image_and_instruction() {
    let server = MockServer::start().await;
    mount_credits(&server, serde_json::json!({"BCS501": 4, "BCS502": 3})).await;
    mount_answer(&server, TWO_SUBJECTS).await;

    calculate_image(png(), &config_for(&server), Arc::new(NoopObserver))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.url.path() == GENERATE_PATH)
        .expect("generateContent was called");
    let body: serde_json::Value = serde_json::from_slice(&post.body).unwrap();
    let parts = &body["contents"][0]["parts"];

    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[0]["inlineData"]["data"], "iVBORw0KGgoAAAANSUhEUg==");
    assert!(parts[1]["text"]
        .as_str()
        .unwrap()
        .contains("subject_name"));
}

#[tokio::test]
async fn test_unfenced_answer_is_accepted() {
    let server = MockServer::start().await;
    mount_credits(&server, serde_json::json!({"BCS501": 4})).await;
    mount_answer(
        &server,
        r#"{"BCS501": {"subject_name": "SE", "total_marks": 95}}"#,
    )
    .await;

    let report = calculate_image(png(), &config_for(&server), Arc::new(NoopObserver))
        .await
        .unwrap();
    assert_eq!(report.sgpa_display, "10.00");
}

#[tokio::test]
async fn test_mime_type_override_is_sent() {
    let server = MockServer::start().await;
    mount_credits(&server, serde_json::json!({})).await;
    mount_answer(&server, "{}").await;

    let config = SgpaConfig {
        mime_type: Some("image/jpeg".into()),
        ..config_for(&server)
    };
    calculate_image(png(), &config, Arc::new(NoopObserver))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.url.path() == GENERATE_PATH)
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&post.body).unwrap();
    assert_eq!(
        body["contents"][0]["parts"][0]["inlineData"]["mimeType"],
        "image/jpeg"
    );
}

// ── Extraction failures ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_error_status_fails_submission() {
    let server = MockServer::start().await;
    mount_credits(&server, serde_json::json!({"BCS501": 4})).await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": {"code": 500, "message": "Internal error", "status": "INTERNAL"}
        })))
        .mount(&server)
        .await;

    let err = calculate_image(png(), &config_for(&server), Arc::new(NoopObserver))
        .await
        .unwrap_err();

    match &err {
        SgpaError::ExtractionStatus { status, detail } => {
            assert_eq!(*status, 500);
            assert_eq!(detail, "Internal error");
        }
        other => panic!("expected ExtractionStatus, got {other:?}"),
    }
    assert!(err.to_string().starts_with("HTTP error! status: 500"));
    assert!(!err.to_string().contains("test-key"));
}

#[tokio::test]
async fn test_non_json_body_is_transport_failure() {
    let server = MockServer::start().await;
    mount_credits(&server, serde_json::json!({})).await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = calculate_image(png(), &config_for(&server), Arc::new(NoopObserver))
        .await
        .unwrap_err();
    assert!(matches!(err, SgpaError::ExtractionTransport { .. }));
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;
    mount_credits(&server, serde_json::json!({})).await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_answer("{}"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = SgpaConfig {
        api_timeout_secs: 1,
        ..config_for(&server)
    };
    let err = calculate_image(png(), &config, Arc::new(NoopObserver))
        .await
        .unwrap_err();
    assert!(matches!(err, SgpaError::ApiTimeout { secs: 1 }));
}

#[tokio::test]
async fn test_missing_candidates_is_parse_failure() {
    let server = MockServer::start().await;
    mount_credits(&server, serde_json::json!({})).await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let err = calculate_image(png(), &config_for(&server), Arc::new(NoopObserver))
        .await
        .unwrap_err();
    assert!(matches!(err, SgpaError::ParseFailure { .. }));
}

#[tokio::test]
async fn test_missing_api_key_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let config = SgpaConfig {
        api_key: None,
        ..config_for(&server)
    };
    let err = calculate_image(png(), &config, Arc::new(NoopObserver))
        .await
        .unwrap_err();
    assert!(matches!(err, SgpaError::ProviderNotConfigured { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── Credits degradation ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_credits_404_degrades_to_zero_sgpa() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path(CREDITS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_answer(&server, TWO_SUBJECTS).await;

    let recorder = Arc::new(Recorder::default());
    let report = calculate_image(png(), &config_for(&server), recorder.clone())
        .await
        .unwrap();

    assert_eq!(report.sgpa, 0.0);
    assert_eq!(report.sgpa_display, "0.00");
    assert_eq!(report.unmatched, vec!["BCS501", "BCS502"]);

    let warnings = recorder.warnings.lock().unwrap();
    assert_eq!(
        warnings[0],
        SgpaWarning::CreditsLoadFailed(CreditsLoadError::Status { status: 404 })
    );
    assert!(warnings.contains(&SgpaWarning::UnmatchedCredit {
        code: "BCS502".into()
    }));
}

#[tokio::test]
async fn test_malformed_credits_warns_once() {
    let server = MockServer::start().await;
    mount_credits(&server, serde_json::json!(["BCS501", 4])).await;

    let source = CreditsSource::Url(format!("{}{}", server.uri(), CREDITS_PATH));
    let recorder = Recorder::default();
    let table = load_credits(&source, 5, &recorder).await;

    assert!(table.is_empty());
    let warnings = recorder.warnings.lock().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(
        warnings[0],
        SgpaWarning::CreditsLoadFailed(CreditsLoadError::Malformed { .. })
    ));
}

#[test]
fn test_inline_credits_load_without_runtime_setup() {
    let source = CreditsSource::Inline([("BCS501".to_string(), 4)].into_iter().collect());
    let table = tokio_test::block_on(load_credits(&source, 1, &NoopObserver));
    assert_eq!(table.get("BCS501"), Some(4));
}

// ── Session orchestration ───────────────────────────────────────────────────

/// Blocks inside `extract` until released, so a submission can be held busy.
struct GatedExtractor {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl ScoreExtractor for GatedExtractor {
    async fn extract(&self, _image: &ImageInput) -> Result<String, SgpaError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(TWO_SUBJECTS.to_string())
    }
}

fn credits() -> CreditsTable {
    [("BCS501".to_string(), 4), ("BCS502".to_string(), 3)]
        .into_iter()
        .collect()
}

#[tokio::test]
async fn test_second_submission_rejected_while_busy() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let session = Arc::new(Session::new(
        GatedExtractor {
            entered: entered.clone(),
            release: release.clone(),
        },
        credits(),
    ));

    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.submit(Some(png())).await })
    };
    entered.notified().await;

    assert_eq!(session.state(), SessionState::Busy);
    let err = session.submit(Some(png())).await.unwrap_err();
    assert!(matches!(err, SgpaError::SubmissionInProgress));
    assert_eq!(session.state(), SessionState::Busy);

    release.notify_one();
    let result = first.await.unwrap().unwrap();
    assert_eq!(result.sgpa_display(), "8.14");
    assert_eq!(session.state(), SessionState::Idle);

    // Idle again: a new submission is accepted.
    release.notify_one();
    assert!(session.submit(Some(png())).await.is_ok());
}

#[tokio::test]
async fn test_cancelled_submission_returns_to_idle() {
    let entered = Arc::new(Notify::new());
    let session = Arc::new(Session::new(
        GatedExtractor {
            entered: entered.clone(),
            release: Arc::new(Notify::new()),
        },
        credits(),
    ));

    let task = {
        let session = session.clone();
        tokio::spawn(async move { session.submit(Some(png())).await })
    };
    entered.notified().await;
    assert_eq!(session.state(), SessionState::Busy);

    task.abort();
    let _ = task.await;
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_observer_sees_state_cycle() {
    let server = MockServer::start().await;
    mount_answer(&server, TWO_SUBJECTS).await;

    let recorder = Arc::new(Recorder::default());
    let extractor = GeminiExtractor::from_config(&config_for(&server)).unwrap();
    let session = Session::new(extractor, credits()).with_observer(recorder.clone());

    session.submit(Some(png())).await.unwrap();
    assert_eq!(
        *recorder.states.lock().unwrap(),
        vec![SessionState::Busy, SessionState::Success, SessionState::Idle]
    );
    assert_eq!(recorder.successes.lock().unwrap().len(), 1);

    session.submit(None).await.unwrap_err();
    assert_eq!(recorder.states.lock().unwrap().len(), 3);
    assert_eq!(
        recorder.failures.lock().unwrap().as_slice(),
        ["No image file selected."]
    );
}

#[tokio::test]
async fn test_failure_keeps_previous_result() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_answer(TWO_SUBJECTS)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let recorder = Arc::new(Recorder::default());
    let extractor = GeminiExtractor::from_config(&config_for(&server)).unwrap();
    let session = Session::new(extractor, credits())
        .with_validation(RecordValidation::Strict)
        .with_observer(recorder.clone());

    let first = session.submit(Some(png())).await.unwrap();
    let err = session.submit(Some(png())).await.unwrap_err();

    assert!(matches!(err, SgpaError::ExtractionStatus { status: 503, .. }));
    assert_eq!(session.last_result(), Some(first));
    assert_eq!(
        recorder.states.lock().unwrap()[3..],
        [SessionState::Busy, SessionState::Failed, SessionState::Idle]
    );
}
