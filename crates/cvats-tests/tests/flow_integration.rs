use std::sync::Arc;

use cvats_core::analysis::ScoreRating;
use cvats_core::error::CvatsError;
use cvats_core::extraction::{ExtractionRequest, ExtractionResponse};
use cvats_core::upload::PresignResponse;
use cvats_core::validation::{DocumentKind, MAX_FILE_BYTES};
use cvats_pipeline::flow::{EXTRACTING, EXTRACTION_UNSUPPORTED, PARSING, UPLOADED};
use cvats_pipeline::{CvFile, JobPoller, ScreeningFlow};
use cvats_tests::{FakeBackend, RecordingProgress, ScriptedExtract, JOB_DESCRIPTION};
use tokio_util::sync::CancellationToken;

const KEY: &str = "uploads/abc123/cv.pdf";

fn flow(backend: &Arc<FakeBackend>, extract: &Arc<ScriptedExtract>) -> ScreeningFlow {
    ScreeningFlow::new(
        backend.clone(),
        JobPoller::new(extract.clone()),
        backend.clone(),
    )
}

fn pdf() -> CvFile {
    CvFile::new("Jane_Doe_CV.pdf", b"%PDF-1.4 fake".to_vec())
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn pdf_is_uploaded_extracted_and_parsed() {
    let backend = Arc::new(FakeBackend::new(KEY));
    let extract = Arc::new(ScriptedExtract::new(vec![
        ExtractionResponse::pending("job-1"),
        ExtractionResponse::done("Jane Doe\nBackend Engineer at Acme"),
    ]));
    let progress = RecordingProgress::default();

    let session = flow(&backend, &extract)
        .submit(pdf(), &format!("  {JOB_DESCRIPTION}\n"), &progress, &CancellationToken::new())
        .await
        .expect("submit should succeed");

    // Presign and PUT agree on content type
    let presigns = backend.presigns.lock().unwrap().clone();
    assert_eq!(presigns.len(), 1);
    assert_eq!(presigns[0].filename, "Jane_Doe_CV.pdf");
    assert_eq!(presigns[0].content_type, "application/pdf");

    let puts = backend.puts.lock().unwrap().clone();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].content_type, "application/pdf");
    assert_eq!(puts[0].bytes, b"%PDF-1.4 fake".to_vec());
    assert_eq!(puts[0].url.host_str(), Some("bucket.s3.amazonaws.com"));

    // Extraction keyed by the presigned object key
    assert_eq!(
        extract.requests(),
        vec![ExtractionRequest::start(KEY), ExtractionRequest::poll("job-1")]
    );
    assert_eq!(
        backend.parsed_texts.lock().unwrap().as_slice(),
        ["Jane Doe\nBackend Engineer at Acme".to_string()]
    );

    assert_eq!(session.document.key, KEY);
    assert_eq!(session.document.kind, DocumentKind::Pdf);
    assert_eq!(session.document.size_bytes, 13);
    assert_eq!(session.job_description, JOB_DESCRIPTION);
    assert_eq!(
        session.extracted_text.as_deref(),
        Some("Jane Doe\nBackend Engineer at Acme")
    );
    let parsed = session.parsed.as_ref().expect("parsed CV");
    assert_eq!(parsed.name.as_deref(), Some("Jane Doe"));
    assert_eq!(parsed.skills, vec!["Rust", "AWS", "PostgreSQL"]);
    assert!(session.score.is_none());

    let statuses = progress.statuses();
    let pos = |s: &str| statuses.iter().position(|x| x == s).unwrap();
    assert!(pos(EXTRACTING) < pos(PARSING));
    assert!(pos(PARSING) < pos(UPLOADED));
}

#[tokio::test]
async fn docx_skips_extraction_and_reports_placeholder() {
    let backend = Arc::new(FakeBackend::new("uploads/cv.docx"));
    let extract = Arc::new(ScriptedExtract::new(vec![ExtractionResponse::done("never")]));
    let progress = RecordingProgress::default();

    let session = flow(&backend, &extract)
        .submit(
            CvFile::new("cv.DOCX", vec![0x50, 0x4b, 0x03, 0x04]),
            JOB_DESCRIPTION,
            &progress,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(extract.call_count(), 0);
    assert_eq!(backend.parse_count(), 0);
    assert_eq!(backend.put_count(), 1);
    assert_eq!(
        backend.puts.lock().unwrap()[0].content_type,
        DocumentKind::Docx.content_type()
    );
    assert_eq!(session.document.kind, DocumentKind::Docx);
    assert!(session.parsed.is_none());
    assert_eq!(progress.statuses(), vec![EXTRACTION_UNSUPPORTED, UPLOADED]);
}

#[tokio::test]
async fn doc_skips_extraction() {
    let backend = Arc::new(FakeBackend::new("uploads/cv.doc"));
    let extract = Arc::new(ScriptedExtract::always_pending("job"));

    flow(&backend, &extract)
        .submit(
            CvFile::new("resume.doc", vec![0xd0, 0xcf]),
            JOB_DESCRIPTION,
            &RecordingProgress::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(extract.call_count(), 0);
}

// ---------------------------------------------------------------------------
// Validation happens before the network
// ---------------------------------------------------------------------------

async fn rejected(cv: CvFile, job_description: &str) -> (CvatsError, Arc<FakeBackend>) {
    let backend = Arc::new(FakeBackend::new(KEY));
    let extract = Arc::new(ScriptedExtract::always_pending("job"));
    let err = flow(&backend, &extract)
        .submit(cv, job_description, &RecordingProgress::default(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(extract.call_count(), 0);
    (err, backend)
}

#[tokio::test]
async fn unsupported_extension_is_rejected_locally() {
    let (err, backend) = rejected(CvFile::new("cv.txt", b"hello".to_vec()), JOB_DESCRIPTION).await;
    assert_eq!(err.to_string(), "Please upload a PDF, DOC, or DOCX file.");
    assert!(backend.presigns.lock().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_file_is_rejected_locally() {
    let big = vec![0u8; MAX_FILE_BYTES as usize + 1];
    let (err, backend) = rejected(CvFile::new("cv.pdf", big), JOB_DESCRIPTION).await;
    assert_eq!(err.to_string(), "File size must be less than 10MB.");
    assert!(backend.presigns.lock().unwrap().is_empty());
}

#[tokio::test]
async fn short_job_description_is_rejected_locally() {
    let (err, backend) = rejected(pdf(), "Rust dev").await;
    assert!(matches!(err, CvatsError::Validation(ref m) if m.contains("≥50 chars")));
    assert!(backend.presigns.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_file_name_is_rejected_locally() {
    let (err, _) = rejected(CvFile::new("", b"%PDF".to_vec()), JOB_DESCRIPTION).await;
    assert_eq!(err.to_string(), "Please upload your CV first.");
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn presign_failure_stops_before_upload() {
    let mut backend = FakeBackend::new(KEY);
    backend.presign_response = PresignResponse {
        ok: false,
        error: Some("Upload quota exceeded".into()),
        ..Default::default()
    };
    let backend = Arc::new(backend);
    let extract = Arc::new(ScriptedExtract::always_pending("job"));

    let err = flow(&backend, &extract)
        .submit(pdf(), JOB_DESCRIPTION, &RecordingProgress::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Upload quota exceeded");
    assert_eq!(backend.put_count(), 0);
    assert_eq!(extract.call_count(), 0);
}

#[tokio::test]
async fn upload_failure_stops_before_extraction() {
    let mut backend = FakeBackend::new(KEY);
    backend.put_status = Some("Upload failed: HTTP 403".into());
    let backend = Arc::new(backend);
    let extract = Arc::new(ScriptedExtract::always_pending("job"));

    let err = flow(&backend, &extract)
        .submit(pdf(), JOB_DESCRIPTION, &RecordingProgress::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CvatsError::Transport(ref m) if m == "Upload failed: HTTP 403"));
    assert_eq!(extract.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn extraction_failure_is_fatal_to_submit() {
    let backend = Arc::new(FakeBackend::new(KEY));
    let extract = Arc::new(ScriptedExtract::new(vec![
        ExtractionResponse::pending("job-1"),
        ExtractionResponse::failed("Unsupported PDF encryption"),
    ]));
    let progress = RecordingProgress::default();

    let err = flow(&backend, &extract)
        .submit(pdf(), JOB_DESCRIPTION, &progress, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Unsupported PDF encryption");
    assert_eq!(backend.parse_count(), 0);
    assert!(!progress.statuses().iter().any(|s| s == UPLOADED));
}

#[tokio::test(start_paused = true)]
async fn extraction_timeout_surfaces_retryable_error() {
    let backend = Arc::new(FakeBackend::new(KEY));
    let extract = Arc::new(ScriptedExtract::always_pending("job-slow"));

    let err = flow(&backend, &extract)
        .submit(pdf(), JOB_DESCRIPTION, &RecordingProgress::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(backend.parse_count(), 0);
}

#[tokio::test]
async fn parse_failure_reports_server_message() {
    let mut backend = FakeBackend::new(KEY);
    backend.parse_response.ok = false;
    backend.parse_response.error = Some("Model overloaded".into());
    let backend = Arc::new(backend);
    let extract = Arc::new(ScriptedExtract::new(vec![ExtractionResponse::done("text")]));

    let err = flow(&backend, &extract)
        .submit(pdf(), JOB_DESCRIPTION, &RecordingProgress::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Model overloaded");
}

#[tokio::test]
async fn cancelled_submit_stops_at_first_call() {
    let backend = Arc::new(FakeBackend::new(KEY));
    let extract = Arc::new(ScriptedExtract::always_pending("job"));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = flow(&backend, &extract)
        .submit(pdf(), JOB_DESCRIPTION, &RecordingProgress::default(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, CvatsError::Cancelled));
    assert!(backend.presigns.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[tokio::test]
async fn score_is_computed_from_session_state() {
    let backend = Arc::new(FakeBackend::new(KEY));
    let extract = Arc::new(ScriptedExtract::new(vec![ExtractionResponse::done("cv text")]));
    let flow = flow(&backend, &extract);
    let cancel = CancellationToken::new();

    let mut session = flow
        .submit(pdf(), JOB_DESCRIPTION, &RecordingProgress::default(), &cancel)
        .await
        .unwrap();

    let report = flow.score(&mut session, &cancel).await.unwrap().clone();
    assert_eq!(report.score, 78.0);
    assert_eq!(report.rating, ScoreRating::Good);
    assert_eq!(report.matched_keywords, vec!["rust", "aws"]);
    assert_eq!(report.missing_keywords, vec!["lambda"]);
    assert_eq!(report.recommendations, vec!["Mention Textract experience"]);
    assert_eq!(session.score.as_ref(), Some(&report));

    let scored = backend.scored.lock().unwrap().clone();
    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].0.name.as_deref(), Some("Jane Doe"));
    assert_eq!(scored[0].1, JOB_DESCRIPTION);
}

#[tokio::test]
async fn score_requires_parsed_cv() {
    let backend = Arc::new(FakeBackend::new("uploads/cv.docx"));
    let extract = Arc::new(ScriptedExtract::always_pending("job"));
    let flow = flow(&backend, &extract);
    let cancel = CancellationToken::new();

    let mut session = flow
        .submit(
            CvFile::new("cv.docx", vec![1, 2, 3]),
            JOB_DESCRIPTION,
            &RecordingProgress::default(),
            &cancel,
        )
        .await
        .unwrap();

    let err = flow.score(&mut session, &cancel).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing parsed CV or job description.");
    assert_eq!(backend.score_count(), 0);
    assert!(session.score.is_none());
}

#[tokio::test]
async fn score_failure_leaves_session_unscored() {
    let mut backend = FakeBackend::new(KEY);
    backend.score_response =
        serde_json::json!({ "ok": false, "error": "Scoring model unavailable" });
    let backend = Arc::new(backend);
    let extract = Arc::new(ScriptedExtract::new(vec![ExtractionResponse::done("cv text")]));
    let flow = flow(&backend, &extract);
    let cancel = CancellationToken::new();

    let mut session = flow
        .submit(pdf(), JOB_DESCRIPTION, &RecordingProgress::default(), &cancel)
        .await
        .unwrap();

    let err = flow.score(&mut session, &cancel).await.unwrap_err();
    assert_eq!(err.to_string(), "Scoring model unavailable");
    assert!(session.score.is_none());
}
