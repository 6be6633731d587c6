//! In-memory stand-ins for the screening backend, shared by the integration tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use url::Url;

use cvats_core::analysis::{AnalysisApi, ParseResponse, ParsedCv, ScoreResponse};
use cvats_core::error::{CvatsError, Result};
use cvats_core::extraction::{ExtractApi, ExtractionRequest, ExtractionResponse};
use cvats_core::progress::ProgressSink;
use cvats_core::upload::{PresignRequest, PresignResponse, UploadApi};

pub const JOB_DESCRIPTION: &str =
    "Senior backend engineer: Rust, AWS (S3, Lambda, Textract), PostgreSQL, CI/CD and observability.";

// ---------------------------------------------------------------------------
// Extraction endpoint
// ---------------------------------------------------------------------------

/// Replays a fixed list of responses, then `fallback` forever (if set).
pub struct ScriptedExtract {
    script: Mutex<VecDeque<Result<ExtractionResponse>>>,
    fallback: Option<ExtractionResponse>,
    calls: Mutex<Vec<(Instant, ExtractionRequest)>>,
}

impl ScriptedExtract {
    pub fn new(responses: Vec<ExtractionResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers every call with `pending(job_id)`.
    pub fn always_pending(job_id: &str) -> Self {
        Self {
            fallback: Some(ExtractionResponse::pending(job_id)),
            ..Self::new(Vec::new())
        }
    }

    /// Fails the next call at the transport level.
    pub fn failing_with(error: CvatsError) -> Self {
        let this = Self::new(Vec::new());
        this.script.lock().unwrap().push_back(Err(error));
        this
    }

    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.calls.lock().unwrap().iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn poll_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| matches!(r, ExtractionRequest::Poll { .. }))
            .count()
    }

    /// Time between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock().unwrap();
        calls.windows(2).map(|w| w[1].0 - w[0].0).collect()
    }
}

#[async_trait]
impl ExtractApi for ScriptedExtract {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        self.fallback
            .clone()
            .ok_or_else(|| CvatsError::Transport("scripted extract exhausted".into()))
    }
}

/// Accepts the call, then never answers within any test's lifetime.
#[derive(Default)]
pub struct StalledExtract {
    calls: Mutex<usize>,
}

impl StalledExtract {
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ExtractApi for StalledExtract {
    async fn extract(&self, _request: &ExtractionRequest) -> Result<ExtractionResponse> {
        *self.calls.lock().unwrap() += 1;
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(CvatsError::Transport("stalled extract woke up".into()))
    }
}

// ---------------------------------------------------------------------------
// Presign / PUT / parse / score
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRecord {
    pub url: Url,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct FakeBackend {
    pub presign_response: PresignResponse,
    pub put_status: Option<String>,
    pub parse_response: ParseResponse,
    pub score_response: serde_json::Value,
    pub presigns: Mutex<Vec<PresignRequest>>,
    pub puts: Mutex<Vec<PutRecord>>,
    pub parsed_texts: Mutex<Vec<String>>,
    pub scored: Mutex<Vec<(ParsedCv, String)>>,
}

impl FakeBackend {
    pub fn new(key: &str) -> Self {
        Self {
            presign_response: PresignResponse {
                ok: true,
                upload_url: Some(format!(
                    "https://bucket.s3.amazonaws.com/{key}?X-Amz-Signature=sig"
                )),
                key: Some(key.to_string()),
                error: None,
            },
            put_status: None,
            parse_response: ParseResponse {
                ok: true,
                parsed: Some(serde_json::json!({
                    "name": "Jane Doe",
                    "contact": { "email": "jane@example.com" },
                    "skills": ["Rust", "AWS", "PostgreSQL"],
                    "experience": [{ "title": "Backend Engineer", "company": "Acme" }],
                    "education": []
                })),
                error: None,
            },
            score_response: serde_json::json!({
                "ok": true,
                "score": 78,
                "semantic": { "matchedKeywords": ["rust", "aws"], "missingKeywords": ["lambda"] },
                "notes": ["Mention Textract experience"]
            }),
            presigns: Mutex::new(Vec::new()),
            puts: Mutex::new(Vec::new()),
            parsed_texts: Mutex::new(Vec::new()),
            scored: Mutex::new(Vec::new()),
        }
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    pub fn parse_count(&self) -> usize {
        self.parsed_texts.lock().unwrap().len()
    }

    pub fn score_count(&self) -> usize {
        self.scored.lock().unwrap().len()
    }
}

#[async_trait]
impl UploadApi for FakeBackend {
    async fn presign(&self, request: &PresignRequest) -> Result<PresignResponse> {
        self.presigns.lock().unwrap().push(request.clone());
        Ok(self.presign_response.clone())
    }

    async fn put_object(&self, upload_url: &Url, content_type: &str, bytes: Vec<u8>) -> Result<()> {
        self.puts.lock().unwrap().push(PutRecord {
            url: upload_url.clone(),
            content_type: content_type.to_string(),
            bytes,
        });
        match &self.put_status {
            Some(message) => Err(CvatsError::Transport(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AnalysisApi for FakeBackend {
    async fn parse(&self, text: &str) -> Result<ParseResponse> {
        self.parsed_texts.lock().unwrap().push(text.to_string());
        Ok(self.parse_response.clone())
    }

    async fn score(&self, parsed: &ParsedCv, job_description: &str) -> Result<ScoreResponse> {
        self.scored
            .lock()
            .unwrap()
            .push((parsed.clone(), job_description.to_string()));
        Ok(serde_json::from_value(self.score_response.clone())?)
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingProgress {
    statuses: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn count(&self, status: &str) -> usize {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.as_str() == status)
            .count()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, status: &str) {
        self.statuses.lock().unwrap().push(status.to_string());
    }
}
