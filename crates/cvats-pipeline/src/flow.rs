use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use cvats_core::analysis::{AnalysisApi, ScoreReport};
use cvats_core::error::{CvatsError, Result};
use cvats_core::progress::ProgressSink;
use cvats_core::session::{ScreeningSession, UploadedDocument};
use cvats_core::upload::{PresignRequest, UploadApi};
use cvats_core::validation::{validate_document, validate_job_description, MAX_FILE_BYTES};

use crate::poller::{cancellable, JobPoller};

pub const EXTRACTING: &str = "Extracting text…";
pub const PARSING: &str = "Parsing CV…";
pub const EXTRACTION_UNSUPPORTED: &str = "DOC/DOCX extraction coming soon. PDF works now.";
pub const UPLOADED: &str = "CV uploaded.";

/// A CV file held in memory, ready for upload.
#[derive(Debug, Clone)]
pub struct CvFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CvFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a CV from disk. Name and size are validated before the contents are loaded.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size_bytes = tokio::fs::metadata(path).await?.len();
        validate_document(&file_name, size_bytes)?;

        let bytes = tokio::fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Upload → extract → parse, then scoring on demand.
///
/// A failed extraction aborts [`ScreeningFlow::submit`]; the caller gets the
/// error and no session. Nothing is kept between calls except what the
/// returned [`ScreeningSession`] carries.
#[derive(Clone)]
pub struct ScreeningFlow {
    uploads: Arc<dyn UploadApi>,
    poller: JobPoller,
    analysis: Arc<dyn AnalysisApi>,
}

impl ScreeningFlow {
    pub fn new(
        uploads: Arc<dyn UploadApi>,
        poller: JobPoller,
        analysis: Arc<dyn AnalysisApi>,
    ) -> Self {
        Self {
            uploads,
            poller,
            analysis,
        }
    }

    pub async fn submit(
        &self,
        cv: CvFile,
        job_description: &str,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ScreeningSession> {
        let kind = validate_document(&cv.file_name, cv.size_bytes())?;
        let job_description = validate_job_description(job_description)?;

        let span = info_span!("submit", file = %cv.file_name, kind = ?kind);
        async move {
            let content_type = kind.content_type();
            let size_bytes = cv.size_bytes();

            let target = cancellable(
                cancel,
                self.uploads.presign(&PresignRequest {
                    filename: cv.file_name.clone(),
                    content_type: content_type.to_string(),
                }),
            )
            .await??
            .into_target()?;
            info!(key = %target.key, "Presigned upload slot");

            cancellable(
                cancel,
                self.uploads
                    .put_object(&target.upload_url, content_type, cv.bytes),
            )
            .await??;

            let mut session = ScreeningSession::new(
                job_description,
                UploadedDocument {
                    key: target.key,
                    file_name: cv.file_name,
                    size_bytes,
                    kind,
                },
            );

            if kind.supports_extraction() {
                progress.report(EXTRACTING);
                let text = self
                    .poller
                    .extract_text(&session.document.key, progress, cancel)
                    .await?;

                progress.report(PARSING);
                let parsed = cancellable(cancel, self.analysis.parse(&text))
                    .await??
                    .into_parsed()?;
                info!(
                    session = %session.id,
                    skills = parsed.skills.len(),
                    experience = parsed.experience.len(),
                    "CV parsed"
                );

                session.extracted_text = Some(text);
                session.parsed = Some(parsed);
            } else {
                progress.report(EXTRACTION_UNSUPPORTED);
            }

            progress.report(UPLOADED);
            Ok::<_, CvatsError>(session)
        }
        .instrument(span)
        .await
    }

    /// Request the ATS score for a parsed session and keep it on the session.
    pub async fn score<'s>(
        &self,
        session: &'s mut ScreeningSession,
        cancel: &CancellationToken,
    ) -> Result<&'s ScoreReport> {
        let parsed = match session.parsed.as_ref() {
            Some(parsed) if session.ready_for_scoring() => parsed,
            _ => {
                return Err(CvatsError::Validation(
                    "Missing parsed CV or job description.".into(),
                ))
            }
        };

        let report = cancellable(cancel, self.analysis.score(parsed, &session.job_description))
            .await??
            .into_report()?;
        info!(
            session = %session.id,
            score = report.score,
            rating = report.rating.label(),
            "ATS score computed"
        );

        Ok(&*session.score.insert(report))
    }
}
