use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{ParsedCv, ScoreReport};
use crate::validation::DocumentKind;

/// A CV as stored by the upload service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub key: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub kind: DocumentKind,
}

/// Everything one screening has produced so far. Owned by the caller and
/// passed back in for follow-up steps such as scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub job_description: String,
    pub document: UploadedDocument,
    pub extracted_text: Option<String>,
    pub parsed: Option<ParsedCv>,
    pub score: Option<ScoreReport>,
}

impl ScreeningSession {
    pub fn new(job_description: impl Into<String>, document: UploadedDocument) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            job_description: job_description.into(),
            document,
            extracted_text: None,
            parsed: None,
            score: None,
        }
    }

    /// True once there is enough to request an ATS score.
    pub fn ready_for_scoring(&self) -> bool {
        self.parsed.is_some() && !self.job_description.trim().is_empty()
    }
}
