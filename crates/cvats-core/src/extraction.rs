use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CvatsError, Result};

const EXTRACT_FAILED: &str = "Extract failed";

/// Body sent to the extraction endpoint. Exactly one of `key` / `jobId` is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractionRequest {
    /// Cold start for an uploaded object.
    Start { key: String },
    /// Follow-up query for a pending job.
    Poll {
        #[serde(rename = "jobId")]
        job_id: String,
    },
}

impl ExtractionRequest {
    pub fn start(key: impl Into<String>) -> Self {
        Self::Start { key: key.into() }
    }

    pub fn poll(job_id: impl Into<String>) -> Self {
        Self::Poll {
            job_id: job_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a single extraction response means for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Done(String),
    /// Still running. The job id may be omitted on follow-up polls.
    Pending(Option<String>),
}

impl ExtractionResponse {
    pub fn done(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn pending(job_id: impl Into<String>) -> Self {
        Self {
            ok: true,
            pending: true,
            job_id: Some(job_id.into()),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn into_outcome(self) -> Result<ExtractionOutcome> {
        if !self.ok {
            return Err(CvatsError::Server(
                self.error.unwrap_or_else(|| EXTRACT_FAILED.to_string()),
            ));
        }
        if self.pending {
            Ok(ExtractionOutcome::Pending(self.job_id))
        } else {
            Ok(ExtractionOutcome::Done(self.text.unwrap_or_default()))
        }
    }
}

/// The remote text-extraction endpoint.
#[async_trait]
pub trait ExtractApi: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResponse>;
}
