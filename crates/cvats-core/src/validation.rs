//! Input checks performed before anything is sent over the network.

use serde::{Deserialize, Serialize};

use crate::error::{CvatsError, Result};

/// Maximum accepted CV size: 10 MiB
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Minimum job description length, in characters, after trimming
pub const MIN_JOB_DESCRIPTION_CHARS: usize = 50;

pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".doc"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Doc,
}

impl DocumentKind {
    /// Classify a file by the text after its last '.', case-insensitively.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let dot = file_name.rfind('.')?;
        match file_name[dot..].to_ascii_lowercase().as_str() {
            ".pdf" => Some(Self::Pdf),
            ".docx" => Some(Self::Docx),
            ".doc" => Some(Self::Doc),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Doc => "application/msword",
        }
    }

    /// Only PDFs go through server-side text extraction.
    pub fn supports_extraction(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

pub fn validate_document(file_name: &str, size_bytes: u64) -> Result<DocumentKind> {
    if file_name.trim().is_empty() {
        return Err(CvatsError::Validation("Please upload your CV first.".into()));
    }
    let kind = DocumentKind::from_file_name(file_name).ok_or_else(|| {
        CvatsError::Validation("Please upload a PDF, DOC, or DOCX file.".into())
    })?;
    if size_bytes > MAX_FILE_BYTES {
        return Err(CvatsError::Validation(
            "File size must be less than 10MB.".into(),
        ));
    }
    Ok(kind)
}

/// Returns the trimmed description.
pub fn validate_job_description(job_description: &str) -> Result<&str> {
    let trimmed = job_description.trim();
    if trimmed.is_empty() {
        return Err(CvatsError::Validation(
            "Please enter a job description.".into(),
        ));
    }
    if trimmed.chars().count() < MIN_JOB_DESCRIPTION_CHARS {
        return Err(CvatsError::Validation(
            "Please enter a more detailed job description (≥50 chars).".into(),
        ));
    }
    Ok(trimmed)
}
