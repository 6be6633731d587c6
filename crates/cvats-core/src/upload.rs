use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CvatsError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub filename: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A validated presigned upload slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub upload_url: Url,
    pub key: String,
}

impl PresignResponse {
    pub fn into_target(self) -> Result<UploadTarget> {
        if !self.ok {
            return Err(CvatsError::Server(
                self.error
                    .unwrap_or_else(|| "Failed to get upload URL.".to_string()),
            ));
        }

        let raw_url = self.upload_url.ok_or_else(|| {
            CvatsError::MalformedResponse("presign response has no uploadUrl".into())
        })?;
        let upload_url = Url::parse(&raw_url).map_err(|e| {
            CvatsError::MalformedResponse(format!("presign uploadUrl '{raw_url}' is invalid: {e}"))
        })?;

        let key = self
            .key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CvatsError::MalformedResponse("presign response has no key".into()))?;

        Ok(UploadTarget { upload_url, key })
    }
}

/// Presign service plus the object-storage PUT it authorizes.
#[async_trait]
pub trait UploadApi: Send + Sync {
    async fn presign(&self, request: &PresignRequest) -> Result<PresignResponse>;

    /// PUT raw bytes to a presigned URL. `content_type` must match the one sent to presign.
    async fn put_object(&self, upload_url: &Url, content_type: &str, bytes: Vec<u8>) -> Result<()>;
}
