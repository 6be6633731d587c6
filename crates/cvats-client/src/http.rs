use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use cvats_core::analysis::{
    AnalysisApi, ParseRequest, ParseResponse, ParsedCv, ScoreRequest, ScoreResponse,
};
use cvats_core::config::{
    ClientConfig, EXTRACT_ENDPOINT, PARSE_ENDPOINT, PRESIGN_ENDPOINT, SCORE_ENDPOINT,
};
use cvats_core::error::{CvatsError, Result};
use cvats_core::extraction::{ExtractApi, ExtractionRequest, ExtractionResponse};
use cvats_core::upload::{PresignRequest, PresignResponse, UploadApi};

/// JSON-over-HTTPS client for the screening backend.
///
/// One instance serves every endpoint: presign, the object-storage PUT,
/// extract, parse and score. Cloning is cheap; the underlying connection
/// pool is shared.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    config: ClientConfig,
}

impl HttpApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.config.endpoint(endpoint)?;
        debug!(url = %url, "POST");

        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        let raw = response.text().await?;

        decode_response(endpoint, status, &raw)
    }
}

/// Turn a status + body into a typed response, surfacing backend error text when present.
fn decode_response<R: DeserializeOwned>(
    endpoint: &str,
    status: StatusCode,
    raw: &str,
) -> Result<R> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) if status.is_success() => {
            warn!(endpoint, status = status.as_u16(), "non-JSON response body");
            return Err(CvatsError::MalformedResponse(format!(
                "Non-JSON response ({})",
                status.as_u16()
            )));
        }
        Err(_) => {
            warn!(endpoint, status = status.as_u16(), "request failed");
            return Err(CvatsError::Transport(format!("HTTP {}", status.as_u16())));
        }
    };

    if !status.is_success() {
        let message = value.get("error").and_then(Value::as_str).map(String::from);
        warn!(endpoint, status = status.as_u16(), error = ?message, "request failed");
        return Err(match message {
            Some(message) => CvatsError::Server(message),
            None => CvatsError::Transport(format!("HTTP {}", status.as_u16())),
        });
    }

    serde_json::from_value(value).map_err(|e| {
        CvatsError::MalformedResponse(format!("unexpected {endpoint} response: {e}"))
    })
}

#[async_trait]
impl UploadApi for HttpApi {
    async fn presign(&self, request: &PresignRequest) -> Result<PresignResponse> {
        info!(
            filename = %request.filename,
            content_type = %request.content_type,
            "Requesting presigned upload"
        );
        self.post_json(PRESIGN_ENDPOINT, request).await
    }

    async fn put_object(&self, upload_url: &Url, content_type: &str, bytes: Vec<u8>) -> Result<()> {
        let size = bytes.len();
        debug!(host = ?upload_url.host_str(), size, "PUT object");

        let response = self
            .client
            .put(upload_url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                body = %body.chars().take(500).collect::<String>(),
                "Object upload rejected"
            );
            return Err(CvatsError::Transport(format!(
                "Upload failed: HTTP {}",
                status.as_u16()
            )));
        }

        info!(size, "Object uploaded");
        Ok(())
    }
}

#[async_trait]
impl ExtractApi for HttpApi {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResponse> {
        self.post_json(EXTRACT_ENDPOINT, request).await
    }
}

#[async_trait]
impl AnalysisApi for HttpApi {
    async fn parse(&self, text: &str) -> Result<ParseResponse> {
        debug!(text_len = text.len(), "Parsing CV text");
        self.post_json(PARSE_ENDPOINT, &ParseRequest { text }).await
    }

    async fn score(&self, parsed: &ParsedCv, job_description: &str) -> Result<ScoreResponse> {
        debug!(jd_len = job_description.len(), "Requesting ATS score");
        self.post_json(
            SCORE_ENDPOINT,
            &ScoreRequest {
                parsed_cv: parsed,
                job_description,
            },
        )
        .await
    }
}
