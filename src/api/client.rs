use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use super::error::ApiError;
use super::types::{BatchScoreResponse, ManualScoreResponse};
use crate::risk::{CustomerRiskRecord, ManualInputProfile};

const SCORE_FILE_FALLBACK: &str = "Failed to score file";
const SCORE_MANUAL_FALLBACK: &str = "Failed to score manual customer";
const FETCH_CUSTOMER_FALLBACK: &str = "Failed to fetch customer";

static CRYPTO_PROVIDER: Once = Once::new();

fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        // Err means another provider is already installed, which is fine
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// HTTP client for the external scoring service
#[derive(Debug, Clone)]
pub struct ScoringClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ScoringClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "not a hierarchical URL".to_string(),
            });
        }

        ensure_crypto_provider();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("risk-desk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Check the service answers at all
    pub async fn ping(&self) -> Result<(), ApiError> {
        let response = self.http.get(self.endpoint(&["api", "ping"])).send().await?;
        ensure_success(response, "Scoring service unavailable").await?;
        Ok(())
    }

    /// Upload a spreadsheet for batch scoring
    pub async fn score_file(&self, path: &Path) -> Result<BatchScoreResponse, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Upload {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.xlsx".to_string());

        tracing::debug!(file = %file_name, bytes = bytes.len(), "uploading batch for scoring");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .http
            .post(self.endpoint(&["api", "score"]))
            .multipart(form)
            .send()
            .await?;

        decode(ensure_success(response, SCORE_FILE_FALLBACK).await?).await
    }

    /// Score a single hand-entered profile
    pub async fn score_manual(
        &self,
        profile: &ManualInputProfile,
    ) -> Result<ManualScoreResponse, ApiError> {
        let response = self
            .http
            .post(self.endpoint(&["api", "score-manual"]))
            .json(profile)
            .send()
            .await?;

        decode(ensure_success(response, SCORE_MANUAL_FALLBACK).await?).await
    }

    /// Look up one record from the service's last scored batch
    pub async fn fetch_customer(&self, customer_id: &str) -> Result<CustomerRiskRecord, ApiError> {
        let response = self
            .http
            .get(self.endpoint(&["api", "customer", customer_id]))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                customer_id: customer_id.to_string(),
            });
        }

        decode(ensure_success(response, FETCH_CUSTOMER_FALLBACK).await?).await
    }
}

/// Turn a non-2xx response into `ApiError::Service`, preferring the body text
async fn ensure_success(response: Response, fallback: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    let message = if body.is_empty() {
        fallback.to_string()
    } else {
        body.to_string()
    };

    tracing::warn!(status = status.as_u16(), "scoring service returned an error");
    Err(ApiError::Service {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
