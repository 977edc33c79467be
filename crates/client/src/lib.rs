//! # Ambulance Assistant Client
//!
//! HTTP client for the journal API served by `api-rest`.
//!
//! [`JournalClient`] implements the core's [`PatientDirectory`] and [`JournalSource`] traits, so
//! the selection workflow can run against a remote service exactly as it does against the
//! local fixture index. Transport and HTTP failures are reported as [`FetchFailure`], never as
//! empty results.

use ambu_core::assistant::CaseAnalysis;
use ambu_core::capture::CapturedImage;
use ambu_core::record::{EmergencyLog, SearchResult};
use ambu_core::{FetchFailure, JournalDocument, JournalSource, PatientDirectory};
use ambu_types::NonEmptyText;
use api_shared::{
    AnalyzeImageRes, AskQuestionReq, AskQuestionRes, HealthRes, LoadJournalRes, SearchPatientsRes,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },
}

impl ClientError {
    fn into_fetch_failure(self, timeout: Duration) -> FetchFailure {
        match self {
            ClientError::NetworkError(e) if e.is_timeout() => FetchFailure::Timeout(timeout),
            ClientError::NetworkError(e) if e.is_decode() => FetchFailure::Decode(e.to_string()),
            ClientError::NetworkError(e) => FetchFailure::Network(e.to_string()),
            ClientError::JsonError(e) => FetchFailure::Decode(e.to_string()),
            ClientError::Status { status, body } => FetchFailure::Status { status, body },
            other @ (ClientError::UrlError(_) | ClientError::ConfigError(_)) => {
                FetchFailure::Network(other.to_string())
            }
        }
    }
}

/// Where the journal API lives and how long to wait for it.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: Url,
    timeout: Duration,
}

impl ClientConfig {
    /// # Errors
    /// Returns `ClientError::UrlError` if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        // Url::join drops the last path segment unless the base ends with a slash.
        let normalised = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalised).map_err(|e| ClientError::UrlError(format!("{base_url}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::UrlError(format!(
                "unsupported scheme {}",
                base_url.scheme()
            )));
        }
        Ok(Self { base_url, timeout })
    }

    /// Parses `AMBU_API_BASE_URL` / `AMBU_REQUEST_TIMEOUT_SECS` style values, using the defaults
    /// for absent or blank ones.
    pub fn from_env_values(
        base_url: Option<String>,
        timeout_secs: Option<String>,
    ) -> Result<Self, ClientError> {
        let base_url = base_url
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());

        let timeout = match timeout_secs.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(v) => {
                let secs: u64 = v.parse().map_err(|_| {
                    ClientError::ConfigError(format!("request timeout is not a whole number of seconds: {v}"))
                })?;
                if secs == 0 {
                    return Err(ClientError::ConfigError("request timeout must be at least 1 second".into()));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Self::new(&base_url, timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Result of uploading a photo for analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAnalysis {
    /// Name under which the service stored the photo.
    pub filename: String,
    pub analysis: CaseAnalysis,
    pub relevant_info: Option<String>,
}

#[derive(Deserialize)]
struct EmergencyLogsBody {
    logs: Vec<EmergencyLog>,
}

/// Client for the journal REST API.
#[derive(Clone, Debug)]
pub struct JournalClient {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl JournalClient {
    /// # Errors
    /// Returns `ClientError::ConfigError` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| ClientError::UrlError(format!("{path}: {e}")))
    }

    pub async fn health(&self) -> Result<HealthRes, ClientError> {
        let response = self.http_client.get(self.endpoint("health")?).send().await?;
        self.handle_response(response).await
    }

    /// Raw search hits as the service returns them.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ClientError> {
        let response = self
            .http_client
            .get(self.endpoint("api/search_patients")?)
            .query(&[("query", query)])
            .send()
            .await?;
        let body: SearchPatientsRes = self.handle_response(response).await?;

        Ok(body
            .matches
            .into_iter()
            .map(|m| SearchResult {
                label: m.name,
                score: m.score,
            })
            .collect())
    }

    pub async fn journal(&self, patient_id: &str) -> Result<JournalDocument, ClientError> {
        let response = self
            .http_client
            .get(self.endpoint("api/load_journal")?)
            .query(&[("patient_id", patient_id)])
            .send()
            .await?;
        let body: LoadJournalRes = self.handle_response(response).await?;
        Ok(JournalDocument {
            text: body.text,
            summary: body.summary,
        })
    }

    pub async fn emergency_logs(&self, patient_id: &str) -> Result<Vec<EmergencyLog>, ClientError> {
        let response = self
            .http_client
            .get(self.endpoint("api/emergency_logs")?)
            .query(&[("patient_id", patient_id)])
            .send()
            .await?;
        let body: EmergencyLogsBody = self.handle_response(response).await?;
        Ok(body.logs)
    }

    pub async fn ask_question(&self, question: &str, text: &str) -> Result<String, ClientError> {
        let response = self
            .http_client
            .post(self.endpoint("api/ask_question")?)
            .json(&AskQuestionReq {
                question: question.to_string(),
                text: text.to_string(),
            })
            .send()
            .await?;
        let body: AskQuestionRes = self.handle_response(response).await?;
        Ok(body.response)
    }

    /// Uploads a photo for analysis. `journal_text`, when given, is searched for lines
    /// related to the result.
    pub async fn analyze_image(
        &self,
        patient_id: &str,
        image: &CapturedImage,
        notes: &str,
        journal_text: Option<&str>,
    ) -> Result<ImageAnalysis, ClientError> {
        let photo = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name("patient_photo.jpg")
            .mime_str(&image.mime_type)?;
        let mut form = reqwest::multipart::Form::new()
            .part("image", photo)
            .text("patient_id", patient_id.to_string())
            .text("notes", notes.to_string());
        if let Some(text) = journal_text {
            form = form.text("journal_text", text.to_string());
        }

        let response = self
            .http_client
            .post(self.endpoint("api/analyze_image")?)
            .multipart(form)
            .send()
            .await?;
        let body: AnalyzeImageRes = self.handle_response(response).await?;
        Ok(ImageAnalysis {
            filename: body.filename,
            analysis: serde_json::from_value(body.analysis)?,
            relevant_info: body.relevant_info,
        })
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        match response.status() {
            status if status.is_success() => {
                let bytes = response.bytes().await?;
                Ok(serde_json::from_slice(&bytes)?)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status = status.as_u16(), "journal API returned an error");
                Err(ClientError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[async_trait]
impl PatientDirectory for JournalClient {
    async fn search_patients(&self, query: &str) -> Result<Vec<SearchResult>, FetchFailure> {
        self.search(query)
            .await
            .map_err(|e| e.into_fetch_failure(self.config.timeout))
    }
}

#[async_trait]
impl JournalSource for JournalClient {
    async fn load_journal(&self, identifier: &NonEmptyText) -> Result<JournalDocument, FetchFailure> {
        self.journal(identifier.as_str())
            .await
            .map_err(|e| e.into_fetch_failure(self.config.timeout))
    }

    async fn load_emergency_logs(
        &self,
        identifier: &NonEmptyText,
    ) -> Result<Vec<EmergencyLog>, FetchFailure> {
        self.emergency_logs(identifier.as_str())
            .await
            .map_err(|e| e.into_fetch_failure(self.config.timeout))
    }
}
