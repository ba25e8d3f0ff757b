use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;

use crate::formats::{ExtractionRequest, StructureRequest};

pub const DEFAULT_BASE_URL: &str = "http://localhost:7071/api";

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub base_url: String,
    pub system_prompt: String,
    pub classification_prompt: Option<String>,
    /// `None` waits for the upstream indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            system_prompt: String::new(),
            classification_prompt: None,
            timeout: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(base_url) = non_empty_env("DOCCLASSIFY_ANALYSIS_URL") {
            config.base_url = base_url;
        }
        if let Some(prompt) = non_empty_env("DOCCLASSIFY_CLASSIFICATION_PROMPT") {
            config.classification_prompt = Some(prompt);
        }
        if let Some(raw) = non_empty_env("DOCCLASSIFY_UPSTREAM_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().with_context(|| {
                format!("invalid DOCCLASSIFY_UPSTREAM_TIMEOUT_SECS={raw:?}")
            })?;
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = url::Url::parse(&self.base_url)
            .with_context(|| format!("invalid analysis base url: {}", self.base_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("analysis base url must be http/https: {}", self.base_url);
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
    #[error("upstream returned {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },
}

/// The external document-structure and extraction service.
///
/// Implementations return the raw response body; interpreting it is up to
/// the caller.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze_structure(&self, request: &StructureRequest)
    -> Result<String, UpstreamError>;
    async fn extract_category(
        &self,
        request: &ExtractionRequest<'_>,
    ) -> Result<String, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisService {
    pub fn new(config: &AnalysisConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("build analysis http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url)
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        name: &str,
        body: &T,
    ) -> Result<String, UpstreamError> {
        let endpoint = self.endpoint(name);
        tracing::debug!(endpoint = %endpoint, "analysis request");

        let response = self.client.post(&endpoint).json(body).send().await?;
        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or(raw);
            return Err(UpstreamError::Status { status, message });
        }
        Ok(raw)
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze_structure(
        &self,
        request: &StructureRequest,
    ) -> Result<String, UpstreamError> {
        self.post_json("analyze_document_structure", request).await
    }

    async fn extract_category(
        &self,
        request: &ExtractionRequest<'_>,
    ) -> Result<String, UpstreamError> {
        self.post_json("extraction_category", request).await
    }
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let field = value.get("error").or_else(|| value.get("message"))?;
    match field {
        serde_json::Value::String(message) => Some(message.clone()),
        other => other.get("message")?.as_str().map(str::to_owned),
    }
}
