use anyhow::Context as _;

use crate::cli::RegisterArgs;
use crate::formats::{Classification, MessageBody};

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("no classification data to register")]
    Empty,
    #[error("registration server unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("registration rejected ({status}): {message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("invalid registration response: {0}")]
    InvalidResponse(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReceipt {
    pub message: String,
}

/// Submits a finished classification list to the registration endpoint.
/// Never retries; a repeated submission is a new request.
#[derive(Debug, Clone)]
pub struct RegistrationClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RegistrationClient {
    pub fn new(server_url: &str) -> anyhow::Result<Self> {
        let url = url::Url::parse(server_url)
            .with_context(|| format!("invalid server url: {server_url}"))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("server url must be http/https: {server_url}");
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/register", server_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn submit(
        &self,
        classifications: &[Classification],
    ) -> Result<RegistrationReceipt, RegistrationError> {
        if classifications.is_empty() {
            return Err(RegistrationError::Empty);
        }

        tracing::info!(
            endpoint = %self.endpoint,
            classifications = classifications.len(),
            "register"
        );

        let body = serde_json::json!({ "classifications": classifications });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(RegistrationError::Unreachable)?;
        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(RegistrationError::Unreachable)?;

        if !status.is_success() {
            let message = serde_json::from_str::<MessageBody>(&raw)
                .map(|body| body.message)
                .unwrap_or(raw);
            return Err(RegistrationError::Rejected { status, message });
        }

        let body: MessageBody =
            serde_json::from_str(&raw).map_err(RegistrationError::InvalidResponse)?;
        Ok(RegistrationReceipt {
            message: body.message,
        })
    }
}

pub async fn run(args: RegisterArgs) -> anyhow::Result<()> {
    let classifications: Vec<Classification> =
        crate::output::read_json(&args.input).context("load classifications")?;
    let client = RegistrationClient::new(&args.server)?;
    let receipt = client.submit(&classifications).await?;
    println!("{}", receipt.message);
    Ok(())
}
