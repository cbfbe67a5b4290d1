use async_trait::async_trait;
use incident_core::config::{parse_base_url, ClientConfig};
use incident_core::encoding::{MultipartPart, SubmissionBody, SubmissionRequest};
use incident_core::error::{IncidentError, Result};
use incident_core::models::{parse_incident_list, Incident};
use incident_core::ports::IncidentApi;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

/// `IncidentApi` over HTTP
pub struct HttpIncidentApi {
    /// Base URL for the API (e.g., "http://localhost:3000")
    base_url: String,

    /// Applied by the HTTP client to every request
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIncidentApi {
    /// Create an adapter from the client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Self::with_base_url(&config.base_url.value, config.request_timeout())
    }

    /// Create an adapter for `base_url`, normalized like the configured one
    pub fn with_base_url(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let base_url = parse_base_url(base_url.as_ref())?;
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            IncidentError::ConfigInvalid {
                key: "http_client".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            }
        })?;

        Ok(Self { base_url, timeout, client })
    }

    /// Create with default localhost URL and timeout
    pub fn localhost() -> Result<Self> {
        Self::new(&ClientConfig::with_defaults())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, err: reqwest::Error) -> IncidentError {
        if err.is_timeout() {
            IncidentError::Timeout { after: self.timeout }
        } else {
            IncidentError::Transport(err.to_string())
        }
    }
}

fn multipart_form(parts: &[MultipartPart]) -> Result<Form> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            MultipartPart::Text { name, value } => form.text(*name, value.clone()),
            MultipartPart::File { name, image } => {
                let file = Part::bytes(image.bytes.clone())
                    .file_name(image.file_name.clone())
                    .mime_str(&image.content_type)
                    .map_err(|e| IncidentError::Serialization(format!(
                        "Invalid image content type '{}': {}",
                        image.content_type, e
                    )))?;
                form.part(*name, file)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl IncidentApi for HttpIncidentApi {
    async fn list_incidents(&self) -> Result<Vec<Incident>> {
        let url = self.url(incident_core::encoding::INCIDENTS_PATH);
        tracing::debug!(url = %url, "Fetching incidents");

        let response = self.client.get(&url).send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IncidentError::ListUnavailable { status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        Ok(parse_incident_list(&body))
    }

    async fn create_incident(&self, request: &SubmissionRequest) -> Result<()> {
        let url = self.url(request.path);
        let builder = self.client.post(&url);

        let builder = match &request.body {
            SubmissionBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
            SubmissionBody::Json(_) => {
                let body = request.json_bytes()?.unwrap_or_default();
                let content_type = request.content_type().unwrap_or("application/json");
                builder.header(CONTENT_TYPE, content_type).body(body)
            }
        };

        tracing::debug!(url = %url, multipart = request.is_multipart(), "Posting incident");
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "Incident rejected by server");
        Err(IncidentError::rejected(status.as_u16(), body))
    }
}
