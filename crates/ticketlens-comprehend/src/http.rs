//! HTTP client for AWS Comprehend's JSON-1.1 batch endpoints.

use std::cell::OnceCell;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use ticketlens_core::ApiResult;
use tracing::debug;

use crate::service::{AnnotationService, ClientError, Operation};
use crate::sigv4::{Credentials, Signer, SigningRequest};

const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const SERVICE_NAME: &str = "comprehend";

/// Connection settings for [`ComprehendClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub region: String,
    /// Overrides the regional endpoint, e.g. for a local stand-in service.
    pub endpoint: Option<String>,
    /// Signing credentials. When `None` they are read from the environment
    /// on the first call, so a run answered entirely from cache needs none.
    pub credentials: Option<Credentials>,
}

impl ClientConfig {
    /// The endpoint URL, without trailing slash.
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://comprehend.{}.amazonaws.com", self.region),
        }
    }
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    #[serde(rename = "TextList")]
    text_list: &'a [&'a str],
    #[serde(rename = "LanguageCode", skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
}

/// Blocking Comprehend client. One call per batch, no retries.
pub struct ComprehendClient {
    client: Client,
    url: Url,
    host: String,
    region: String,
    credentials: OnceCell<Credentials>,
}

impl ComprehendClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let endpoint = config.endpoint_url();
        let url = Url::parse(&endpoint)
            .map_err(|e| ClientError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(ClientError::InvalidEndpoint(format!("{endpoint}: no host"))),
        };
        Ok(Self {
            client: Client::new(),
            url,
            host,
            region: config.region,
            credentials: config
                .credentials
                .map(OnceCell::from)
                .unwrap_or_default(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn credentials(&self) -> Result<&Credentials, ClientError> {
        if let Some(credentials) = self.credentials.get() {
            return Ok(credentials);
        }
        let loaded = Credentials::from_env()?;
        Ok(self.credentials.get_or_init(|| loaded))
    }

    fn request_body(operation: &Operation, texts: &[&str]) -> Result<Vec<u8>, ClientError> {
        let request = BatchRequest {
            text_list: texts,
            language_code: operation.language_code(),
        };
        Ok(serde_json::to_vec(&request)?)
    }
}

impl AnnotationService for ComprehendClient {
    fn annotate(&self, operation: &Operation, texts: &[&str]) -> Result<ApiResult, ClientError> {
        let body = Self::request_body(operation, texts)?;
        let target = operation.target();

        let signer = Signer {
            credentials: self.credentials()?,
            region: &self.region,
            service: SERVICE_NAME,
        };
        let signed = signer.sign(
            &SigningRequest {
                method: "POST",
                host: &self.host,
                path: self.url.path(),
                query: "",
                headers: &[("content-type", JSON_CONTENT_TYPE), ("x-amz-target", target)],
                payload: &body,
            },
            chrono::Utc::now(),
        );

        debug!(url = %self.url, target, count = texts.len(), "calling comprehend");
        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header("x-amz-target", target);
        for (name, value) in signed {
            request = request.header(name, value);
        }

        let resp = request.body(body).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}
