use std::env;
use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::Stream;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::{ErrorEnvelope, process_sse};
use crate::types::{GenerateContentRequest, GenerateContentResponse, Model};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// A boxed stream of response pieces.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

/// Client for the hosted Gemini API.
#[derive(Debug, Clone)]
pub struct Gemini {
    api_key: HeaderValue,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl Gemini {
    /// Create a new client.
    ///
    /// The API key can be provided directly or read from the GEMINI_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::authentication(format!(
                    "API key not provided and {API_KEY_ENV} environment variable not set"
                ))
            })?,
        };
        let mut api_key = HeaderValue::from_str(api_key.trim())
            .map_err(|_| Error::authentication("API key contains invalid characters"))?;
        api_key.set_sensitive(true);

        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the URL of a model method, e.g. `models/{model}:generateContent`.
    pub fn endpoint(&self, model: &Model, method: &str) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("models/{}:{method}", model.as_str()))?)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-goog-api-key", self.api_key.clone());
        headers
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let (error_type, error_message) =
            match serde_json::from_str::<ErrorEnvelope>(&error_body) {
                Ok(envelope) => (
                    envelope.error.status,
                    envelope.error.message.unwrap_or_else(|| error_body.clone()),
                ),
                Err(_) => (None, error_body),
            };

        match status_code {
            400 => Error::bad_request(error_message),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_type, error_message),
        }
    }

    async fn post(
        &self,
        url: Url,
        headers: HeaderMap,
        request: &GenerateContentRequest,
    ) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let started = Instant::now();
        tracing::debug!(%url, turns = request.contents.len(), "sending request");

        let result = self
            .client
            .post(url)
            .headers(headers)
            .json(request)
            .send()
            .await;
        CLIENT_REQUEST_DURATION.add(started.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {e}"),
                    Some(self.timeout.as_secs_f64()),
                )
            } else if e.is_connect() {
                Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
            }
        })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            tracing::warn!(error = %err, "request rejected");
            return Err(err);
        }
        Ok(response)
    }

    /// Generate a complete response.
    pub async fn generate(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model, "generateContent")?;
        let response = self.post(url, self.default_headers(), request).await?;
        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
            })
    }

    /// Generate a response as a stream of pieces.
    ///
    /// Each item carries only the text produced since the previous item.
    pub async fn stream(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<ResponseStream> {
        let mut url = self.endpoint(model, "streamGenerateContent")?;
        url.query_pairs_mut().append_pair("alt", "sse");

        let mut headers = self.default_headers();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        let response = self.post(url, headers, request).await?;
        Ok(Box::pin(process_sse(response.bytes_stream())))
    }
}
