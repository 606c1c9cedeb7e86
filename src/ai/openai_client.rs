// External dependencies
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use reqwest_eventsource::{retry::Never, Event, EventSource};
use serde::Serialize;
use std::time::Duration;
use url::Url;

// Internal dependencies
use crate::ai::{
    FragmentStream, ModelClient, ModelError, ModelRequest, Prompt, ResponseParser, StreamEvent,
};
use crate::config::Settings;

// ============================================================================
// Responses API Structures
// ============================================================================

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: RequestInput<'a>,
    stream: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestInput<'a> {
    Text(&'a str),
    Messages(Vec<InputMessage<'a>>),
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'static str,
    content: Vec<InputContent<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputContent<'a> {
    InputFile { file_url: &'a str },
    InputText { text: &'a str },
}

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Client for the OpenAI Responses API.
pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    timeout: Duration,
}

// ============================================================================
// Client Implementation
// ============================================================================

impl OpenAiClient {
    /// Creates a client from the persisted settings.
    ///
    /// A missing API key is not an error here; requests fail with
    /// [`ModelError::MissingApiKey`] instead.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        let mut base_url = settings.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url).context("Invalid model API base URL")?;

        Ok(Self {
            client,
            base_url,
            api_key: settings.api_key.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        })
    }

    fn api_key(&self) -> Result<String, ModelError> {
        if !self.api_key.is_empty() {
            return Ok(self.api_key.clone());
        }

        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ModelError::MissingApiKey)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ModelError> {
        self.base_url
            .join(path)
            .map_err(|e| ModelError::InvalidResponse(format!("cannot build {path} URL: {e}")))
    }

    fn responses_request(
        &self,
        request: &ModelRequest,
        stream: bool,
    ) -> Result<RequestBuilder, ModelError> {
        let api_key = self.api_key()?;
        let url = self.endpoint("responses")?;
        let body = Self::build_request_body(request, stream);

        debug!(
            "POST {url} (model: {}, prompt length: {}, attachment: {:?}, stream: {stream})",
            request.model,
            request.prompt.text().len(),
            request.prompt.attachment().map(Url::as_str)
        );

        Ok(self.client.post(url).bearer_auth(api_key).json(&body))
    }

    fn build_request_body(request: &ModelRequest, stream: bool) -> ResponsesRequest<'_> {
        let input = match &request.prompt {
            Prompt::Text(text) => RequestInput::Text(text),
            Prompt::WithAttachment { url, text } => RequestInput::Messages(vec![InputMessage {
                role: "user",
                content: vec![
                    InputContent::InputFile {
                        file_url: url.as_str(),
                    },
                    InputContent::InputText { text },
                ],
            }]),
        };

        ResponsesRequest {
            model: &request.model,
            input,
            stream,
        }
    }

    async fn error_for_status(response: Response) -> ModelError {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            return ModelError::RateLimited { retry_after };
        }

        let body = response.text().await.unwrap_or_default();
        ModelError::ApiError {
            status: status.as_u16(),
            message: ResponseParser::error_message(&body),
        }
    }

    /// Checks that the API is reachable and accepts the configured key.
    pub async fn verify_connection(&self) -> Result<()> {
        debug!("Verifying model API connection");

        let url = self.endpoint("models")?;
        let response = self
            .client
            .get(url)
            .bearer_auth(self.api_key()?)
            .timeout(self.timeout)
            .send()
            .await
            .context("Failed to connect to model API")?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await.into());
        }

        info!("Model API connection verified");
        Ok(())
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let response = self
            .responses_request(request, false)?
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let body = response.text().await?;
        let text = ResponseParser::output_text(&body)?;

        debug!("Received response of {} chars", text.chars().count());
        Ok(text)
    }

    async fn stream(&self, request: &ModelRequest) -> Result<FragmentStream, ModelError> {
        let builder = self.responses_request(request, true)?;
        let mut events = EventSource::new(builder)
            .map_err(|e| ModelError::InvalidResponse(format!("cannot open event stream: {e}")))?;
        events.set_retry_policy(Box::new(Never));

        let fragments = stream::unfold(Some(events), |state| async move {
            let mut events = state?;
            loop {
                match events.next().await {
                    Some(Ok(Event::Open)) => debug!("Event stream opened"),
                    Some(Ok(Event::Message(message))) => {
                        match ResponseParser::stream_event(&message.data) {
                            Ok(StreamEvent::Delta(delta)) => {
                                return Some((Ok(delta), Some(events)));
                            }
                            Ok(StreamEvent::Completed) => {
                                debug!("Event stream completed");
                                events.close();
                                return None;
                            }
                            Ok(StreamEvent::Ignored) => {}
                            Err(e) => {
                                events.close();
                                return Some((Err(e), None));
                            }
                        }
                    }
                    Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => return None,
                    Some(Err(reqwest_eventsource::Error::InvalidStatusCode(status, ..))) => {
                        events.close();
                        let error = if status == StatusCode::TOO_MANY_REQUESTS {
                            ModelError::RateLimited { retry_after: None }
                        } else {
                            ModelError::ApiError {
                                status: status.as_u16(),
                                message: status
                                    .canonical_reason()
                                    .unwrap_or("request rejected")
                                    .to_string(),
                            }
                        };
                        return Some((Err(error), None));
                    }
                    Some(Err(e)) => {
                        events.close();
                        return Some((Err(ModelError::InvalidResponse(e.to_string())), None));
                    }
                }
            }
        });

        Ok(fragments.boxed())
    }
}
