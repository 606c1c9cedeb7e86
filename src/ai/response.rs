use log::debug;
use serde::Deserialize;

use crate::ai::ModelError;

// ============================================================================
// JSON Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    output: Option<Vec<OutputItem>>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    OutputText { text: String },
    Refusal { refusal: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

// ============================================================================
// JSON Stream Event Structures
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum WireEvent {
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta { delta: String },
    #[serde(rename = "response.completed")]
    Completed,
    #[serde(rename = "response.failed")]
    Failed {
        #[serde(default)]
        response: FailedResponse,
    },
    #[serde(rename = "response.incomplete")]
    Incomplete {
        #[serde(default)]
        response: IncompleteResponse,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct FailedResponse {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct IncompleteResponse {
    #[serde(default)]
    incomplete_details: Option<IncompleteDetails>,
}

#[derive(Debug, Deserialize)]
struct IncompleteDetails {
    #[serde(default)]
    reason: Option<String>,
}

/// One server-sent event of a streamed response, reduced to what matters here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Completed,
    Ignored,
}

/// Reads Responses API payloads.
pub struct ResponseParser;

impl ResponseParser {
    /// Joins every `output_text` part of a completed (non-streamed) response body.
    pub fn output_text(body: &str) -> Result<String, ModelError> {
        let body: ResponseBody = serde_json::from_str(body)?;

        if let Some(message) = body.error.and_then(|e| e.message) {
            return Err(ModelError::InvalidResponse(message));
        }

        let output = body
            .output
            .ok_or_else(|| ModelError::InvalidResponse("missing 'output' array".to_string()))?;

        let mut text = String::new();
        let mut found = false;
        for item in output {
            let OutputItem::Message { content } = item else {
                continue;
            };
            for part in content {
                match part {
                    ContentPart::OutputText { text: fragment } => {
                        text.push_str(&fragment);
                        found = true;
                    }
                    ContentPart::Refusal { refusal } => {
                        return Err(ModelError::InvalidResponse(format!(
                            "model refused: {refusal}"
                        )));
                    }
                    ContentPart::Other => debug!("Skipping non-text content part"),
                }
            }
        }

        if !found {
            return Err(ModelError::InvalidResponse(
                "response contained no text output".to_string(),
            ));
        }

        Ok(text)
    }

    /// Interprets the `data` payload of one streamed event.
    pub fn stream_event(data: &str) -> Result<StreamEvent, ModelError> {
        match serde_json::from_str::<WireEvent>(data)? {
            WireEvent::OutputTextDelta { delta } => Ok(StreamEvent::Delta(delta)),
            WireEvent::Completed => Ok(StreamEvent::Completed),
            WireEvent::Failed { response } => {
                let message = response
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "response failed".to_string());
                Err(ModelError::InvalidResponse(message))
            }
            WireEvent::Incomplete { response } => {
                let reason = response
                    .incomplete_details
                    .and_then(|d| d.reason)
                    .unwrap_or_else(|| "unknown".to_string());
                Err(ModelError::InvalidResponse(format!(
                    "response incomplete: {reason}"
                )))
            }
            WireEvent::Error { message } => Err(ModelError::InvalidResponse(
                message.unwrap_or_else(|| "stream error".to_string()),
            )),
            WireEvent::Other => Ok(StreamEvent::Ignored),
        }
    }

    /// Best-effort human message from an error response body.
    pub fn error_message(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.error.message)
            .unwrap_or_else(|| body.trim().to_string())
    }
}
