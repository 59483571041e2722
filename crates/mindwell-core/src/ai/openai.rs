use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatTransport, CompletionRequest, GenerationParams};
use crate::config::Config;
use crate::error::CompletionError;
use crate::prompt::PromptMessage;

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    #[serde(flatten)]
    params: GenerationParams,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIErrorBody {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_url: String,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_url, &config.model)
    }
}

#[async_trait]
impl ChatTransport for OpenAIClient {
    async fn send(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        let body = OpenAIRequest {
            model: &self.model,
            messages: &request.messages,
            params: request.params,
        };

        debug!(model = %self.model, messages = request.messages.len(), "sending chat completion");

        let response = self.client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        let openai_response: OpenAIResponse = serde_json::from_str(&text)
            .map_err(|e| CompletionError::Unknown(format!("malformed response: {e}")))?;

        openai_response.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::Unknown("response contained no message".to_string()))
    }
}

fn classify_transport_error(err: reqwest::Error) -> CompletionError {
    if err.is_builder() {
        CompletionError::Unknown(err.to_string())
    } else {
        CompletionError::Network(err.to_string())
    }
}

/// Map a non-2xx response to a failure kind, keeping the server's message.
fn classify_status(status: StatusCode, body: &str) -> CompletionError {
    let server_message = serde_json::from_str::<OpenAIErrorBody>(body)
        .ok()
        .map(|b| b.error.message);
    debug!(status = status.as_u16(), "completion request rejected");

    let reason = || status.canonical_reason().unwrap_or("Unknown error").to_string();

    match status {
        StatusCode::UNAUTHORIZED => {
            CompletionError::Unauthorized(server_message.unwrap_or_else(reason))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            CompletionError::RateLimited(server_message.unwrap_or_else(reason))
        }
        s if s.is_server_error() => CompletionError::ServerError {
            status: s.as_u16(),
            message: server_message.unwrap_or_else(reason),
        },
        // Shown to the user as-is, so no status prefix or reason phrase
        _ => CompletionError::Unknown(
            server_message.unwrap_or_else(|| "Unknown error".to_string()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_failure_kinds() {
        let body = r#"{"error": {"message": "Incorrect API key provided"}}"#;
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED, body),
            CompletionError::Unauthorized("Incorrect API key provided".to_string())
        );
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            CompletionError::RateLimited(_)
        ));
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, "<html>"),
            CompletionError::ServerError {
                status: 503,
                message: "Service Unavailable".to_string()
            }
        );
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, r#"{"error": {"message": "bad model"}}"#),
            CompletionError::Unknown("bad model".to_string())
        );
    }

    #[test]
    fn other_statuses_surface_server_message_or_unknown_error() {
        use crate::credential::SetupError;

        let with_body = classify_status(
            StatusCode::BAD_REQUEST,
            r#"{"error": {"message": "bad model"}}"#,
        );
        assert_eq!(
            SetupError::from(with_body).status_message(),
            "API connection failed. Error: bad model"
        );

        let empty = classify_status(StatusCode::BAD_REQUEST, "");
        assert_eq!(empty, CompletionError::Unknown("Unknown error".to_string()));
        assert_eq!(
            SetupError::from(empty).status_message(),
            "API connection failed. Error: Unknown error"
        );
    }

    #[test]
    fn request_body_flattens_params() {
        let messages = vec![PromptMessage::user("hello")];
        let body = OpenAIRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
            params: GenerationParams::probe(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["max_tokens"], 10);
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("presence_penalty").is_none());
    }
}
