use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::response::parse_score_response;
use super::{ProviderError, ScoreProvider};
use crate::prompt::build_prompt;
use crate::types::{AssignmentContext, ValidationOutput};

const PROVIDER_ID: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Steers the model toward the JSON contract without restating the rubric,
/// which travels in the user message.
const SYSTEM_MESSAGE: &str =
    "You are a rubric-based content evaluator. Follow the scoring instructions \
     in the user message exactly and answer with JSON only.";

/// Remote adapter for the OpenAI chat completions API.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        }
    }

    /// Point the adapter at a different endpoint (local test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    response_format: ResponseFormat,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait]
impl ScoreProvider for OpenAiProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn validate(
        &self,
        content: &str,
        context: Option<&AssignmentContext>,
    ) -> Result<ValidationOutput, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredential(PROVIDER_ID));
        }

        let prompt = build_prompt(content, context);
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            // Temperature zero keeps the single call deterministic
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                Message {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::Connection {
                        provider: PROVIDER_ID,
                        detail: e.to_string(),
                    }
                } else if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: PROVIDER_ID,
                    }
                } else {
                    ProviderError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: PROVIDER_ID,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonParsing(e.to_string()))?;

        let text = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ProviderError::MalformedResponse("empty choices list".into()))?;

        parse_score_response(PROVIDER_ID, text)
    }
}
