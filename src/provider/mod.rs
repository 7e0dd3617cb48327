pub mod gemini;
pub mod openai;
pub mod response;
pub mod stub;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use stub::{StubProvider, STUB_PROVIDER_ID};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::types::{AssignmentContext, ValidationOutput};

/// Why a single provider call produced no usable score. Any of these
/// excludes that one call from consensus; none of them fails the batch.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("missing credential for provider {0}")]
    MissingCredential(&'static str),

    #[error("cannot reach {provider} endpoint: {detail}")]
    Connection {
        provider: &'static str,
        detail: String,
    },

    #[error("request to {provider} timed out")]
    Timeout { provider: &'static str },

    #[error("{provider} returned error (status {status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider response JSON error: {0}")]
    JsonParsing(String),

    #[error("provider declined to validate: {0}")]
    Unprocessable(String),
}

/// A model-inference backend that can score content against the rubric.
///
/// Implementations are selected by configuration, never by branching on a
/// provider-name field inside business logic. Each call is stateless and
/// side-effect-free; one attempt per request, no retries.
#[async_trait]
pub trait ScoreProvider: Send + Sync {
    /// Stable identifier recorded on every output for audit.
    fn id(&self) -> &'static str;

    /// Score `content` under the rubric for `context` (generic rubric when
    /// absent). Exactly one inference call.
    async fn validate(
        &self,
        content: &str,
        context: Option<&AssignmentContext>,
    ) -> Result<ValidationOutput, ProviderError>;
}

/// Build the provider set a configuration activates. Credential presence is
/// the only switch; with no credentials the stub carries the batch alone.
pub fn providers_from_config(config: &EngineConfig) -> Vec<Arc<dyn ScoreProvider>> {
    let mut providers: Vec<Arc<dyn ScoreProvider>> = Vec::new();

    if let Some(key) = &config.gemini_api_key {
        providers.push(Arc::new(GeminiProvider::new(
            key,
            &config.gemini_model,
            config.request_timeout_secs,
        )));
    }
    if let Some(key) = &config.openai_api_key {
        providers.push(Arc::new(OpenAiProvider::new(
            key,
            &config.openai_model,
            config.request_timeout_secs,
        )));
    }

    if providers.is_empty() {
        tracing::info!("No provider credentials configured; falling back to stub");
        providers.push(Arc::new(StubProvider));
    }

    providers
}

/// Scripted provider for tests: returns a fixed output or a fixed failure,
/// counts how often it was called, and records the content it was handed.
pub struct MockProvider {
    id: &'static str,
    output: Option<ValidationOutput>,
    failure: Option<String>,
    calls: std::sync::atomic::AtomicUsize,
    seen_content: std::sync::Mutex<Option<String>>,
}

impl MockProvider {
    pub fn returning(id: &'static str, output: ValidationOutput) -> Self {
        Self {
            id,
            output: Some(output),
            failure: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
            seen_content: std::sync::Mutex::new(None),
        }
    }

    pub fn failing(id: &'static str, detail: &str) -> Self {
        Self {
            id,
            output: None,
            failure: Some(detail.to_string()),
            calls: std::sync::atomic::AtomicUsize::new(0),
            seen_content: std::sync::Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Content passed to the most recent `validate` call, if any.
    pub fn last_content(&self) -> Option<String> {
        self.seen_content.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoreProvider for MockProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn validate(
        &self,
        content: &str,
        _context: Option<&AssignmentContext>,
    ) -> Result<ValidationOutput, ProviderError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        *self.seen_content.lock().unwrap() = Some(content.to_string());
        match (&self.output, &self.failure) {
            (Some(output), _) => Ok(output.clone()),
            (None, Some(detail)) => Err(ProviderError::Http(detail.clone())),
            (None, None) => Err(ProviderError::MalformedResponse("unscripted mock".into())),
        }
    }
}
